// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! API priority and fairness resources (`flowcontrol.apiserver.k8s.io`).
//!
//! Provides the `FlowSchema` and `PriorityLevelConfiguration` kinds (plus
//! their list kinds) at `v1beta3` and `v1`, their defaulting functions and
//! the conversions between the two versions.
//!
//! # Usage
//!
//! ```
//! use apischeme::codec::{decode, encode};
//! use apischeme::ObjectMeta;
//! use apischeme_flowcontrol::{new_codecs, v1beta3};
//!
//! let (_scheme, codecs) = new_codecs()?;
//! let fs = v1beta3::FlowSchema {
//!     metadata: ObjectMeta::named("test-flowschema").with_namespace("default"),
//!     ..Default::default()
//! };
//!
//! let bytes = encode(&codecs.legacy_codec(v1beta3::scheme_group_version()), &fs)?;
//! let object = decode(&codecs.universal_deserializer(), &bytes)?;
//! assert!(object.is::<v1beta3::FlowSchema>());
//! # Ok::<(), apischeme::SchemeError>(())
//! ```

pub mod conversion;
pub mod types;
pub mod v1;
pub mod v1beta3;

use std::sync::Arc;

use apischeme::{CodecFactory, ConversionFuncs, Result, Scheme};

pub use conversion::add_conversion_funcs;

pub const GROUP_NAME: &str = "flowcontrol.apiserver.k8s.io";

/// Register every served version. `v1` is preferred.
pub fn add_to_scheme(scheme: &mut Scheme) -> Result<()> {
    v1beta3::add_to_scheme(scheme)?;
    v1::add_to_scheme(scheme)?;
    scheme.set_version_priority(GROUP_NAME, &[v1::VERSION, v1beta3::VERSION])
}

/// Build a finalized scheme holding this group and a codec factory over it.
pub fn new_codecs() -> Result<(Arc<Scheme>, CodecFactory)> {
    let mut scheme = Scheme::new("flowcontrol");
    add_to_scheme(&mut scheme)?;

    let mut conversions = ConversionFuncs::new();
    add_conversion_funcs(&mut conversions);

    let scheme = Arc::new(scheme);
    let codecs = CodecFactory::new(scheme.clone(), Arc::new(conversions));
    tracing::debug!("flowcontrol codecs ready: {:?}", codecs);
    Ok((scheme, codecs))
}
