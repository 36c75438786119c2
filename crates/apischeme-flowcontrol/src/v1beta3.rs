// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `flowcontrol.apiserver.k8s.io/v1beta3`

use apischeme::{GroupVersion, ListMeta, ObjectMeta, Resource, Result, Scheme, TypeTag};
use serde::{Deserialize, Serialize};

use crate::types::{
    default_exempt, default_flow_schema_spec, default_limit_response,
    ExemptPriorityLevelConfiguration, FlowSchemaSpec, FlowSchemaStatus, LimitResponse,
    PriorityLevelConfigurationStatus, PriorityLevelEnablement,
    DEFAULT_NOMINAL_CONCURRENCY_SHARES,
};
use crate::GROUP_NAME;

pub const VERSION: &str = "v1beta3";

/// Annotation keeping an explicit zero share count from being defaulted.
pub const PRESERVE_ZERO_CONCURRENCY_SHARES_KEY: &str =
    "flowcontrol.k8s.io/v1beta3-preserve-zero-concurrency-shares";

pub fn scheme_group_version() -> GroupVersion {
    GroupVersion::new(GROUP_NAME, VERSION)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSchema {
    pub metadata: ObjectMeta,
    pub spec: FlowSchemaSpec,
    pub status: FlowSchemaStatus,
}

impl Resource for FlowSchema {
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1beta3.FlowSchema");
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSchemaList {
    pub metadata: ListMeta,
    pub items: Vec<FlowSchema>,
}

impl Resource for FlowSchemaList {
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1beta3.FlowSchemaList");
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityLevelConfiguration {
    pub metadata: ObjectMeta,
    pub spec: PriorityLevelConfigurationSpec,
    pub status: PriorityLevelConfigurationStatus,
}

impl Resource for PriorityLevelConfiguration {
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1beta3.PriorityLevelConfiguration");
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityLevelConfigurationList {
    pub metadata: ListMeta,
    pub items: Vec<PriorityLevelConfiguration>,
}

impl Resource for PriorityLevelConfigurationList {
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1beta3.PriorityLevelConfigurationList");
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityLevelConfigurationSpec {
    #[serde(rename = "type")]
    pub type_: PriorityLevelEnablement,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limited: Option<LimitedPriorityLevelConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exempt: Option<ExemptPriorityLevelConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LimitedPriorityLevelConfiguration {
    /// Zero means "unset" unless the object carries
    /// [`PRESERVE_ZERO_CONCURRENCY_SHARES_KEY`].
    pub nominal_concurrency_shares: i32,
    pub limit_response: LimitResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lendable_percent: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrowing_limit_percent: Option<i32>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub fn set_defaults_flow_schema(fs: &mut FlowSchema) {
    default_flow_schema_spec(&mut fs.spec);
}

pub fn set_defaults_priority_level_configuration(plc: &mut PriorityLevelConfiguration) {
    let preserve_zero = plc
        .metadata
        .annotations
        .contains_key(PRESERVE_ZERO_CONCURRENCY_SHARES_KEY);

    if let Some(limited) = plc.spec.limited.as_mut() {
        if limited.nominal_concurrency_shares == 0 && !preserve_zero {
            limited.nominal_concurrency_shares = DEFAULT_NOMINAL_CONCURRENCY_SHARES;
        }
        limited.lendable_percent.get_or_insert(0);
        default_limit_response(&mut limited.limit_response);
    }
    if let Some(exempt) = plc.spec.exempt.as_mut() {
        default_exempt(exempt);
    }
}

/// Register every v1beta3 kind and its defaulters.
pub fn add_to_scheme(scheme: &mut Scheme) -> Result<()> {
    let gv = scheme_group_version();
    scheme.add_known_type::<FlowSchema>(&gv, "FlowSchema")?;
    scheme.add_known_type::<FlowSchemaList>(&gv, "FlowSchemaList")?;
    scheme.add_known_type::<PriorityLevelConfiguration>(&gv, "PriorityLevelConfiguration")?;
    scheme.add_known_type::<PriorityLevelConfigurationList>(&gv, "PriorityLevelConfigurationList")?;

    scheme.add_defaulting_func(set_defaults_flow_schema);
    scheme.add_defaulting_func(|list: &mut FlowSchemaList| {
        list.items.iter_mut().for_each(set_defaults_flow_schema)
    });
    scheme.add_defaulting_func(set_defaults_priority_level_configuration);
    scheme.add_defaulting_func(|list: &mut PriorityLevelConfigurationList| {
        list.items
            .iter_mut()
            .for_each(set_defaults_priority_level_configuration)
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LimitResponseType, DEFAULT_MATCHING_PRECEDENCE, DEFAULT_QUEUES};

    fn limited(shares: i32) -> PriorityLevelConfiguration {
        PriorityLevelConfiguration {
            spec: PriorityLevelConfigurationSpec {
                type_: PriorityLevelEnablement::Limited,
                limited: Some(LimitedPriorityLevelConfiguration {
                    nominal_concurrency_shares: shares,
                    limit_response: LimitResponse {
                        type_: LimitResponseType::Queue,
                        queuing: None,
                    },
                    ..Default::default()
                }),
                exempt: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_flow_schema_defaults() {
        let mut fs = FlowSchema::default();
        set_defaults_flow_schema(&mut fs);
        assert_eq!(fs.spec.matching_precedence, DEFAULT_MATCHING_PRECEDENCE);

        fs.spec.matching_precedence = 42;
        set_defaults_flow_schema(&mut fs);
        assert_eq!(fs.spec.matching_precedence, 42);
    }

    #[test]
    fn test_zero_shares_default_unless_preserved() {
        let mut plc = limited(0);
        set_defaults_priority_level_configuration(&mut plc);
        let l = plc.spec.limited.as_ref().unwrap();
        assert_eq!(l.nominal_concurrency_shares, DEFAULT_NOMINAL_CONCURRENCY_SHARES);
        assert_eq!(l.lendable_percent, Some(0));
        assert_eq!(l.limit_response.queuing.as_ref().unwrap().queues, DEFAULT_QUEUES);

        let mut plc = limited(0);
        plc.metadata
            .annotations
            .insert(PRESERVE_ZERO_CONCURRENCY_SHARES_KEY.into(), String::new());
        set_defaults_priority_level_configuration(&mut plc);
        assert_eq!(plc.spec.limited.unwrap().nominal_concurrency_shares, 0);
    }

    #[test]
    fn test_add_to_scheme_registers_lists() {
        let mut scheme = Scheme::new("v1beta3");
        add_to_scheme(&mut scheme).unwrap();
        let kinds = scheme.known_kinds(&scheme_group_version());
        assert_eq!(
            kinds,
            vec![
                "FlowSchema",
                "FlowSchemaList",
                "PriorityLevelConfiguration",
                "PriorityLevelConfigurationList"
            ]
        );
    }
}
