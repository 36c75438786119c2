// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `flowcontrol.apiserver.k8s.io/v1`
//!
//! Same kinds as `v1beta3`. The only wire difference is that
//! `nominalConcurrencyShares` of a limited priority level is optional, so an
//! explicit zero survives defaulting.

use apischeme::{GroupVersion, ListMeta, ObjectMeta, Resource, Result, Scheme, TypeTag};
use serde::{Deserialize, Serialize};

use crate::types::{
    default_exempt, default_flow_schema_spec, default_limit_response,
    ExemptPriorityLevelConfiguration, FlowSchemaSpec, FlowSchemaStatus, LimitResponse,
    PriorityLevelConfigurationStatus, PriorityLevelEnablement,
    DEFAULT_NOMINAL_CONCURRENCY_SHARES,
};
use crate::GROUP_NAME;

pub const VERSION: &str = "v1";

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
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1.FlowSchema");
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSchemaList {
    pub metadata: ListMeta,
    pub items: Vec<FlowSchema>,
}

impl Resource for FlowSchemaList {
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1.FlowSchemaList");
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityLevelConfiguration {
    pub metadata: ObjectMeta,
    pub spec: PriorityLevelConfigurationSpec,
    pub status: PriorityLevelConfigurationStatus,
}

impl Resource for PriorityLevelConfiguration {
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1.PriorityLevelConfiguration");
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityLevelConfigurationList {
    pub metadata: ListMeta,
    pub items: Vec<PriorityLevelConfiguration>,
}

impl Resource for PriorityLevelConfigurationList {
    const TYPE_TAG: TypeTag = TypeTag::new("flowcontrol/v1.PriorityLevelConfigurationList");
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nominal_concurrency_shares: Option<i32>,
    pub limit_response: LimitResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lendable_percent: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borrowing_limit_percent: Option<i32>,
}

pub fn set_defaults_flow_schema(fs: &mut FlowSchema) {
    default_flow_schema_spec(&mut fs.spec);
}

pub fn set_defaults_priority_level_configuration(plc: &mut PriorityLevelConfiguration) {
    if let Some(limited) = plc.spec.limited.as_mut() {
        limited
            .nominal_concurrency_shares
            .get_or_insert(DEFAULT_NOMINAL_CONCURRENCY_SHARES);
        limited.lendable_percent.get_or_insert(0);
        default_limit_response(&mut limited.limit_response);
    }
    if let Some(exempt) = plc.spec.exempt.as_mut() {
        default_exempt(exempt);
    }
}

/// Register every v1 kind and its defaulters.
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
