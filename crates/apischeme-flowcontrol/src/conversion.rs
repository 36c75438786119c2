// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversions between `v1beta3` and `v1`.

use apischeme::ConversionFuncs;

use crate::v1beta3::PRESERVE_ZERO_CONCURRENCY_SHARES_KEY;
use crate::{v1, v1beta3};

pub fn flow_schema_to_v1(fs: &v1beta3::FlowSchema) -> v1::FlowSchema {
    v1::FlowSchema {
        metadata: fs.metadata.clone(),
        spec: fs.spec.clone(),
        status: fs.status.clone(),
    }
}

pub fn flow_schema_to_v1beta3(fs: &v1::FlowSchema) -> v1beta3::FlowSchema {
    v1beta3::FlowSchema {
        metadata: fs.metadata.clone(),
        spec: fs.spec.clone(),
        status: fs.status.clone(),
    }
}

pub fn priority_level_to_v1(
    plc: &v1beta3::PriorityLevelConfiguration,
) -> v1::PriorityLevelConfiguration {
    let mut metadata = plc.metadata.clone();
    metadata.annotations.remove(PRESERVE_ZERO_CONCURRENCY_SHARES_KEY);

    let limited = plc.spec.limited.as_ref().map(|l| v1::LimitedPriorityLevelConfiguration {
        nominal_concurrency_shares: Some(l.nominal_concurrency_shares),
        limit_response: l.limit_response.clone(),
        lendable_percent: l.lendable_percent,
        borrowing_limit_percent: l.borrowing_limit_percent,
    });

    v1::PriorityLevelConfiguration {
        metadata,
        spec: v1::PriorityLevelConfigurationSpec {
            type_: plc.spec.type_,
            limited,
            exempt: plc.spec.exempt.clone(),
        },
        status: plc.status.clone(),
    }
}

pub fn priority_level_to_v1beta3(
    plc: &v1::PriorityLevelConfiguration,
) -> v1beta3::PriorityLevelConfiguration {
    let mut metadata = plc.metadata.clone();

    let limited = plc.spec.limited.as_ref().map(|l| {
        let shares = l.nominal_concurrency_shares.unwrap_or(0);
        if l.nominal_concurrency_shares == Some(0) {
            metadata
                .annotations
                .insert(PRESERVE_ZERO_CONCURRENCY_SHARES_KEY.to_string(), String::new());
        }
        v1beta3::LimitedPriorityLevelConfiguration {
            nominal_concurrency_shares: shares,
            limit_response: l.limit_response.clone(),
            lendable_percent: l.lendable_percent,
            borrowing_limit_percent: l.borrowing_limit_percent,
        }
    });

    v1beta3::PriorityLevelConfiguration {
        metadata,
        spec: v1beta3::PriorityLevelConfigurationSpec {
            type_: plc.spec.type_,
            limited,
            exempt: plc.spec.exempt.clone(),
        },
        status: plc.status.clone(),
    }
}

/// Install conversions for every kind in both directions.
pub fn add_conversion_funcs(funcs: &mut ConversionFuncs) {
    let beta = v1beta3::scheme_group_version();
    let ga = v1::scheme_group_version();

    funcs.add("FlowSchema", &beta, &ga, flow_schema_to_v1);
    funcs.add("FlowSchema", &ga, &beta, flow_schema_to_v1beta3);
    funcs.add("FlowSchemaList", &beta, &ga, |list: &v1beta3::FlowSchemaList| {
        v1::FlowSchemaList {
            metadata: list.metadata.clone(),
            items: list.items.iter().map(flow_schema_to_v1).collect(),
        }
    });
    funcs.add("FlowSchemaList", &ga, &beta, |list: &v1::FlowSchemaList| {
        v1beta3::FlowSchemaList {
            metadata: list.metadata.clone(),
            items: list.items.iter().map(flow_schema_to_v1beta3).collect(),
        }
    });

    funcs.add("PriorityLevelConfiguration", &beta, &ga, priority_level_to_v1);
    funcs.add("PriorityLevelConfiguration", &ga, &beta, priority_level_to_v1beta3);
    funcs.add(
        "PriorityLevelConfigurationList",
        &beta,
        &ga,
        |list: &v1beta3::PriorityLevelConfigurationList| v1::PriorityLevelConfigurationList {
            metadata: list.metadata.clone(),
            items: list.items.iter().map(priority_level_to_v1).collect(),
        },
    );
    funcs.add(
        "PriorityLevelConfigurationList",
        &ga,
        &beta,
        |list: &v1::PriorityLevelConfigurationList| v1beta3::PriorityLevelConfigurationList {
            metadata: list.metadata.clone(),
            items: list.items.iter().map(priority_level_to_v1beta3).collect(),
        },
    );

    tracing::debug!("installed {} flowcontrol conversions", funcs.len());
}
