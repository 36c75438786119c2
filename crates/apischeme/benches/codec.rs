// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec Throughput Benchmark
//!
//! Measures encode and decode cost per wire format for a mid-sized object,
//! plus the overhead of format sniffing and of a version conversion.

#![allow(clippy::uninlined_format_args)]

use std::collections::BTreeMap;
use std::sync::Arc;

use apischeme::codec::CodecFactory;
use apischeme::serializer::MEDIA_TYPES;
use apischeme::{
    ConversionFuncs, Decoder, Encoder, GroupVersion, ObjectMeta, Resource, Scheme, TypeTag,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigMap {
    metadata: ObjectMeta,
    data: BTreeMap<String, String>,
    immutable: bool,
}

impl Resource for ConfigMap {
    const TYPE_TAG: TypeTag = TypeTag::new("bench/v1.ConfigMap");
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigMapV2 {
    metadata: ObjectMeta,
    data: BTreeMap<String, String>,
}

impl Resource for ConfigMapV2 {
    const TYPE_TAG: TypeTag = TypeTag::new("bench/v2.ConfigMap");
}

fn v1() -> GroupVersion {
    GroupVersion::new("bench.example.com", "v1")
}

fn v2() -> GroupVersion {
    GroupVersion::new("bench.example.com", "v2")
}

fn factory() -> CodecFactory {
    let mut scheme = Scheme::new("bench");
    scheme.add_known_type::<ConfigMap>(&v1(), "ConfigMap").expect("register v1");
    scheme.add_known_type::<ConfigMapV2>(&v2(), "ConfigMap").expect("register v2");

    let mut funcs = ConversionFuncs::new();
    funcs.add("ConfigMap", &v1(), &v2(), |cm: &ConfigMap| ConfigMapV2 {
        metadata: cm.metadata.clone(),
        data: cm.data.clone(),
    });
    CodecFactory::new(Arc::new(scheme), Arc::new(funcs))
}

fn sample() -> ConfigMap {
    let mut cm = ConfigMap {
        metadata: ObjectMeta::named("bench").with_namespace("default"),
        ..Default::default()
    };
    for i in 0..64 {
        cm.data.insert(format!("key-{:03}", i), format!("value-{}", i * 31));
    }
    cm
}

fn bench_encode(c: &mut Criterion) {
    let codecs = factory();
    let object = sample();

    for media_type in MEDIA_TYPES {
        let codec = codecs
            .encoder_for_version(media_type, v1())
            .expect("serializer enabled");
        c.bench_function(&format!("encode_{}", media_type), |b| {
            b.iter(|| codec.encode(black_box(&object)).expect("encode"))
        });
    }
}

fn bench_decode(c: &mut Criterion) {
    let codecs = factory();
    let universal = codecs.universal_deserializer();
    let object = sample();

    for media_type in MEDIA_TYPES {
        let data = codecs
            .encoder_for_version(media_type, v1())
            .expect("serializer enabled")
            .encode(&object)
            .expect("encode");
        c.bench_function(&format!("decode_universal_{}", media_type), |b| {
            b.iter(|| universal.decode(black_box(&data), None).expect("decode"))
        });
    }
}

fn bench_conversion(c: &mut Criterion) {
    let codecs = factory();
    let codec = codecs.legacy_codec(v2());
    let object = sample();

    c.bench_function("encode_with_conversion", |b| {
        b.iter(|| codec.encode(black_box(&object)).expect("encode"))
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_conversion);
criterion_main!(benches);
