// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! End-to-end data flow: FMU setters through the bus back to FMU getters.

mod common;

use ddsfmu::mapper::DataMapper;
use ddsfmu::pubsub::DynamicPubSub;

const ROUNDTRIP_MAPPING: &str = r#"
<ddsfmu>
  <fmu_out topic="rt" type="idl::test::Roundtrip"/>
  <fmu_in  topic="rt" type="idl::test::Roundtrip"/>
</ddsfmu>
"#;

fn roundtrip_setup() -> (tempfile::TempDir, DataMapper, DynamicPubSub) {
    let fmu = common::stage_fmu(ROUNDTRIP_MAPPING);
    let resources = fmu.path().join("resources");
    let mut mapper = DataMapper::new();
    mapper.reset(&resources).expect("mapper reset");
    let mut pubsub = DynamicPubSub::new();
    pubsub
        .reset(&resources, &mapper, "rt-test", None)
        .expect("pubsub reset");
    (fmu, mapper, pubsub)
}

#[test]
fn roundtrip_double() {
    let (_fmu, mut mapper, mut pubsub) = roundtrip_setup();

    // Value references: output sub.rt.val is Real 0, input pub.rt.val is
    // Real 1, matching the signal distributor's layout.
    mapper.set_double(1, 3.14).expect("set input");
    pubsub.write(&mapper).expect("write");
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).expect("get output"), 3.14);
}

#[test]
fn take_latest_wins() {
    let (_fmu, mut mapper, mut pubsub) = roundtrip_setup();

    mapper.set_double(1, 1.8).expect("set input");
    pubsub.write(&mapper).expect("write");
    mapper.set_double(1, 0.9).expect("set input");
    pubsub.write(&mapper).expect("write");
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).expect("get output"), 0.9);
}

#[test]
fn output_unchanged_without_samples() {
    let (_fmu, mut mapper, mut pubsub) = roundtrip_setup();

    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).expect("get output"), 0.0);
}

const KEYED_MAPPING: &str = r#"
<ddsfmu>
  <fmu_out topic="sig" type="idl::test::Signal" key_filter="true"/>
  <fmu_in  topic="sig" type="idl::test::Signal"/>
</ddsfmu>
"#;

/// Value references for the keyed mapping:
/// outputs: sub.sig.color Integer 0, sub.sig.strength Real 0;
/// inputs: pub.sig.color Integer 1, pub.sig.strength Real 1;
/// parameters: key.sub.sig.color Integer 2.
fn keyed_setup() -> (tempfile::TempDir, DataMapper, DynamicPubSub) {
    let fmu = common::stage_fmu(KEYED_MAPPING);
    let resources = fmu.path().join("resources");
    let mut mapper = DataMapper::new();
    mapper.reset(&resources).expect("mapper reset");
    let mut pubsub = DynamicPubSub::new();
    pubsub
        .reset(&resources, &mapper, "key-test", None)
        .expect("pubsub reset");
    (fmu, mapper, pubsub)
}

fn publish(
    mapper: &mut DataMapper,
    pubsub: &mut DynamicPubSub,
    color: i32,
    strength: f64,
) {
    mapper.set_int(1, color).expect("set color");
    mapper.set_double(1, strength).expect("set strength");
    pubsub.write(mapper).expect("write");
}

#[test]
fn key_filter_admits_only_matching_samples() {
    let (_fmu, mut mapper, mut pubsub) = keyed_setup();

    // Select BETA (enumerator 1) and install the filter parameters, as
    // ExitInitializationMode would.
    mapper.set_int(2, 1).expect("set key parameter");
    pubsub.init_key_filters(&mapper).expect("init filters");

    publish(&mut mapper, &mut pubsub, 0, 1.0); // ALPHA, dropped
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).unwrap(), 0.0);
    assert_eq!(mapper.get_int(0).unwrap(), 0);

    publish(&mut mapper, &mut pubsub, 1, 2.0); // BETA, kept
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).unwrap(), 2.0);
    assert_eq!(mapper.get_int(0).unwrap(), 1);

    publish(&mut mapper, &mut pubsub, 0, 3.0); // ALPHA, dropped
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).unwrap(), 2.0);

    publish(&mut mapper, &mut pubsub, 1, 4.0); // BETA, kept
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).unwrap(), 4.0);
}

#[test]
fn key_filter_preserves_order_of_matches() {
    let (_fmu, mut mapper, mut pubsub) = keyed_setup();
    mapper.set_int(2, 1).expect("set key parameter");
    pubsub.init_key_filters(&mapper).expect("init filters");

    // Alternating keys, two BETA samples queued before a single take:
    // the newest admitted sample must win.
    for (color, strength) in [(0, 10.0), (1, 11.0), (0, 12.0), (1, 13.0)] {
        publish(&mut mapper, &mut pubsub, color, strength);
    }
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).unwrap(), 13.0);
}

#[test]
fn alpha_filter_selects_the_other_instance() {
    let (_fmu, mut mapper, mut pubsub) = keyed_setup();
    mapper.set_int(2, 0).expect("set key parameter");
    pubsub.init_key_filters(&mapper).expect("init filters");

    publish(&mut mapper, &mut pubsub, 1, 5.0); // BETA, dropped
    publish(&mut mapper, &mut pubsub, 0, 6.0); // ALPHA, kept
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).unwrap(), 6.0);
    assert_eq!(mapper.get_int(0).unwrap(), 0);
}

#[test]
fn without_parameter_update_nothing_is_admitted() {
    let (_fmu, mut mapper, mut pubsub) = keyed_setup();
    // init_key_filters never ran: the filter still holds the placeholder
    // GUID and rejects everything.
    publish(&mut mapper, &mut pubsub, 1, 9.0);
    pubsub.take(&mut mapper).expect("take");
    assert_eq!(mapper.get_double(0).unwrap(), 0.0);
}
