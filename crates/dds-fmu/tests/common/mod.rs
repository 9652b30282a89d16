// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Shared staging helpers: lay out an FMU resource tree on disk.

// Each integration test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

pub const IDL: &str = r#"
module idl {
  module test {
    struct Roundtrip {
      double val;
    };

    enum Color {
      ALPHA,
      BETA
    };

    struct Signal {
      @key Color color;
      double strength;
    };
  };
};
"#;

pub const PROFILE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dds xmlns="http://www.eprosima.com/XMLSchemas/fastRTPS_Profiles">
  <profiles>
    <participant profile_name="dds-fmu-default" is_default_profile="true">
      <rtps>
        <name>dds-fmu</name>
      </rtps>
    </participant>
    <data_writer profile_name="dds-fmu-default">
      <qos>
        <reliability><kind>RELIABLE</kind></reliability>
      </qos>
    </data_writer>
    <data_reader profile_name="dds-fmu-default">
      <qos>
        <reliability><kind>RELIABLE</kind></reliability>
      </qos>
      <topic>
        <historyQos><kind>KEEP_LAST</kind><depth>16</depth></historyQos>
      </topic>
    </data_reader>
  </profiles>
</dds>
"#;

pub const TEMPLATE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="2.0" modelName="dds-fmu" description="DDS-FMU bridge" author="ddsfmu contributors" version="0.4.2" guid="00000000-0000-0000-0000-000000000000" variableNamingConvention="structured">
  <CoSimulation modelIdentifier="dds-fmu" canHandleVariableCommunicationStepSize="true"/>
</fmiModelDescription>
"#;

/// Stage a complete FMU tree and return its root.
pub fn stage_fmu(mapping_xml: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write_tree(dir.path(), mapping_xml);
    dir
}

pub fn write_tree(fmu_root: &Path, mapping_xml: &str) {
    let config = fmu_root.join("resources").join("config");
    std::fs::create_dir_all(config.join("idl")).expect("mkdir idl");
    std::fs::create_dir_all(config.join("dds")).expect("mkdir dds");
    std::fs::create_dir_all(fmu_root.join("binaries")).expect("mkdir binaries");
    std::fs::write(config.join("idl").join("dds-fmu.idl"), IDL).expect("write idl");
    std::fs::write(config.join("dds").join("dds_profile.xml"), PROFILE_XML)
        .expect("write profile");
    std::fs::write(config.join("dds").join("ddsfmu_mapping.xml"), mapping_xml)
        .expect("write mapping");
    std::fs::write(config.join("modelDescription.xml"), TEMPLATE_XML).expect("write template");
}

/// The GUID the loaded FMU would recompute for this tree.
pub fn computed_guid(fmu_root: &Path) -> String {
    ddsfmu::config::generate_uuid(&ddsfmu::config::uuid_files(fmu_root, true), &[])
        .expect("guid")
}

/// `file://` URL for the resources directory.
pub fn resource_url(fmu_root: &Path) -> String {
    format!("file://{}", fmu_root.join("resources").display())
}
