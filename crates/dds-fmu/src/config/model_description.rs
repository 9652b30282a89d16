// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Model description template handling and generation.
//!
//! The template under `resources/config/modelDescription.xml` carries
//! everything that does not depend on the signal configuration. Generation
//! streams the template through, replacing the `guid` attribute and
//! appending a `<ModelVariables>` subtree plus the `<ModelStructure>`
//! output indices right before the closing root tag.

use std::path::Path;

use log::info;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use roxmltree::Document;

use super::{ConfigError, ScalarVariableType};
use crate::distributor::SignalInfo;

fn xml_err(e: impl std::fmt::Display) -> ConfigError {
    ConfigError::Xml(e.to_string())
}

/// Load the template model description and log its header attributes.
pub fn load_template_xml(path: &Path) -> Result<String, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.into(), e))?;
    let doc = Document::parse(&text).map_err(xml_err)?;
    let root = doc.root_element();
    if root.tag_name().name() != "fmiModelDescription" {
        return Err(ConfigError::Schema(
            "template root must be <fmiModelDescription>".into(),
        ));
    }
    let attr = |name: &str| root.attribute(name).unwrap_or_default();
    info!("FMI version: {}", attr("fmiVersion"));
    info!("Model name:  {}", attr("modelName"));
    info!("Description: {}", attr("description"));
    info!("Author:      {}", attr("author"));
    info!("Version:     {}", attr("version"));
    info!("Guid:        {}", attr("guid"));
    info!("Convention:  {}", attr("variableNamingConvention"));
    Ok(text)
}

/// Append one `<ScalarVariable>` for a signal table entry.
pub fn model_variable_generator(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    causality: &str,
    value_ref: u32,
    ty: ScalarVariableType,
) -> Result<(), ConfigError> {
    let mut variable = BytesStart::new("ScalarVariable");
    variable.push_attribute(("name", name));
    variable.push_attribute(("valueReference", value_ref.to_string().as_str()));
    variable.push_attribute(("variability", "discrete"));
    variable.push_attribute(("causality", causality));
    if causality == "output" || causality == "parameter" {
        variable.push_attribute(("initial", "exact"));
    }
    writer.write_event(Event::Start(variable)).map_err(xml_err)?;

    let start = match ty {
        ScalarVariableType::Real => Some(("Real", "0.0")),
        ScalarVariableType::Integer => Some(("Integer", "0")),
        ScalarVariableType::Boolean => Some(("Boolean", "false")),
        ScalarVariableType::String => Some(("String", "")),
        ScalarVariableType::Unknown => None,
    };
    if let Some((element, default)) = start {
        let mut child = BytesStart::new(element);
        child.push_attribute(("start", default));
        writer.write_event(Event::Empty(child)).map_err(xml_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("ScalarVariable")))
        .map_err(xml_err)?;
    Ok(())
}

/// Emit `<ModelStructure><Outputs>` with one `<Unknown>` per output,
/// indices `1..=num_outputs`.
pub fn model_structure_outputs_generator(
    writer: &mut Writer<Vec<u8>>,
    num_outputs: u32,
) -> Result<(), ConfigError> {
    writer
        .write_event(Event::Start(BytesStart::new("ModelStructure")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("Outputs")))
        .map_err(xml_err)?;
    for index in 1..=num_outputs {
        let mut unknown = BytesStart::new("Unknown");
        unknown.push_attribute(("index", index.to_string().as_str()));
        writer.write_event(Event::Empty(unknown)).map_err(xml_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("Outputs")))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("ModelStructure")))
        .map_err(xml_err)?;
    Ok(())
}

/// Rewrite the template: replace the `guid` attribute and append the model
/// variables and structure before the closing root tag.
pub fn render_model_description(
    template: &str,
    signals: &[SignalInfo],
    outputs: u32,
    guid: &str,
) -> Result<String, ConfigError> {
    let mut reader = Reader::from_str(template);
    let mut writer = Writer::new(Vec::new());
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == b"fmiModelDescription" => {
                let mut patched = BytesStart::new("fmiModelDescription");
                for attr in e.attributes().with_checks(false).flatten() {
                    if attr.key.as_ref() == b"guid" {
                        patched.push_attribute(("guid", guid));
                    } else {
                        patched.push_attribute(Attribute {
                            key: attr.key,
                            value: attr.value.clone(),
                        });
                    }
                }
                writer.write_event(Event::Start(patched)).map_err(xml_err)?;
            }
            Event::End(e) if e.name().as_ref() == b"fmiModelDescription" => {
                writer
                    .write_event(Event::Start(BytesStart::new("ModelVariables")))
                    .map_err(xml_err)?;
                for signal in signals {
                    model_variable_generator(
                        &mut writer,
                        &signal.name,
                        &signal.causality,
                        signal.value_ref,
                        signal.ty,
                    )?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new("ModelVariables")))
                    .map_err(xml_err)?;
                model_structure_outputs_generator(&mut writer, outputs)?;
                writer.write_event(Event::End(e)).map_err(xml_err)?;
            }
            other => writer.write_event(other).map_err(xml_err)?,
        }
    }
    String::from_utf8(writer.into_inner())
        .map_err(|e| ConfigError::Xml(format!("generated XML is not UTF-8: {}", e)))
}

/// Write the generated model description to `<fmu_root>/modelDescription.xml`,
/// replacing any existing file.
pub fn write_model_description(content: &str, fmu_root: &Path) -> Result<(), ConfigError> {
    let path = fmu_root.join("modelDescription.xml");
    std::fs::write(&path, content).map_err(|e| ConfigError::Io(path, e))
}

/// Run the full generation flow against an FMU tree and return the
/// rendered document.
///
/// Outputs are processed before inputs so the `<ModelStructure>` output
/// indices are simply `1..=outputs`; key parameters come last. The guid is
/// computed over the configuration files only, which is exactly what the
/// loaded FMU recomputes at instantiation.
pub fn generate_model_description(fmu_root: &Path) -> crate::Result<String> {
    use super::{generate_uuid, load_mapping, uuid_files, MappingDirection};
    use crate::distributor::{Cardinality, SignalDistributor};

    let resources = fmu_root.join("resources");
    let template_path = resources.join("config").join("modelDescription.xml");
    let mapping_path = resources.join("config").join("dds").join("ddsfmu_mapping.xml");
    for required in [&template_path, &mapping_path] {
        if !required.is_file() {
            return Err(ConfigError::Missing(required.clone()).into());
        }
    }

    let entries = load_mapping(&mapping_path)?;
    let mut distributor = SignalDistributor::new();
    distributor.load_idls(&resources)?;

    let mut pass = |direction: MappingDirection,
                    distributor: &mut SignalDistributor|
     -> crate::Result<()> {
        for entry in entries.iter().filter(|e| e.direction == direction) {
            if !distributor.has_structure(&entry.type_name) {
                return Err(crate::FmuError::Config(format!(
                    "got non-existing 'type': {}",
                    entry.type_name
                )));
            }
            let cardinal = match direction {
                MappingDirection::FmuOut => Cardinality::Output,
                MappingDirection::FmuIn => Cardinality::Input,
            };
            distributor.add(&entry.topic, &entry.type_name, cardinal)?;
            if entry.key_filter {
                distributor.queue_for_key_parameter(&entry.topic, &entry.type_name);
            }
        }
        Ok(())
    };
    pass(MappingDirection::FmuOut, &mut distributor)?;
    pass(MappingDirection::FmuIn, &mut distributor)?;
    distributor.process_key_queue()?;

    let template = load_template_xml(&template_path)?;
    let guid = generate_uuid(&uuid_files(fmu_root, true), &[])?;
    Ok(render_model_description(
        &template,
        distributor.get_mapping(),
        distributor.outputs(),
        &guid,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_variables(signals: &[(&str, &str, u32, ScalarVariableType)]) -> String {
        let mut writer = Writer::new(Vec::new());
        for (name, causality, vr, ty) in signals {
            model_variable_generator(&mut writer, name, causality, *vr, *ty).expect("generate");
        }
        String::from_utf8(writer.into_inner()).expect("utf8")
    }

    #[test]
    fn scalar_variable_emission() {
        let xml = render_variables(&[
            ("distance", "output", 0, ScalarVariableType::Real),
            ("distance", "output", 0, ScalarVariableType::Integer),
            ("distance", "input", 0, ScalarVariableType::Boolean),
            ("distance", "input", 0, ScalarVariableType::String),
            ("distance", "parameter", 0, ScalarVariableType::Real),
        ]);
        let expected = concat!(
            r#"<ScalarVariable name="distance" valueReference="0" variability="discrete" causality="output" initial="exact"><Real start="0.0"/></ScalarVariable>"#,
            r#"<ScalarVariable name="distance" valueReference="0" variability="discrete" causality="output" initial="exact"><Integer start="0"/></ScalarVariable>"#,
            r#"<ScalarVariable name="distance" valueReference="0" variability="discrete" causality="input"><Boolean start="false"/></ScalarVariable>"#,
            r#"<ScalarVariable name="distance" valueReference="0" variability="discrete" causality="input"><String start=""/></ScalarVariable>"#,
            r#"<ScalarVariable name="distance" valueReference="0" variability="discrete" causality="parameter" initial="exact"><Real start="0.0"/></ScalarVariable>"#,
        );
        assert_eq!(xml, expected);
    }

    #[test]
    fn outputs_structure_emission() {
        let mut writer = Writer::new(Vec::new());
        model_structure_outputs_generator(&mut writer, 3).expect("generate");
        let xml = String::from_utf8(writer.into_inner()).expect("utf8");
        assert_eq!(
            xml,
            r#"<ModelStructure><Outputs><Unknown index="1"/><Unknown index="2"/><Unknown index="3"/></Outputs></ModelStructure>"#
        );
    }

    #[test]
    fn template_guid_is_replaced() {
        let template = r#"<?xml version="1.0" encoding="UTF-8"?>
<fmiModelDescription fmiVersion="2.0" modelName="dds-fmu" guid="0f0a1c2d-3e4f-5061-7283-94a5b6c7d8e9">
  <CoSimulation modelIdentifier="dds-fmu"/>
</fmiModelDescription>"#;
        let rendered =
            render_model_description(template, &[], 0, "11111111-2222-3333-4444-555555555555")
                .expect("render");
        assert!(rendered.contains(r#"guid="11111111-2222-3333-4444-555555555555""#));
        assert!(!rendered.contains("0f0a1c2d"));
        assert!(rendered.contains("<ModelVariables></ModelVariables>"));
        assert!(rendered.contains("<Outputs></Outputs>"));
    }
}
