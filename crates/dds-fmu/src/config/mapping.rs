// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Topic-to-signal mapping file.
//!
//! ```xml
//! <ddsfmu>
//!   <fmu_in  topic="T" type="Scoped::Name"/>
//!   <fmu_out topic="T" type="Scoped::Name" key_filter="true"/>
//! </ddsfmu>
//! ```
//!
//! `<fmu_in>` elements become DDS publishers (FMU inputs), `<fmu_out>`
//! elements become DDS subscribers (FMU outputs). `key_filter="true"` on an
//! `<fmu_out>` requests a content-filtered subscription whose `@key`
//! reference values surface as FMI parameters.

use std::path::Path;

use roxmltree::Document;

use super::ConfigError;

/// Which side of the FMU a mapping entry feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingDirection {
    /// `<fmu_in>`: FMU input, published to DDS.
    FmuIn,
    /// `<fmu_out>`: FMU output, subscribed from DDS.
    FmuOut,
}

/// One `<fmu_in>`/`<fmu_out>` element, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub topic: String,
    pub type_name: String,
    pub direction: MappingDirection,
    pub key_filter: bool,
}

/// Load `ddsfmu_mapping.xml`. Missing `topic` or `type` attributes are
/// fatal, as is a missing `<ddsfmu>` root.
pub fn load_mapping(path: &Path) -> Result<Vec<MappingEntry>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.into(), e))?;
    parse_mapping(&text)
}

/// Parse mapping XML content.
pub fn parse_mapping(text: &str) -> Result<Vec<MappingEntry>, ConfigError> {
    let doc = Document::parse(text).map_err(|e| ConfigError::Xml(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "ddsfmu" {
        return Err(ConfigError::Schema(
            "<ddsfmu> not found in ddsfmu_mapping.xml".into(),
        ));
    }

    let mut entries = Vec::new();
    for node in root.children().filter(|n| n.is_element()) {
        let direction = match node.tag_name().name() {
            "fmu_in" => MappingDirection::FmuIn,
            "fmu_out" => MappingDirection::FmuOut,
            other => {
                return Err(ConfigError::Schema(format!(
                    "unexpected element <{}> in <ddsfmu>",
                    other
                )))
            }
        };
        let topic = node.attribute("topic");
        let type_name = node.attribute("type");
        let (Some(topic), Some(type_name)) = (topic, type_name) else {
            return Err(ConfigError::Schema(format!(
                "<ddsfmu><{}> must specify attributes 'topic' and 'type'; got 'topic': {} and 'type': {}",
                node.tag_name().name(),
                topic.is_some(),
                type_name.is_some(),
            )));
        };
        let key_filter = direction == MappingDirection::FmuOut
            && node
                .attribute("key_filter")
                .is_some_and(|v| v.trim() == "true");
        entries.push(MappingEntry {
            topic: topic.to_string(),
            type_name: type_name.to_string(),
            direction,
            key_filter,
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_document_order() {
        let xml = r#"
            <ddsfmu>
              <fmu_out topic="a" type="T::A" key_filter="true"/>
              <fmu_in  topic="b" type="T::B"/>
              <fmu_out topic="c" type="T::C"/>
            </ddsfmu>
        "#;
        let entries = parse_mapping(xml).expect("parse");
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].direction, MappingDirection::FmuOut);
        assert!(entries[0].key_filter);
        assert_eq!(entries[1].direction, MappingDirection::FmuIn);
        assert!(!entries[1].key_filter);
        assert_eq!(entries[2].topic, "c");
    }

    #[test]
    fn missing_attribute_is_fatal() {
        let xml = r#"<ddsfmu><fmu_in topic="only"/></ddsfmu>"#;
        assert!(parse_mapping(xml).is_err());
    }

    #[test]
    fn key_filter_ignored_on_inputs() {
        let xml = r#"<ddsfmu><fmu_in topic="t" type="T" key_filter="true"/></ddsfmu>"#;
        let entries = parse_mapping(xml).expect("parse");
        assert!(!entries[0].key_filter);
    }

    #[test]
    fn wrong_root_is_fatal() {
        assert!(parse_mapping("<mapping/>").is_err());
    }
}
