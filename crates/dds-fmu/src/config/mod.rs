// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Configuration handling: the topic mapping file, the model description
//! template and its generated counterpart, and the FMU GUID.
//!
//! Everything the FMU needs at run time lives under its resources folder:
//!
//! ```text
//! <root>/modelDescription.xml
//! <root>/resources/config/modelDescription.xml     template
//! <root>/resources/config/dds/dds_profile.xml      QoS profiles
//! <root>/resources/config/dds/ddsfmu_mapping.xml   topic <-> signal map
//! <root>/resources/config/idl/dds-fmu.idl          entry IDL
//! ```

mod guid;
mod mapping;
mod model_description;

use std::fmt;
use std::path::PathBuf;

pub use guid::{generate_uuid, uuid_files, GUID_NAMESPACE};
pub use mapping::{load_mapping, MappingDirection, MappingEntry};
pub use model_description::{
    generate_model_description, load_template_xml, model_structure_outputs_generator,
    model_variable_generator, render_model_description, write_model_description,
};

/// Primitive variable kinds in FMI 2.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarVariableType {
    Real,
    Integer,
    Boolean,
    String,
    Unknown,
}

impl ScalarVariableType {
    /// Element name used in the model description.
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Integer => "Integer",
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::Unknown => "Unknown",
        }
    }
}

/// Errors from configuration loading and generation.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    /// A required file is absent.
    Missing(PathBuf),
    /// XML parsing failed.
    Xml(String),
    /// The document does not follow the expected schema.
    Schema(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "cannot read {}: {}", path.display(), e),
            Self::Missing(path) => write!(f, "required file does not exist: {}", path.display()),
            Self::Xml(msg) => write!(f, "XML parse error: {}", msg),
            Self::Schema(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for crate::FmuError {
    fn from(e: ConfigError) -> Self {
        crate::FmuError::Config(e.to_string())
    }
}
