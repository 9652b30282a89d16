// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! # dds-fmu - an FMI 2.0 co-simulation slave backed by DDS topics
//!
//! This crate turns a set of IDL type definitions plus a topic mapping file
//! into a Functional Mock-up Unit whose scalar variables read and write
//! individual leaf fields of dynamically-typed DDS samples.
//!
//! At instantiation time the slave:
//!
//! 1. parses the IDL files shipped in the FMU resources into a type registry,
//! 2. walks every mapped topic type and materializes a flat table of FMI
//!    scalar variables (Real/Integer/Boolean/String) with dense value
//!    references,
//! 3. creates one dynamically-typed reader or writer per topic and wires each
//!    endpoint to the matching data buffer,
//! 4. optionally installs a key-based content filter whose reference values
//!    are exposed as FMI parameters.
//!
//! On every `DoStep` the slave publishes all input buffers and drains all
//! subscriptions into the output buffers.
//!
//! ## Modules Overview
//!
//! - [`idl`] - IDL parser and scoped type registry
//! - [`xtypes`] - structured dynamic types and data trees
//! - [`dynamic`] - wire-side dynamic data with CDR encoding
//! - [`convert`] - bidirectional copies between the two representations
//! - [`dds`] - in-process participant, topics, readers, writers, filters
//! - [`config`] - mapping file, model description and GUID handling
//! - [`fmu`] - FMI slave instance and C ABI entry points

/// Mapping file, model description generation and GUID computation.
pub mod config;
/// Conversion between structured data and the wire representation.
pub mod convert;
/// In-process DDS entities: participant, topics, readers, writers, filters.
pub mod dds;
/// Per-topic data buffers and value-reference accessor tables.
pub mod mapper;
/// Wire-side dynamic types and CDR serialization.
pub mod dynamic;
/// FMI 2.0 co-simulation slave and C entry points.
pub mod fmu;
/// IDL parsing into a scoped type registry.
pub mod idl;
/// Dynamic pub/sub topology construction and step pumps.
pub mod pubsub;
/// Signal table generation for the model description.
pub mod distributor;
/// Structured dynamic types and data trees with leaf traversal.
pub mod xtypes;

use std::fmt;

/// Top-level error type crossing the FMI boundary.
///
/// Configuration and wiring failures are fatal and surface as an FMI error
/// status; per-sample failures never reach this type (the filter and the
/// take loop degrade by dropping the offending sample).
#[derive(Debug)]
pub enum FmuError {
    /// Missing or malformed configuration (paths, XML schema, mapping).
    Config(String),
    /// IDL parsing failure, all diagnostics concatenated.
    Idl(idl::IdlError),
    /// Structured data access failure.
    Data(xtypes::DataError),
    /// Conversion between representations failed.
    Convert(convert::ConvertError),
    /// Middleware entity creation or operation failed.
    Dds(dds::DdsError),
    /// FMI value reference outside the accessor table.
    OutOfRange { kind: &'static str, value_ref: u32, len: usize },
    /// GUID in the model description does not match the recomputed one.
    GuidMismatch { expected: String, computed: String },
    /// Filesystem failure while reading resources.
    Io(std::io::Error),
}

impl fmt::Display for FmuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmuError::Config(msg) => write!(f, "configuration error: {}", msg),
            FmuError::Idl(e) => write!(f, "IDL error: {}", e),
            FmuError::Data(e) => write!(f, "data error: {}", e),
            FmuError::Convert(e) => write!(f, "conversion error: {}", e),
            FmuError::Dds(e) => write!(f, "DDS error: {}", e),
            FmuError::OutOfRange { kind, value_ref, len } => write!(
                f,
                "value reference {} out of range for {} (table has {} entries)",
                value_ref, kind, len
            ),
            FmuError::GuidMismatch { expected, computed } => write!(
                f,
                "FMU GUID mismatch: model description has {}, evaluated {}",
                expected, computed
            ),
            FmuError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FmuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FmuError::Idl(e) => Some(e),
            FmuError::Data(e) => Some(e),
            FmuError::Convert(e) => Some(e),
            FmuError::Dds(e) => Some(e),
            FmuError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<idl::IdlError> for FmuError {
    fn from(e: idl::IdlError) -> Self {
        FmuError::Idl(e)
    }
}

impl From<xtypes::DataError> for FmuError {
    fn from(e: xtypes::DataError) -> Self {
        FmuError::Data(e)
    }
}

impl From<convert::ConvertError> for FmuError {
    fn from(e: convert::ConvertError) -> Self {
        FmuError::Convert(e)
    }
}

impl From<dds::DdsError> for FmuError {
    fn from(e: dds::DdsError) -> Self {
        FmuError::Dds(e)
    }
}

impl From<std::io::Error> for FmuError {
    fn from(e: std::io::Error) -> Self {
        FmuError::Io(e)
    }
}

/// Convenient alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, FmuError>;
