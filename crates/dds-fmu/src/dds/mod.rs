// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! In-process DDS entities.
//!
//! The FMU needs exactly the API surface a DDS middleware offers to a
//! dynamically-typed bridge: a participant acting as entity factory,
//! profile-driven QoS, topics and content-filtered topics, writers that
//! serialize wire buffers, readers with bounded history, and content
//! filters evaluated on the serialized payload before a sample is
//! admitted to a reader. This module supplies that surface with delivery
//! performed in-process: a write serializes the sample once and offers the
//! payload to every matching reader.
//!
//! Entity teardown order matters and is owned by the pub/sub layer:
//! readers, subscriber, writers, publisher, topics, filtered topics,
//! contained entities, participant.

mod filter;
pub mod key_filter;
mod participant;
pub mod qos;
mod reader;
mod topic;
mod writer;

use std::fmt;
use std::path::PathBuf;

pub use filter::{ContentFilter, ContentFilterFactory, FilterSampleInfo};
pub use key_filter::{CustomKeyFilter, KeyFilterFactory, CUSTOM_KEY_FILTER, GUID_UNKNOWN};
pub use participant::{DomainParticipant, Publisher, Subscriber};
pub use qos::{Durability, QoS, QosProfileStore, Reliability};
pub use reader::{DataReader, SampleInfo};
pub use topic::{ContentFilteredTopic, Topic};
pub use writer::DataWriter;

/// Errors from the DDS layer.
#[derive(Debug)]
pub enum DdsError {
    /// A named profile is missing from the loaded QoS XML.
    ProfileNotFound(String),
    /// QoS XML could not be read or parsed.
    Xml(String),
    Io(PathBuf, std::io::Error),
    /// Entity creation failed (participant, topic, reader, writer).
    EntityCreation(String),
    /// A filter factory was asked for an unknown filter class.
    FilterClass(String),
    /// Filter parameter sequence is malformed.
    FilterParameter(String),
    /// CDR (de)serialization failed outside the filter path.
    Serialization(crate::dynamic::WireCdrError),
    /// Registry lookup failed.
    NotFound(String),
}

impl fmt::Display for DdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProfileNotFound(name) => write!(f, "QoS profile not found: {}", name),
            Self::Xml(msg) => write!(f, "QoS XML error: {}", msg),
            Self::Io(path, e) => write!(f, "cannot read {}: {}", path.display(), e),
            Self::EntityCreation(msg) => write!(f, "entity creation failed: {}", msg),
            Self::FilterClass(name) => write!(f, "unknown content filter class: {}", name),
            Self::FilterParameter(msg) => write!(f, "invalid filter parameters: {}", msg),
            Self::Serialization(e) => write!(f, "serialization failed: {}", e),
            Self::NotFound(name) => write!(f, "not found: {}", name),
        }
    }
}

impl std::error::Error for DdsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Serialization(e) => Some(e),
            _ => None,
        }
    }
}

impl From<crate::dynamic::WireCdrError> for DdsError {
    fn from(e: crate::dynamic::WireCdrError) -> Self {
        Self::Serialization(e)
    }
}

/// RTPS-style entity identity: a 12-byte participant prefix plus a 4-byte
/// entity id, printed dotted with `|` before the entity part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guid {
    prefix: [u8; 12],
    entity_id: u32,
}

impl Guid {
    pub fn new(prefix: [u8; 12], entity_id: u32) -> Self {
        Self { prefix, entity_id }
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.prefix.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{:02x}", b)?;
        }
        let e = self.entity_id.to_be_bytes();
        write!(f, "|{:x}.{:x}.{:x}.{:x}", e[0], e[1], e[2], e[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_display_is_stable() {
        let guid = Guid::new([1, 15, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2], 0x0103);
        let text = guid.to_string();
        assert!(text.starts_with("01.0f."));
        assert!(text.contains('|'));
        assert_eq!(text, guid.to_string());
    }
}
