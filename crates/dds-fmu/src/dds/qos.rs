// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! QoS policies and XML profile loading.
//!
//! Profiles follow the Fast DDS XML layout: a `<profiles>` element holding
//! `<participant>`, `<data_writer>`, `<data_reader>` and `<topic>`
//! profiles, each identified by `profile_name`. Only the policies the bus
//! acts on are extracted; everything else in an operator-provided profile
//! passes through unharmed.

use std::collections::HashMap;
use std::path::Path;

use roxmltree::{Document, Node};

use super::DdsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    BestEffort,
    Reliable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    Volatile,
    TransientLocal,
}

/// The policy subset the in-process bus honors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QoS {
    pub reliability: Reliability,
    pub durability: Durability,
    /// KEEP_LAST depth of the reader history.
    pub history_depth: usize,
}

impl Default for QoS {
    fn default() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            durability: Durability::Volatile,
            history_depth: 16,
        }
    }
}

/// Profiles per entity kind, keyed by `profile_name`.
#[derive(Debug, Clone, Default)]
pub struct QosProfileStore {
    participants: HashMap<String, QoS>,
    writers: HashMap<String, QoS>,
    readers: HashMap<String, QoS>,
    topics: HashMap<String, QoS>,
}

impl QosProfileStore {
    /// Load profiles from a Fast DDS style XML file.
    pub fn load(path: &Path) -> Result<Self, DdsError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| DdsError::Io(path.to_path_buf(), e))?;
        Self::parse(&text)
    }

    /// Parse profile XML content.
    pub fn parse(text: &str) -> Result<Self, DdsError> {
        let doc = Document::parse(text).map_err(|e| DdsError::Xml(e.to_string()))?;
        let Some(profiles) = doc
            .root_element()
            .descendants()
            .find(|n| n.tag_name().name() == "profiles")
        else {
            return Err(DdsError::Xml("no <profiles> element found".into()));
        };

        let mut store = Self::default();
        for node in profiles.children().filter(|n| n.is_element()) {
            let Some(name) = node.attribute("profile_name") else {
                continue;
            };
            let qos = extract_qos(&node);
            match node.tag_name().name() {
                "participant" => {
                    store.participants.insert(name.to_string(), qos);
                }
                "data_writer" | "publisher" => {
                    store.writers.insert(name.to_string(), qos);
                }
                "data_reader" | "subscriber" => {
                    store.readers.insert(name.to_string(), qos);
                }
                "topic" => {
                    store.topics.insert(name.to_string(), qos);
                }
                _ => {}
            }
        }
        Ok(store)
    }

    pub fn participant(&self, name: &str) -> Option<&QoS> {
        self.participants.get(name)
    }

    pub fn writer(&self, name: &str) -> Option<&QoS> {
        self.writers.get(name)
    }

    pub fn reader(&self, name: &str) -> Option<&QoS> {
        self.readers.get(name)
    }

    pub fn topic(&self, name: &str) -> Option<&QoS> {
        self.topics.get(name)
    }
}

fn extract_qos(profile: &Node) -> QoS {
    let mut qos = QoS::default();

    if let Some(kind) = profile
        .descendants()
        .find(|n| n.tag_name().name() == "reliability")
        .and_then(|rel| rel.descendants().find(|n| n.tag_name().name() == "kind"))
        .and_then(|n| n.text())
    {
        qos.reliability = match kind.trim() {
            "RELIABLE" => Reliability::Reliable,
            _ => Reliability::BestEffort,
        };
    }

    if let Some(kind) = profile
        .descendants()
        .find(|n| n.tag_name().name() == "durability")
        .and_then(|dur| dur.descendants().find(|n| n.tag_name().name() == "kind"))
        .and_then(|n| n.text())
    {
        qos.durability = match kind.trim() {
            "TRANSIENT_LOCAL" | "TRANSIENT" | "PERSISTENT" => Durability::TransientLocal,
            _ => Durability::Volatile,
        };
    }

    if let Some(depth) = profile
        .descendants()
        .find(|n| n.tag_name().name() == "historyQos")
        .and_then(|h| h.descendants().find(|n| n.tag_name().name() == "depth"))
        .and_then(|n| n.text())
        .and_then(|t| t.trim().parse::<usize>().ok())
    {
        if depth > 0 {
            qos.history_depth = depth;
        }
    }

    qos
}
