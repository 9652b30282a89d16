// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Data writers.

use std::sync::Arc;

use super::participant::DomainParticipant;
use super::topic::Topic;
use super::{DdsError, Guid};
use crate::dynamic::{WireData, WirePubSubType};

/// A publication endpoint. `write` serializes once and offers the payload
/// to every reader currently matched on the topic.
pub struct DataWriter {
    guid: Guid,
    topic: Arc<Topic>,
    support: Arc<WirePubSubType>,
    participant: Arc<DomainParticipant>,
}

impl DataWriter {
    pub(super) fn new(
        guid: Guid,
        topic: Arc<Topic>,
        support: Arc<WirePubSubType>,
        participant: Arc<DomainParticipant>,
    ) -> Self {
        Self {
            guid,
            topic,
            support,
            participant,
        }
    }

    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    pub fn topic_name(&self) -> &str {
        self.topic.name()
    }

    /// Serialize and deliver one sample.
    pub fn write(&self, data: &WireData) -> Result<(), DdsError> {
        let payload = self.support.serialize(data)?;
        self.participant.route(self.topic.name(), &payload);
        Ok(())
    }
}

impl std::fmt::Debug for DataWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataWriter")
            .field("guid", &self.guid.to_string())
            .field("topic", &self.topic.name())
            .finish()
    }
}
