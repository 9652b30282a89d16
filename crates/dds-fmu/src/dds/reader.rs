// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Data readers with bounded history.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::topic::{ContentFilteredTopic, Topic};
use super::{DdsError, Guid};
use crate::dynamic::{SerializedPayload, WireData, WirePubSubType};

/// Per-sample metadata returned by `take_next_sample`.
#[derive(Debug, Clone, Copy)]
pub struct SampleInfo {
    pub valid_data: bool,
}

/// A subscription endpoint: holds the samples admitted for it, newest at
/// the back, bounded by the KEEP_LAST depth of its QoS.
pub struct DataReader {
    guid: Guid,
    topic: Arc<Topic>,
    filter: Option<Arc<ContentFilteredTopic>>,
    support: Arc<WirePubSubType>,
    history: Mutex<VecDeque<SerializedPayload>>,
    depth: usize,
}

impl DataReader {
    pub(super) fn new(
        guid: Guid,
        topic: Arc<Topic>,
        filter: Option<Arc<ContentFilteredTopic>>,
        support: Arc<WirePubSubType>,
        depth: usize,
    ) -> Self {
        Self {
            guid,
            topic,
            filter,
            support,
            history: Mutex::new(VecDeque::new()),
            depth: depth.max(1),
        }
    }

    pub fn guid(&self) -> &Guid {
        &self.guid
    }

    pub fn topic_name(&self) -> &str {
        self.topic.name()
    }

    pub fn type_support(&self) -> &Arc<WirePubSubType> {
        &self.support
    }

    /// The content-filtered topic this reader subscribes through, if any.
    pub fn filtered_topic(&self) -> Option<&Arc<ContentFilteredTopic>> {
        self.filter.as_ref()
    }

    /// Offer a payload from the delivery path. The filter, if any, runs on
    /// the serialized form; rejected samples never enter the history.
    pub(super) fn offer(&self, payload: &SerializedPayload) {
        if let Some(filter) = &self.filter {
            if !filter.evaluate(payload, &self.guid) {
                return;
            }
        }
        let mut history = self.history.lock();
        while history.len() >= self.depth {
            history.pop_front();
        }
        history.push_back(payload.clone());
    }

    /// Pop and deserialize the oldest sample. `Ok(None)` means the history
    /// is empty; callers loop until then, so the newest sample wins.
    pub fn take_next_sample(&self, data: &mut WireData) -> Result<Option<SampleInfo>, DdsError> {
        let payload = self.history.lock().pop_front();
        let Some(payload) = payload else {
            return Ok(None);
        };
        self.support.deserialize(&payload, data)?;
        Ok(Some(SampleInfo { valid_data: true }))
    }

    /// Number of buffered samples.
    pub fn unread_count(&self) -> usize {
        self.history.lock().len()
    }
}

impl std::fmt::Debug for DataReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataReader")
            .field("guid", &self.guid.to_string())
            .field("topic", &self.topic.name())
            .field("filtered", &self.filter.is_some())
            .field("depth", &self.depth)
            .finish()
    }
}
