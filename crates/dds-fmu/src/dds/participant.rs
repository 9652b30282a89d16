// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Domain participant: entity factory and delivery router.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::filter::ContentFilterFactory;
use super::qos::{QoS, QosProfileStore};
use super::reader::DataReader;
use super::topic::{ContentFilteredTopic, Topic};
use super::writer::DataWriter;
use super::{DdsError, Guid};
use crate::dynamic::{SerializedPayload, WirePubSubType};

static PARTICIPANT_SEQ: AtomicU32 = AtomicU32::new(0);

/// Factory for every other entity; owns the topic registry, the type
/// registrations, the content-filter factories, and the reader router that
/// delivers written payloads.
pub struct DomainParticipant {
    profiles: QosProfileStore,
    guid_prefix: [u8; 12],
    next_entity: AtomicU32,
    topics: Mutex<HashMap<String, Arc<Topic>>>,
    types: Mutex<HashMap<String, Arc<WirePubSubType>>>,
    factories: Mutex<HashMap<String, Arc<dyn ContentFilterFactory>>>,
    readers: Mutex<HashMap<String, Vec<Arc<DataReader>>>>,
}

impl DomainParticipant {
    /// Create a participant from a named profile.
    pub fn create_with_profile(
        profiles: QosProfileStore,
        profile_name: &str,
    ) -> Result<Arc<Self>, DdsError> {
        if profiles.participant(profile_name).is_none() {
            return Err(DdsError::ProfileNotFound(profile_name.to_string()));
        }
        let seq = PARTICIPANT_SEQ.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        let mut guid_prefix = [0u8; 12];
        guid_prefix[0] = 0x01;
        guid_prefix[1] = 0x0f;
        guid_prefix[2..6].copy_from_slice(&pid.to_be_bytes());
        guid_prefix[6..10].copy_from_slice(&seq.to_be_bytes());
        Ok(Arc::new(Self {
            profiles,
            guid_prefix,
            next_entity: AtomicU32::new(1),
            topics: Mutex::new(HashMap::new()),
            types: Mutex::new(HashMap::new()),
            factories: Mutex::new(HashMap::new()),
            readers: Mutex::new(HashMap::new()),
        }))
    }

    fn next_guid(&self) -> Guid {
        Guid::new(
            self.guid_prefix,
            self.next_entity.fetch_add(1, Ordering::Relaxed),
        )
    }

    pub fn create_publisher_with_profile(
        self: &Arc<Self>,
        profile_name: &str,
    ) -> Result<Publisher, DdsError> {
        let qos = self
            .profiles
            .writer(profile_name)
            .cloned()
            .unwrap_or_default();
        Ok(Publisher {
            participant: Arc::clone(self),
            default_qos: qos,
        })
    }

    pub fn create_subscriber_with_profile(
        self: &Arc<Self>,
        profile_name: &str,
    ) -> Result<Subscriber, DdsError> {
        let qos = self
            .profiles
            .reader(profile_name)
            .cloned()
            .unwrap_or_default();
        Ok(Subscriber {
            participant: Arc::clone(self),
            default_qos: qos,
        })
    }

    /// Register a content filter factory under a class name. Registering
    /// the same class twice is an error.
    pub fn register_content_filter_factory(
        &self,
        class_name: &str,
        factory: Arc<dyn ContentFilterFactory>,
    ) -> Result<(), DdsError> {
        let mut factories = self.factories.lock();
        if factories.contains_key(class_name) {
            return Err(DdsError::EntityCreation(format!(
                "filter factory already registered: {}",
                class_name
            )));
        }
        factories.insert(class_name.to_string(), factory);
        Ok(())
    }

    /// Look up a registered type support.
    pub fn find_type(&self, type_name: &str) -> Option<Arc<WirePubSubType>> {
        self.types.lock().get(type_name).cloned()
    }

    /// Register a type support. Idempotent: an existing registration under
    /// the same name is kept.
    pub fn register_type(&self, support: Arc<WirePubSubType>) {
        self.types
            .lock()
            .entry(support.name().to_string())
            .or_insert(support);
    }

    pub fn lookup_topicdescription(&self, topic_name: &str) -> Option<Arc<Topic>> {
        self.topics.lock().get(topic_name).cloned()
    }

    /// Create a topic using the QoS profile named after it.
    pub fn create_topic_with_profile(
        &self,
        topic_name: &str,
        type_name: &str,
        profile_name: &str,
    ) -> Result<Arc<Topic>, DdsError> {
        let qos = self
            .profiles
            .topic(profile_name)
            .cloned()
            .ok_or_else(|| DdsError::ProfileNotFound(profile_name.to_string()))?;
        self.create_topic(topic_name, type_name, qos)
    }

    /// Create a topic with explicit QoS.
    pub fn create_topic(
        &self,
        topic_name: &str,
        type_name: &str,
        qos: QoS,
    ) -> Result<Arc<Topic>, DdsError> {
        let mut topics = self.topics.lock();
        if topics.contains_key(topic_name) {
            return Err(DdsError::EntityCreation(format!(
                "topic already exists: {}",
                topic_name
            )));
        }
        if self.find_type(type_name).is_none() {
            return Err(DdsError::EntityCreation(format!(
                "type not registered with participant: {}",
                type_name
            )));
        }
        let topic = Arc::new(Topic::new(topic_name, type_name, qos));
        topics.insert(topic_name.to_string(), topic.clone());
        Ok(topic)
    }

    /// Create a content-filtered topic bound to a registered filter class.
    pub fn create_contentfilteredtopic(
        &self,
        name: &str,
        related: &Arc<Topic>,
        filter_expression: &str,
        expression_parameters: Vec<String>,
        filter_class_name: &str,
    ) -> Result<Arc<ContentFilteredTopic>, DdsError> {
        let factory = self
            .factories
            .lock()
            .get(filter_class_name)
            .cloned()
            .ok_or_else(|| DdsError::FilterClass(filter_class_name.to_string()))?;
        let support = self.find_type(related.type_name()).ok_or_else(|| {
            DdsError::EntityCreation(format!(
                "type not registered with participant: {}",
                related.type_name()
            ))
        })?;
        let filtered = ContentFilteredTopic::new(
            name,
            related.clone(),
            filter_class_name,
            filter_expression,
            expression_parameters,
            factory,
            support,
        )?;
        Ok(Arc::new(filtered))
    }

    /// Deliver a payload to every reader matched on the topic.
    pub(super) fn route(&self, topic_name: &str, payload: &SerializedPayload) {
        let readers = self.readers.lock();
        if let Some(matched) = readers.get(topic_name) {
            for reader in matched {
                reader.offer(payload);
            }
        }
    }

    pub(super) fn attach_reader(&self, topic_name: &str, reader: Arc<DataReader>) {
        self.readers
            .lock()
            .entry(topic_name.to_string())
            .or_default()
            .push(reader);
    }

    /// Detach a reader from the router.
    pub fn delete_datareader(&self, reader: &Arc<DataReader>) {
        let mut readers = self.readers.lock();
        if let Some(matched) = readers.get_mut(reader.topic_name()) {
            matched.retain(|r| !Arc::ptr_eq(r, reader));
        }
    }

    /// Drop every remaining registration: readers, topics, filter
    /// factories, type supports.
    pub fn delete_contained_entities(&self) {
        self.readers.lock().clear();
        self.topics.lock().clear();
        self.factories.lock().clear();
        self.types.lock().clear();
    }
}

impl std::fmt::Debug for DomainParticipant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainParticipant")
            .field("topics", &self.topics.lock().len())
            .field("types", &self.types.lock().len())
            .finish()
    }
}

/// Writer factory bound to a participant.
#[derive(Debug)]
pub struct Publisher {
    participant: Arc<DomainParticipant>,
    default_qos: QoS,
}

impl Publisher {
    /// Create a writer using the QoS profile named after the topic,
    /// falling back to the publisher default when absent.
    pub fn create_datawriter_with_profile(
        &self,
        topic: &Arc<Topic>,
        profile_name: &str,
    ) -> Result<Arc<DataWriter>, DdsError> {
        let qos = self
            .participant
            .profiles
            .writer(profile_name)
            .cloned()
            .unwrap_or_else(|| self.default_qos.clone());
        self.create_datawriter(topic, qos)
    }

    pub fn create_datawriter(
        &self,
        topic: &Arc<Topic>,
        _qos: QoS,
    ) -> Result<Arc<DataWriter>, DdsError> {
        let support = self.participant.find_type(topic.type_name()).ok_or_else(|| {
            DdsError::EntityCreation(format!(
                "unable to create DataWriter for topic: {}",
                topic.name()
            ))
        })?;
        Ok(Arc::new(DataWriter::new(
            self.participant.next_guid(),
            topic.clone(),
            support,
            Arc::clone(&self.participant),
        )))
    }
}

/// Reader factory bound to a participant.
#[derive(Debug)]
pub struct Subscriber {
    participant: Arc<DomainParticipant>,
    default_qos: QoS,
}

impl Subscriber {
    /// Create a reader on a plain topic using the profile named after it,
    /// falling back to the subscriber default.
    pub fn create_datareader_with_profile(
        &self,
        topic: &Arc<Topic>,
        profile_name: &str,
    ) -> Result<Arc<DataReader>, DdsError> {
        let qos = self.reader_qos(profile_name);
        self.create_datareader(topic, qos)
    }

    pub fn create_datareader(
        &self,
        topic: &Arc<Topic>,
        qos: QoS,
    ) -> Result<Arc<DataReader>, DdsError> {
        let support = self.reader_support(topic)?;
        let reader = Arc::new(DataReader::new(
            self.participant.next_guid(),
            topic.clone(),
            None,
            support,
            qos.history_depth,
        ));
        self.participant.attach_reader(topic.name(), reader.clone());
        Ok(reader)
    }

    /// Create a reader subscribing through a content-filtered topic.
    pub fn create_filtered_datareader_with_profile(
        &self,
        filtered: &Arc<ContentFilteredTopic>,
        profile_name: &str,
    ) -> Result<Arc<DataReader>, DdsError> {
        let qos = self.reader_qos(profile_name);
        self.create_filtered_datareader(filtered, qos)
    }

    pub fn create_filtered_datareader(
        &self,
        filtered: &Arc<ContentFilteredTopic>,
        qos: QoS,
    ) -> Result<Arc<DataReader>, DdsError> {
        let topic = filtered.related_topic();
        let support = self.reader_support(topic)?;
        let reader = Arc::new(DataReader::new(
            self.participant.next_guid(),
            topic.clone(),
            Some(filtered.clone()),
            support,
            qos.history_depth,
        ));
        self.participant.attach_reader(topic.name(), reader.clone());
        Ok(reader)
    }

    fn reader_qos(&self, profile_name: &str) -> QoS {
        self.participant
            .profiles
            .reader(profile_name)
            .cloned()
            .unwrap_or_else(|| self.default_qos.clone())
    }

    fn reader_support(&self, topic: &Arc<Topic>) -> Result<Arc<WirePubSubType>, DdsError> {
        self.participant.find_type(topic.type_name()).ok_or_else(|| {
            DdsError::EntityCreation(format!(
                "unable to create DataReader for topic: {}",
                topic.name()
            ))
        })
    }
}
