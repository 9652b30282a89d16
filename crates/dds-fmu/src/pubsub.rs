// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Dynamic pub/sub topology: builds the DDS entities for every mapped
//! topic and pumps data between the mapper's structured buffers and the
//! wire buffers on each step.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};

use crate::config::{self, MappingDirection};
use crate::convert::Converter;
use crate::dds::{
    ContentFilteredTopic, DataReader, DataWriter, DomainParticipant, KeyFilterFactory, Publisher,
    QosProfileStore, Subscriber, Topic, CUSTOM_KEY_FILTER, GUID_UNKNOWN,
};
use crate::dynamic::{TypeSupportOptions, WireData, WirePubSubType};
use crate::fmu::logger::HostLogger;
use crate::mapper::{DataMapper, Direction};
use crate::xtypes::{for_each_leaf, DynamicType, Value};
use crate::{FmuError, Result};

/// Default profile name for participant, publisher and subscriber.
const DEFAULT_PROFILE: &str = "dds-fmu-default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PubOrSub {
    Publish,
    Subscribe,
}

/// Owns the DDS topology and the per-endpoint wire buffers.
///
/// Everything created in [`DynamicPubSub::reset`] has a paired teardown in
/// [`DynamicPubSub::clear`], which runs in reverse-of-creation order:
/// readers, subscriber, writers, publisher, topics, filtered topics,
/// contained entities, then the participant. The converter registries are
/// cleared in between so no filter callback can observe a stale wire type.
#[derive(Default)]
pub struct DynamicPubSub {
    converter: Arc<Converter>,
    profiles: Option<QosProfileStore>,
    participant: Option<Arc<DomainParticipant>>,
    publisher: Option<Publisher>,
    subscriber: Option<Subscriber>,
    topics: Vec<Arc<Topic>>,
    topic_to_type: HashMap<String, String>,
    types: HashMap<String, Arc<WirePubSubType>>,
    write_data: Vec<(Arc<DataWriter>, String, WireData)>,
    read_data: Vec<(Arc<DataReader>, String, WireData)>,
    reader_topic_filter: Vec<(Arc<DataReader>, Arc<ContentFilteredTopic>)>,
}

impl DynamicPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tear down all owned entities.
    pub fn clear(&mut self) {
        if let Some(participant) = &self.participant {
            for (reader, _, _) in &self.read_data {
                participant.delete_datareader(reader);
            }
        }
        self.read_data.clear();
        self.subscriber = None;
        self.write_data.clear();
        self.publisher = None;
        self.topics.clear();
        self.reader_topic_filter.clear();
        if let Some(participant) = &self.participant {
            participant.delete_contained_entities();
        }
        self.converter.clear_data_structures();
        self.participant = None;
        self.topic_to_type.clear();
        self.types.clear();
    }

    /// Tear down and rebuild the topology from the FMU resources.
    pub fn reset(
        &mut self,
        fmu_resources: &Path,
        mapper: &DataMapper,
        name: &str,
        logger: Option<&HostLogger>,
    ) -> Result<()> {
        self.clear();

        if let Some(host) = logger {
            // Bus log events reach the FMI master through the host logger.
            crate::fmu::logger::register_host_logger(host.clone(), name);
            log::set_max_level(log::LevelFilter::Info);
        }

        // The profile XML is loaded once per instance lifetime.
        if self.profiles.is_none() {
            let profile_path = fmu_resources.join("config").join("dds").join("dds_profile.xml");
            let store = QosProfileStore::load(&profile_path).map_err(|e| {
                FmuError::Config(format!("unable to load DDS XML profile: {}", e))
            })?;
            self.profiles = Some(store);
        }
        let profiles = self
            .profiles
            .clone()
            .unwrap_or_default();

        let participant = DomainParticipant::create_with_profile(profiles, DEFAULT_PROFILE)
            .map_err(|e| FmuError::Config(format!("could not create domain participant: {}", e)))?;
        let publisher = participant.create_publisher_with_profile(DEFAULT_PROFILE)?;
        let subscriber = participant.create_subscriber_with_profile(DEFAULT_PROFILE)?;
        participant.register_content_filter_factory(
            CUSTOM_KEY_FILTER,
            Arc::new(KeyFilterFactory::new(self.converter.clone())),
        )?;

        let mapping_path = fmu_resources
            .join("config")
            .join("dds")
            .join("ddsfmu_mapping.xml");
        let entries = config::load_mapping(&mapping_path)?;

        let mut signals: Vec<(String, String, PubOrSub)> = Vec::new();
        for pass in [MappingDirection::FmuIn, MappingDirection::FmuOut] {
            for entry in entries.iter().filter(|e| e.direction == pass) {
                if !mapper.idl_context().has_structure(&entry.type_name) {
                    return Err(FmuError::Config(format!(
                        "requested unknown type: {}",
                        entry.type_name
                    )));
                }
                let direction = match pass {
                    MappingDirection::FmuIn => PubOrSub::Publish,
                    MappingDirection::FmuOut => PubOrSub::Subscribe,
                };
                signals.push((entry.topic.clone(), entry.type_name.clone(), direction));
            }
        }

        for (topic_name, type_name, direction) in signals {
            let message_type = mapper.idl_context().structure(&type_name)?.clone();
            let wire_type = self.converter.create_builder(&message_type)?;

            let mut skip_register = self.topic_to_type.contains_key(&topic_name);
            if !skip_register && self.types.contains_key(&type_name) {
                self.topic_to_type
                    .insert(topic_name.clone(), type_name.clone());
                skip_register = true;
            }
            if !skip_register {
                let mut support = WirePubSubType::new(wire_type);
                support.set_name(crate::convert::convert_type_name(&type_name));
                // Type object propagation breaks peers on unions and
                // enums, so both auto-fill switches stay off.
                support.set_options(TypeSupportOptions {
                    auto_fill_type_information: false,
                    auto_fill_type_object: false,
                });
                let support = Arc::new(support);
                self.types.insert(type_name.clone(), support.clone());
                self.topic_to_type
                    .insert(topic_name.clone(), type_name.clone());
                if participant.find_type(support.name()).is_none() {
                    participant.register_type(support.clone());
                }
                self.converter.register_type(&type_name, support.clone());
                self.converter
                    .register_xtype(&type_name, message_type.clone());
            }

            let support = self
                .types
                .get(self.topic_to_type.get(&topic_name).unwrap_or(&type_name))
                .cloned()
                .ok_or_else(|| {
                    FmuError::Config(format!("no type support for topic '{}'", topic_name))
                })?;

            let topic = match participant.lookup_topicdescription(&topic_name) {
                Some(existing) => existing,
                None => match participant.create_topic_with_profile(
                    &topic_name,
                    support.name(),
                    &topic_name,
                ) {
                    Ok(topic) => topic,
                    Err(_) => {
                        debug!(
                            "no topic profile for '{}', using default topic QoS",
                            topic_name
                        );
                        participant
                            .create_topic(&topic_name, support.name(), Default::default())
                            .map_err(|e| {
                                FmuError::Config(format!(
                                    "unable to create topic: {} of type {}: {}",
                                    topic_name, type_name, e
                                ))
                            })?
                    }
                },
            };
            self.topics.push(topic.clone());

            let wire_buffer = support.create_data();

            match direction {
                PubOrSub::Publish => {
                    let writer = publisher
                        .create_datawriter_with_profile(&topic, &topic_name)
                        .map_err(|e| {
                            FmuError::Config(format!(
                                "unable to create DataWriter for topic: {}: {}",
                                type_name, e
                            ))
                        })?;
                    self.write_data.push((writer, topic_name.clone(), wire_buffer));
                }
                PubOrSub::Subscribe => {
                    // Key filtering applies when the user requested it in
                    // the mapping (a Parameter buffer exists) and the type
                    // actually has at least one @key leaf.
                    let need_filter = mapper.has_data(&topic_name, Direction::Parameter)
                        && has_key_leaf(&message_type);

                    let reader = if need_filter {
                        let filter_topic = participant
                            .create_contentfilteredtopic(
                                &format!("{}Filtered", topic_name),
                                &topic,
                                " ",
                                vec![GUID_UNKNOWN.to_string(), "0".to_string()],
                                CUSTOM_KEY_FILTER,
                            )
                            .map_err(|e| {
                                FmuError::Config(format!(
                                    "unable to create filtered topic for: {}: {}",
                                    type_name, e
                                ))
                            })?;
                        let reader = subscriber
                            .create_filtered_datareader_with_profile(&filter_topic, &topic_name)
                            .map_err(|e| {
                                FmuError::Config(format!(
                                    "unable to create DataReader for topic: {}: {}",
                                    type_name, e
                                ))
                            })?;
                        self.reader_topic_filter.push((reader.clone(), filter_topic));
                        reader
                    } else {
                        subscriber
                            .create_datareader_with_profile(&topic, &topic_name)
                            .map_err(|e| {
                                FmuError::Config(format!(
                                    "unable to create DataReader for topic: {}: {}",
                                    type_name, e
                                ))
                            })?
                    };
                    self.read_data.push((reader, topic_name.clone(), wire_buffer));
                }
            }
        }

        self.participant = Some(participant);
        self.publisher = Some(publisher);
        self.subscriber = Some(subscriber);
        Ok(())
    }

    /// Publish every FMU input buffer.
    pub fn write(&mut self, mapper: &DataMapper) -> Result<()> {
        for (writer, topic, wire_buffer) in &mut self.write_data {
            let data = mapper.data_ref(topic, Direction::Write)?;
            self.converter.xtypes_to_wire(data, wire_buffer)?;
            writer.write(wire_buffer)?;
        }
        Ok(())
    }

    /// Drain every subscription into its FMU output buffer; within one
    /// call the newest sample wins.
    pub fn take(&mut self, mapper: &mut DataMapper) -> Result<()> {
        for (reader, topic, wire_buffer) in &mut self.read_data {
            while reader.take_next_sample(wire_buffer)?.is_some() {
                let output = mapper.data_ref_mut(topic, Direction::Read)?;
                self.converter.wire_to_xtypes(wire_buffer, output)?;
            }
        }
        Ok(())
    }

    /// Install the real reader GUIDs and current key parameter values on
    /// every filtered topic.
    ///
    /// Runs at the end of initialization mode, after the master had the
    /// chance to set key parameters through `Set*`.
    pub fn init_key_filters(&self, mapper: &DataMapper) -> Result<()> {
        for (reader, filter_topic) in &self.reader_topic_filter {
            let mut parameters = vec![reader.guid().to_string()];
            let parameter_data = mapper.data_ref(reader.topic_name(), Direction::Parameter)?;
            let ty = parameter_data.ty().clone();
            let mut failure: Option<FmuError> = None;
            for_each_leaf(&ty, |leaf| {
                if failure.is_some() {
                    return;
                }
                let supported =
                    leaf.ty.is_primitive() || leaf.ty.is_enumerated() || leaf.ty.is_string();
                if !supported || !leaf.is_key() {
                    return;
                }
                match parameter_data.leaf(&leaf.path) {
                    Ok(value) => match key_parameter_text(value) {
                        Some(text) => parameters.push(text),
                        None => {
                            failure = Some(FmuError::Config(
                                "tried to set parameter of unsupported kind".into(),
                            ));
                        }
                    },
                    Err(e) => failure = Some(e.into()),
                }
            });
            if let Some(e) = failure {
                return Err(e);
            }
            filter_topic.set_expression_parameters(parameters)?;
        }
        Ok(())
    }

    /// The converter context shared with the key filter factory.
    pub fn converter(&self) -> &Arc<Converter> {
        &self.converter
    }
}

impl Drop for DynamicPubSub {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Canonical textual form of a key leaf value.
fn key_parameter_text(value: &Value) -> Option<String> {
    Some(match value {
        Value::Bool(v) => v.to_string(),
        Value::Char(c) => c.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::F32(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Str(s) => s.clone(),
        Value::Enum(v) => v.to_string(),
        _ => return None,
    })
}

fn has_key_leaf(ty: &Arc<DynamicType>) -> bool {
    let mut found = false;
    for_each_leaf(ty, |leaf| {
        let supported = leaf.ty.is_primitive() || leaf.ty.is_enumerated() || leaf.ty.is_string();
        if supported && leaf.is_key() {
            found = true;
        }
    });
    if !found {
        warn!("no @key leaves found on {}", ty.name());
    }
    found
}
