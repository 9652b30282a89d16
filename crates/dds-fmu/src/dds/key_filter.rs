// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Key-based content filter.
//!
//! A reader enrolled with this filter only receives samples whose `@key`
//! members equal a prefigured reference instance. The reference values
//! arrive as expression parameters: index 0 is the reader GUID, indices
//! `1..=key_count` are the key values in depth-first key-member order,
//! serialized to text.
//!
//! `evaluate` is invoked on the delivery path and must never escape a
//! failure: a sample that cannot be deserialized, converted or compared is
//! rejected, nothing more.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error};
use parking_lot::{Mutex, RwLock};

use super::filter::{ContentFilter, ContentFilterFactory, FilterSampleInfo};
use super::{DdsError, Guid};
use crate::convert::Converter;
use crate::dynamic::{SerializedPayload, WireData, WirePubSubType};
use crate::xtypes::{for_each_leaf, DynamicData, MemberPath, Value};

/// Filter class name the factory answers to.
pub const CUSTOM_KEY_FILTER: &str = "CUSTOM_KEY_FILTER";

/// Placeholder GUID used when a filtered topic is created before its
/// reader exists.
pub const GUID_UNKNOWN: &str = "|GUID UNKNOWN|";

/// Per-reader filter state.
struct FilterMemberType {
    /// Wire type support used for non-destructive deserialization.
    support: Arc<WirePubSubType>,
    /// Scratch wire buffer for decoded payloads.
    wire_scratch: Mutex<WireData>,
    /// Scratch structured buffer for converted samples.
    sample_scratch: Mutex<DynamicData>,
    /// The reference values the keys must equal.
    key_data: DynamicData,
    /// Paths of the `@key` leaves, in traversal order.
    key_paths: Vec<MemberPath>,
}

/// The filter: a map from reader GUID to its key reference state.
pub struct CustomKeyFilter {
    converter: Arc<Converter>,
    member_types: RwLock<HashMap<String, FilterMemberType>>,
}

impl CustomKeyFilter {
    pub fn new(converter: Arc<Converter>) -> Self {
        Self {
            converter,
            member_types: RwLock::new(HashMap::new()),
        }
    }

    /// Whether a reader is already enrolled.
    pub fn has_reader_guid(&self, guid: &str) -> bool {
        self.member_types.read().contains_key(guid)
    }

    /// Number of enrolled readers.
    pub fn reader_count(&self) -> usize {
        self.member_types.read().len()
    }

    /// Enroll (or re-enroll) a reader from an expression parameter list.
    ///
    /// Returns `Ok(false)` without registering when the GUID placeholder
    /// is present: the reader will be enrolled later, once its real GUID
    /// is known. Parameters must provide one value per `@key` leaf; the
    /// values are parsed by the leaf kind.
    pub fn add_type(
        &self,
        support: &Arc<WirePubSubType>,
        type_name: &str,
        parameters: &[String],
    ) -> Result<bool, DdsError> {
        let Some(guid) = parameters.first() else {
            return Err(DdsError::FilterParameter(
                "empty expression parameter sequence".into(),
            ));
        };
        if guid == GUID_UNKNOWN {
            return Ok(false);
        }
        if self.has_reader_guid(guid) {
            debug!("re-registering key filter for reader GUID '{}'", guid);
        }

        let mut key_data = self
            .converter
            .dynamic_data(type_name)
            .map_err(|e| DdsError::FilterParameter(e.to_string()))?;

        let key_type = key_data.ty().clone();
        let mut key_paths = Vec::new();
        for_each_leaf(&key_type, |leaf| {
            let supported =
                leaf.ty.is_primitive() || leaf.ty.is_enumerated() || leaf.ty.is_string();
            if supported && leaf.is_key() {
                key_paths.push(leaf.path.clone());
            }
        });

        if parameters.len() < key_paths.len() + 1 {
            return Err(DdsError::FilterParameter(format!(
                "{} has more @key members than parameter data provided",
                type_name
            )));
        }
        for (path, text) in key_paths.iter().zip(&parameters[1..]) {
            let leaf = key_data
                .leaf_mut(path)
                .map_err(|e| DdsError::FilterParameter(e.to_string()))?;
            *leaf = parse_key_value(leaf, text)?;
        }

        let member = FilterMemberType {
            support: support.clone(),
            wire_scratch: Mutex::new(support.create_data()),
            sample_scratch: Mutex::new(
                self.converter
                    .dynamic_data(type_name)
                    .map_err(|e| DdsError::FilterParameter(e.to_string()))?,
            ),
            key_data,
            key_paths,
        };
        self.member_types
            .write()
            .insert(guid.clone(), member);
        debug!("registered key filter for reader GUID '{}'", guid);
        Ok(true)
    }
}

impl ContentFilter for CustomKeyFilter {
    fn evaluate(
        &self,
        payload: &SerializedPayload,
        _info: &FilterSampleInfo,
        reader_guid: &Guid,
    ) -> bool {
        let members = self.member_types.read();
        // An unregistered reader is simply irrelevant to this filter.
        let Some(member) = members.get(&reader_guid.to_string()) else {
            return false;
        };

        // The payload must stay intact for other readers.
        let payload_copy = payload.clone();
        let mut wire = member.wire_scratch.lock();
        if let Err(e) = member.support.deserialize(&payload_copy, &mut wire) {
            error!("could not deserialize payload to dynamic type: {}", e);
            return false;
        }
        let mut sample = member.sample_scratch.lock();
        if self.converter.wire_to_xtypes(&wire, &mut sample).is_err() {
            return false;
        }

        // Pairwise key comparison in traversal order.
        for path in &member.key_paths {
            match (sample.leaf(path), member.key_data.leaf(path)) {
                (Ok(a), Ok(b)) if a == b => {}
                _ => return false,
            }
        }
        true
    }
}

/// Parse one textual key value by the kind of the leaf it replaces.
fn parse_key_value(current: &Value, text: &str) -> Result<Value, DdsError> {
    let bad = |what: &str| {
        DdsError::FilterParameter(format!("cannot parse '{}' as {}", text, what))
    };
    Ok(match current {
        Value::Bool(_) => Value::Bool(match text {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(bad("boolean")),
        }),
        Value::Char(_) => Value::Char(text.chars().next().ok_or_else(|| bad("char"))?),
        Value::I8(_) => Value::I8(text.parse().map_err(|_| bad("int8"))?),
        Value::U8(_) => Value::U8(text.parse().map_err(|_| bad("uint8"))?),
        Value::I16(_) => Value::I16(text.parse().map_err(|_| bad("int16"))?),
        Value::U16(_) => Value::U16(text.parse().map_err(|_| bad("uint16"))?),
        Value::I32(_) => Value::I32(text.parse().map_err(|_| bad("int32"))?),
        Value::U32(_) => Value::U32(text.parse().map_err(|_| bad("uint32"))?),
        Value::I64(_) => Value::I64(text.parse().map_err(|_| bad("int64"))?),
        Value::U64(_) => Value::U64(text.parse().map_err(|_| bad("uint64"))?),
        Value::F32(_) => Value::F32(text.parse().map_err(|_| bad("float"))?),
        Value::F64(_) => Value::F64(text.parse().map_err(|_| bad("double"))?),
        Value::Str(_) => Value::Str(text.to_string()),
        Value::Enum(_) => Value::Enum(text.parse().map_err(|_| bad("enumerator"))?),
        _ => {
            return Err(DdsError::FilterParameter(
                "tried to set parameter of unsupported kind".into(),
            ))
        }
    })
}

/// Factory for [`CustomKeyFilter`], registered on the participant.
///
/// Hands out one shared filter instance; repeated creation calls (topic
/// creation, parameter updates) only adjust registrations. A reader that
/// is already enrolled is not re-parsed unless its parameters actually
/// change through [`CustomKeyFilter::add_type`]'s insert-or-assign.
pub struct KeyFilterFactory {
    filter: Arc<CustomKeyFilter>,
}

impl KeyFilterFactory {
    pub fn new(converter: Arc<Converter>) -> Self {
        Self {
            filter: Arc::new(CustomKeyFilter::new(converter)),
        }
    }

    pub fn filter(&self) -> &Arc<CustomKeyFilter> {
        &self.filter
    }
}

impl ContentFilterFactory for KeyFilterFactory {
    fn create_content_filter(
        &self,
        filter_class_name: &str,
        type_name: &str,
        type_support: &Arc<WirePubSubType>,
        expression_parameters: &[String],
    ) -> Result<Arc<dyn ContentFilter>, DdsError> {
        if filter_class_name != CUSTOM_KEY_FILTER {
            return Err(DdsError::FilterClass(filter_class_name.to_string()));
        }
        if expression_parameters.is_empty() {
            return Err(DdsError::FilterParameter(
                "empty expression parameter sequence".into(),
            ));
        }
        self.filter
            .add_type(type_support, type_name, expression_parameters)?;
        Ok(self.filter.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::parse_idl;

    const IDL: &str = r#"
        enum Color { ALPHA, BETA };
        struct Signal {
          @key Color color;
          @key uint32 source;
          double strength;
        };
    "#;

    fn setup() -> (Arc<Converter>, Arc<WirePubSubType>, CustomKeyFilter) {
        let ctx = parse_idl(IDL).expect("parse");
        let ty = ctx.structure("Signal").expect("type").clone();
        let converter = Arc::new(Converter::new());
        let wire_ty = converter.create_builder(&ty).expect("builder");
        converter.register_xtype("Signal", ty);
        let support = Arc::new(WirePubSubType::new(wire_ty));
        converter.register_type("Signal", support.clone());
        let filter = CustomKeyFilter::new(converter.clone());
        (converter, support, filter)
    }

    fn sample_payload(
        converter: &Converter,
        support: &Arc<WirePubSubType>,
        color: u32,
        source: u32,
        strength: f64,
    ) -> SerializedPayload {
        use crate::xtypes::PathStep;
        let mut data = converter.dynamic_data("Signal").expect("data");
        *data.leaf_mut(&[PathStep::Field(0)]).unwrap() = Value::Enum(color);
        *data.leaf_mut(&[PathStep::Field(1)]).unwrap() = Value::U32(source);
        *data.leaf_mut(&[PathStep::Field(2)]).unwrap() = Value::F64(strength);
        let mut wire = support.create_data();
        converter.xtypes_to_wire(&data, &mut wire).expect("to wire");
        support.serialize(&wire).expect("serialize")
    }

    fn guid() -> Guid {
        Guid::new([0; 12], 7)
    }

    #[test]
    fn unknown_guid_placeholder_skips_registration() {
        let (_, support, filter) = setup();
        let registered = filter
            .add_type(&support, "Signal", &[GUID_UNKNOWN.to_string(), "0".into()])
            .expect("add_type");
        assert!(!registered);
        assert_eq!(filter.reader_count(), 0);
    }

    #[test]
    fn matching_keys_admit_sample() {
        let (converter, support, filter) = setup();
        let reader = guid();
        filter
            .add_type(
                &support,
                "Signal",
                &[reader.to_string(), "1".into(), "42".into()],
            )
            .expect("add_type");

        let matching = sample_payload(&converter, &support, 1, 42, 0.5);
        let wrong_color = sample_payload(&converter, &support, 0, 42, 0.5);
        let wrong_source = sample_payload(&converter, &support, 1, 43, 0.5);
        let info = FilterSampleInfo::default();
        assert!(filter.evaluate(&matching, &info, &reader));
        assert!(!filter.evaluate(&wrong_color, &info, &reader));
        assert!(!filter.evaluate(&wrong_source, &info, &reader));
    }

    #[test]
    fn unknown_reader_rejects() {
        let (converter, support, filter) = setup();
        let payload = sample_payload(&converter, &support, 0, 0, 0.0);
        assert!(!filter.evaluate(&payload, &FilterSampleInfo::default(), &guid()));
    }

    #[test]
    fn garbage_payload_rejects() {
        let (_, support, filter) = setup();
        let reader = guid();
        filter
            .add_type(
                &support,
                "Signal",
                &[reader.to_string(), "0".into(), "0".into()],
            )
            .expect("add_type");
        let garbage = SerializedPayload { data: vec![0xff, 0x01] };
        assert!(!filter.evaluate(&garbage, &FilterSampleInfo::default(), &reader));
    }

    #[test]
    fn too_few_parameters_is_fatal() {
        let (_, support, filter) = setup();
        let result = filter.add_type(&support, "Signal", &[guid().to_string(), "1".into()]);
        assert!(result.is_err());
    }

    #[test]
    fn reassignment_replaces_keys() {
        let (converter, support, filter) = setup();
        let reader = guid();
        let params = |c: &str| vec![reader.to_string(), c.to_string(), "42".into()];
        filter.add_type(&support, "Signal", &params("0")).unwrap();
        let beta = sample_payload(&converter, &support, 1, 42, 0.0);
        assert!(!filter.evaluate(&beta, &FilterSampleInfo::default(), &reader));
        filter.add_type(&support, "Signal", &params("1")).unwrap();
        assert!(filter.evaluate(&beta, &FilterSampleInfo::default(), &reader));
    }
}
