// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Type support: the serialization contract a wire type registers with the
//! participant.

use std::sync::Arc;

use super::cdr::{decode_wire, encode_wire, WireCdrError};
use super::data::WireData;
use super::types::WireType;

/// A serialized sample as it travels on the bus.
#[derive(Debug, Clone, Default)]
pub struct SerializedPayload {
    pub data: Vec<u8>,
}

impl SerializedPayload {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Registration options for a wire type.
///
/// `auto_fill_type_object` is disabled by the pub/sub layer when
/// registering dynamic types; propagating full type objects breaks peers on
/// unions and enums.
#[derive(Debug, Clone, Copy)]
pub struct TypeSupportOptions {
    pub auto_fill_type_information: bool,
    pub auto_fill_type_object: bool,
}

impl Default for TypeSupportOptions {
    fn default() -> Self {
        Self {
            auto_fill_type_information: true,
            auto_fill_type_object: true,
        }
    }
}

/// Serialization support for one wire type.
#[derive(Debug, Clone)]
pub struct WirePubSubType {
    name: String,
    ty: Arc<WireType>,
    options: TypeSupportOptions,
}

impl WirePubSubType {
    pub fn new(ty: Arc<WireType>) -> Self {
        let name = ty.name.clone();
        Self {
            name,
            ty,
            options: TypeSupportOptions::default(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wire_type(&self) -> &Arc<WireType> {
        &self.ty
    }

    pub fn set_options(&mut self, options: TypeSupportOptions) {
        self.options = options;
    }

    pub fn options(&self) -> TypeSupportOptions {
        self.options
    }

    /// Allocate a default-initialized buffer of this type.
    pub fn create_data(&self) -> WireData {
        WireData::new(&self.ty)
    }

    pub fn serialize(&self, data: &WireData) -> Result<SerializedPayload, WireCdrError> {
        Ok(SerializedPayload {
            data: encode_wire(data)?,
        })
    }

    /// Non-destructive deserialization into an existing buffer.
    pub fn deserialize(
        &self,
        payload: &SerializedPayload,
        data: &mut WireData,
    ) -> Result<(), WireCdrError> {
        let decoded = decode_wire(&payload.data, &self.ty)?;
        data.set_value(decoded.value().clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::types::{WireKind, WireMember};
    use crate::dynamic::WireValue;

    #[test]
    fn serialize_deserialize_through_support() {
        let ty = Arc::new(WireType::new(
            "T",
            WireKind::Struct(vec![WireMember {
                name: "v".into(),
                ty: Arc::new(WireType::new("double", WireKind::F64)),
                is_key: false,
            }]),
        ));
        let support = WirePubSubType::new(ty);
        let mut out = support.create_data();
        out.set_value(WireValue::Struct(vec![WireValue::F64(3.25)]));
        let payload = support.serialize(&out).expect("serialize");
        let mut back = support.create_data();
        support.deserialize(&payload, &mut back).expect("deserialize");
        assert_eq!(back.value(), out.value());
    }
}
