// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Conversion between structured data and the wire representation.
//!
//! The converter owns three registries keyed by type name: structured
//! types, wire type supports, and cached wire builders. They are an
//! injected context owned by the pub/sub layer rather than process-wide
//! state; the only hard requirement is that they outlive every wire buffer
//! built from them, which [`crate::pubsub::DynamicPubSub`] guarantees by
//! clearing them before the participant goes away.

mod builder;
mod copy;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dynamic::{WireData, WirePubSubType, WireType};
use crate::xtypes::{DynamicData, DynamicType};

pub use builder::convert_type_name;

/// Errors from type or data conversion.
#[derive(Debug)]
pub enum ConvertError {
    /// The type kind has no wire counterpart (sequence, map, wstring,
    /// float128, wchar).
    UnsupportedKind { type_name: String, detail: String },
    /// A type name lookup in the registries failed.
    NotRegistered(String),
    /// Structural mismatch while copying values.
    Shape(String),
    /// A dotted member path did not resolve.
    BadPath(String),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedKind { type_name, detail } => {
                write!(f, "unsupported type kind in '{}': {}", type_name, detail)
            }
            Self::NotRegistered(name) => write!(f, "type not registered: {}", name),
            Self::Shape(msg) => write!(f, "value shape mismatch: {}", msg),
            Self::BadPath(path) => write!(f, "member path does not resolve: {}", path),
        }
    }
}

impl std::error::Error for ConvertError {}

/// Registries and conversion entry points.
#[derive(Default)]
pub struct Converter {
    xtypes: Mutex<HashMap<String, Arc<DynamicType>>>,
    supports: Mutex<HashMap<String, Arc<WirePubSubType>>>,
    builders: Mutex<HashMap<String, Arc<WireType>>>,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a structured type under a (patched) type name.
    pub fn register_xtype(&self, type_name: &str, ty: Arc<DynamicType>) {
        self.xtypes
            .lock()
            .insert(convert_type_name(type_name), ty);
    }

    /// Register a wire type support under a (patched) type name.
    pub fn register_type(&self, type_name: &str, support: Arc<WirePubSubType>) {
        self.supports
            .lock()
            .insert(convert_type_name(type_name), support);
    }

    /// Allocate a structured data buffer for a registered type name.
    pub fn dynamic_data(&self, type_name: &str) -> Result<DynamicData, ConvertError> {
        let key = convert_type_name(type_name);
        let types = self.xtypes.lock();
        let ty = types
            .get(&key)
            .ok_or_else(|| ConvertError::NotRegistered(key.clone()))?;
        Ok(DynamicData::new(ty))
    }

    /// Look up a registered wire type support.
    pub fn support(&self, type_name: &str) -> Result<Arc<WirePubSubType>, ConvertError> {
        let key = convert_type_name(type_name);
        self.supports
            .lock()
            .get(&key)
            .cloned()
            .ok_or(ConvertError::NotRegistered(key))
    }

    /// Build (or fetch the cached) wire type for a structured type.
    ///
    /// An unsupported kind anywhere in the tree fails the whole build;
    /// callers must treat that as fatal for the requesting topic.
    pub fn create_builder(&self, ty: &DynamicType) -> Result<Arc<WireType>, ConvertError> {
        let key = convert_type_name(ty.name());
        if let Some(cached) = self.builders.lock().get(&key) {
            return Ok(cached.clone());
        }
        let built = Arc::new(builder::build_wire_type(ty)?);
        self.builders.lock().insert(key, built.clone());
        Ok(built)
    }

    /// Copy a structured buffer into a wire buffer.
    pub fn xtypes_to_wire(
        &self,
        input: &DynamicData,
        output: &mut WireData,
    ) -> Result<(), ConvertError> {
        copy::xtypes_to_wire(input, output)
    }

    /// Copy a wire buffer into a structured buffer.
    pub fn wire_to_xtypes(
        &self,
        input: &WireData,
        output: &mut DynamicData,
    ) -> Result<(), ConvertError> {
        copy::wire_to_xtypes(input, output)
    }

    /// Empty all three registries.
    ///
    /// Must run before the participant is torn down so no endpoint ever
    /// observes a stale wire type.
    pub fn clear_data_structures(&self) {
        self.builders.lock().clear();
        self.supports.lock().clear();
        self.xtypes.lock().clear();
    }
}

/// Walk a dotted member path through a structured type and return the
/// nested member type.
pub fn resolve_discriminator_type(
    ty: &Arc<DynamicType>,
    path: &str,
) -> Result<Arc<DynamicType>, ConvertError> {
    let mut current = ty.clone();
    for part in path.split('.') {
        let next = match current.resolved() {
            DynamicType::Struct(s) => s
                .member(part)
                .map(|m| m.ty.clone())
                .ok_or_else(|| ConvertError::BadPath(path.to_string()))?,
            _ => return Err(ConvertError::BadPath(path.to_string())),
        };
        current = next;
    }
    Ok(current)
}

/// Walk a dotted member path through writable structured data and return
/// the leaf value.
pub fn access_member_data<'a>(
    data: &'a mut DynamicData,
    path: &str,
) -> Result<&'a mut crate::xtypes::Value, ConvertError> {
    use crate::xtypes::PathStep;
    let mut steps = Vec::new();
    let mut ty = data.ty().clone();
    for part in path.split('.') {
        match ty.resolved() {
            DynamicType::Struct(s) => {
                let idx = s
                    .member_index(part)
                    .ok_or_else(|| ConvertError::BadPath(path.to_string()))?;
                let member_ty = s.members[idx].ty.clone();
                steps.push(PathStep::Field(idx));
                ty = member_ty;
            }
            _ => return Err(ConvertError::BadPath(path.to_string())),
        }
    }
    data.leaf_mut(&steps)
        .map_err(|_| ConvertError::BadPath(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xtypes::{Member, PrimitiveKind, StructType, Value};

    fn nested_type() -> Arc<DynamicType> {
        let inner = Arc::new(DynamicType::Struct(StructType {
            name: "Inner".into(),
            members: vec![Member::new(
                "depth",
                Arc::new(DynamicType::Primitive(PrimitiveKind::F64)),
            )],
        }));
        Arc::new(DynamicType::Struct(StructType {
            name: "Outer".into(),
            members: vec![Member::new("inner", inner)],
        }))
    }

    #[test]
    fn discriminator_path_resolution() {
        let ty = nested_type();
        let leaf = resolve_discriminator_type(&ty, "inner.depth").expect("resolve");
        assert_eq!(leaf.resolved().name(), "double");
        assert!(resolve_discriminator_type(&ty, "inner.missing").is_err());
    }

    #[test]
    fn member_access_by_path() {
        let ty = nested_type();
        let mut data = DynamicData::new(&ty);
        *access_member_data(&mut data, "inner.depth").expect("access") = Value::F64(4.5);
        assert_eq!(
            access_member_data(&mut data, "inner.depth").expect("access"),
            &mut Value::F64(4.5)
        );
    }

    #[test]
    fn registry_roundtrip_and_clear() {
        let conv = Converter::new();
        let ty = nested_type();
        conv.register_xtype("Outer", ty.clone());
        assert!(conv.dynamic_data("Outer").is_ok());
        conv.clear_data_structures();
        assert!(conv.dynamic_data("Outer").is_err());
    }

    #[test]
    fn slash_names_are_patched() {
        let conv = Converter::new();
        conv.register_xtype("rt/msg/Pose", nested_type());
        assert!(conv.dynamic_data("rt/msg/Pose").is_ok());
        assert!(conv.dynamic_data("rt__msg__Pose").is_ok());
    }
}
