// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Wire data buffers.

use std::sync::Arc;

use super::types::{WireKind, WireType};

/// A wire value node.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Bool(bool),
    /// char8 on the wire.
    Char(u8),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    Enum(u32),
    /// Positional member values.
    Struct(Vec<WireValue>),
    /// Flattened elements, row-major over the declared extents.
    Array(Vec<WireValue>),
    Union {
        discriminator: i64,
        case: usize,
        value: Box<WireValue>,
    },
}

/// A wire data buffer with its type, default-initialized on allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct WireData {
    ty: Arc<WireType>,
    value: WireValue,
}

impl WireData {
    pub fn new(ty: &Arc<WireType>) -> Self {
        Self {
            ty: ty.clone(),
            value: default_wire_value(ty),
        }
    }

    pub fn ty(&self) -> &Arc<WireType> {
        &self.ty
    }

    pub fn value(&self) -> &WireValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut WireValue {
        &mut self.value
    }

    pub fn set_value(&mut self, value: WireValue) {
        self.value = value;
    }
}

pub(crate) fn default_wire_value(ty: &WireType) -> WireValue {
    match &ty.kind {
        WireKind::Bool => WireValue::Bool(false),
        WireKind::Char => WireValue::Char(0),
        WireKind::I8 => WireValue::I8(0),
        WireKind::U8 => WireValue::U8(0),
        WireKind::I16 => WireValue::I16(0),
        WireKind::U16 => WireValue::U16(0),
        WireKind::I32 => WireValue::I32(0),
        WireKind::U32 => WireValue::U32(0),
        WireKind::I64 => WireValue::I64(0),
        WireKind::U64 => WireValue::U64(0),
        WireKind::F32 => WireValue::F32(0.0),
        WireKind::F64 => WireValue::F64(0.0),
        WireKind::Str { .. } => WireValue::Str(String::new()),
        WireKind::Enum(literals) => WireValue::Enum(literals.first().map_or(0, |l| l.value)),
        WireKind::Struct(members) => {
            WireValue::Struct(members.iter().map(|m| default_wire_value(&m.ty)).collect())
        }
        WireKind::Array { element, dims } => {
            let elem = default_wire_value(element);
            WireValue::Array(vec![elem; WireType::flat_len(dims)])
        }
        WireKind::Union { cases, .. } => match cases.first() {
            Some(case) => WireValue::Union {
                discriminator: case.labels.first().copied().unwrap_or(0),
                case: 0,
                value: Box::new(default_wire_value(&case.ty)),
            },
            None => WireValue::Union {
                discriminator: 0,
                case: 0,
                value: Box::new(WireValue::I32(0)),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::types::WireMember;

    #[test]
    fn default_struct_is_zeroed() {
        let ty = Arc::new(WireType::new(
            "P",
            WireKind::Struct(vec![
                WireMember {
                    name: "x".into(),
                    ty: Arc::new(WireType::new("double", WireKind::F64)),
                    is_key: false,
                },
                WireMember {
                    name: "n".into(),
                    ty: Arc::new(WireType::new("string", WireKind::Str { bound: None })),
                    is_key: false,
                },
            ]),
        ));
        let data = WireData::new(&ty);
        assert_eq!(
            data.value(),
            &WireValue::Struct(vec![WireValue::F64(0.0), WireValue::Str(String::new())])
        );
    }

    #[test]
    fn default_array_is_flattened() {
        let ty = Arc::new(WireType::new(
            "M",
            WireKind::Array {
                element: Arc::new(WireType::new("uint32", WireKind::U32)),
                dims: vec![3, 2],
            },
        ));
        let data = WireData::new(&ty);
        let WireValue::Array(elems) = data.value() else {
            panic!("expected array");
        };
        assert_eq!(elems.len(), 6);
    }
}
