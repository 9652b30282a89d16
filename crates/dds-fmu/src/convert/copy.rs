// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Depth-first value copies between the structured and wire buffers.

use super::ConvertError;
use crate::dynamic::{WireData, WireKind, WireValue};
use crate::xtypes::{DynamicData, DynamicType, Value};

fn shape(msg: impl Into<String>) -> ConvertError {
    ConvertError::Shape(msg.into())
}

/// Copy a structured buffer into a wire buffer.
pub(super) fn xtypes_to_wire(
    input: &DynamicData,
    output: &mut WireData,
) -> Result<(), ConvertError> {
    let ty = output.ty().clone();
    let converted = to_wire_value(input.value(), input.ty().resolved(), &ty.kind)?;
    output.set_value(converted);
    Ok(())
}

/// Copy a wire buffer into a structured buffer.
pub(super) fn wire_to_xtypes(
    input: &WireData,
    output: &mut DynamicData,
) -> Result<(), ConvertError> {
    let ty = output.ty().clone();
    let converted = to_xtypes_value(input.value(), &input.ty().kind, ty.resolved())?;
    *output.value_mut() = converted;
    Ok(())
}

fn to_wire_value(
    value: &Value,
    ty: &DynamicType,
    wire: &WireKind,
) -> Result<WireValue, ConvertError> {
    match (wire, value) {
        (WireKind::Bool, Value::Bool(v)) => Ok(WireValue::Bool(*v)),
        (WireKind::Char, Value::Char(v)) => Ok(WireValue::Char(*v as u8)),
        (WireKind::I8, Value::I8(v)) => Ok(WireValue::I8(*v)),
        (WireKind::U8, Value::U8(v)) => Ok(WireValue::U8(*v)),
        (WireKind::I16, Value::I16(v)) => Ok(WireValue::I16(*v)),
        (WireKind::U16, Value::U16(v)) => Ok(WireValue::U16(*v)),
        (WireKind::I32, Value::I32(v)) => Ok(WireValue::I32(*v)),
        (WireKind::U32, Value::U32(v)) => Ok(WireValue::U32(*v)),
        (WireKind::I64, Value::I64(v)) => Ok(WireValue::I64(*v)),
        (WireKind::U64, Value::U64(v)) => Ok(WireValue::U64(*v)),
        (WireKind::F32, Value::F32(v)) => Ok(WireValue::F32(*v)),
        (WireKind::F64, Value::F64(v)) => Ok(WireValue::F64(*v)),
        (WireKind::Str { .. }, Value::Str(s)) => Ok(WireValue::Str(s.clone())),
        (WireKind::Enum(_), Value::Enum(v)) => Ok(WireValue::Enum(*v)),
        (WireKind::Struct(wire_members), Value::Struct(values)) => {
            let DynamicType::Struct(s) = ty else {
                return Err(shape(format!("expected struct type, got {}", ty.name())));
            };
            if wire_members.len() != values.len() || s.members.len() != values.len() {
                return Err(shape(format!("struct arity mismatch in {}", s.name)));
            }
            let mut out = Vec::with_capacity(values.len());
            for ((wm, m), v) in wire_members.iter().zip(&s.members).zip(values) {
                out.push(to_wire_value(v, m.ty.resolved(), &wm.ty.kind)?);
            }
            Ok(WireValue::Struct(out))
        }
        (WireKind::Array { element, dims }, Value::Array(_)) => {
            // Flatten the nested structured array into the wire layout.
            let mut flat = Vec::new();
            collect_flat(value, dims.len(), &mut flat)?;
            let elem_ty = array_element_type(ty, dims.len())?;
            let mut out = Vec::with_capacity(flat.len());
            for v in flat {
                out.push(to_wire_value(v, elem_ty, &element.kind)?);
            }
            Ok(WireValue::Array(out))
        }
        (
            WireKind::Union { cases, .. },
            Value::Union { discriminator, value, .. },
        ) => {
            let DynamicType::Union(u) = ty else {
                return Err(shape(format!("expected union type, got {}", ty.name())));
            };
            let (case_idx, wire_case) = WireKind::union_case_by_discriminator(cases, *discriminator)
                .ok_or_else(|| shape(format!("no wire case for discriminator {}", discriminator)))?;
            let (_, x_case) = u
                .case_by_discriminator(*discriminator)
                .ok_or_else(|| shape(format!("no case for discriminator {}", discriminator)))?;
            let inner = to_wire_value(value, x_case.ty.resolved(), &wire_case.ty.kind)?;
            Ok(WireValue::Union {
                discriminator: *discriminator,
                case: case_idx,
                value: Box::new(inner),
            })
        }
        (wire, value) => Err(shape(format!(
            "cannot convert {:?} into wire kind {:?}",
            std::mem::discriminant(value),
            std::mem::discriminant(wire)
        ))),
    }
}

fn to_xtypes_value(
    value: &WireValue,
    wire: &WireKind,
    ty: &DynamicType,
) -> Result<Value, ConvertError> {
    match (wire, value) {
        (WireKind::Bool, WireValue::Bool(v)) => Ok(Value::Bool(*v)),
        (WireKind::Char, WireValue::Char(v)) => Ok(Value::Char(*v as char)),
        (WireKind::I8, WireValue::I8(v)) => Ok(Value::I8(*v)),
        (WireKind::U8, WireValue::U8(v)) => Ok(Value::U8(*v)),
        (WireKind::I16, WireValue::I16(v)) => Ok(Value::I16(*v)),
        (WireKind::U16, WireValue::U16(v)) => Ok(Value::U16(*v)),
        (WireKind::I32, WireValue::I32(v)) => Ok(Value::I32(*v)),
        (WireKind::U32, WireValue::U32(v)) => Ok(Value::U32(*v)),
        (WireKind::I64, WireValue::I64(v)) => Ok(Value::I64(*v)),
        (WireKind::U64, WireValue::U64(v)) => Ok(Value::U64(*v)),
        (WireKind::F32, WireValue::F32(v)) => Ok(Value::F32(*v)),
        (WireKind::F64, WireValue::F64(v)) => Ok(Value::F64(*v)),
        (WireKind::Str { .. }, WireValue::Str(s)) => Ok(Value::Str(s.clone())),
        (WireKind::Enum(_), WireValue::Enum(v)) => Ok(Value::Enum(*v)),
        (WireKind::Struct(wire_members), WireValue::Struct(values)) => {
            let DynamicType::Struct(s) = ty else {
                return Err(shape(format!("expected struct type, got {}", ty.name())));
            };
            if wire_members.len() != values.len() || s.members.len() != values.len() {
                return Err(shape(format!("struct arity mismatch in {}", s.name)));
            }
            let mut out = Vec::with_capacity(values.len());
            for ((wm, m), v) in wire_members.iter().zip(&s.members).zip(values) {
                out.push(to_xtypes_value(v, &wm.ty.kind, m.ty.resolved())?);
            }
            Ok(Value::Struct(out))
        }
        (WireKind::Array { element, dims }, WireValue::Array(values)) => {
            unflatten(values, dims, &element.kind, ty)
        }
        (
            WireKind::Union { cases, .. },
            WireValue::Union { discriminator, value, .. },
        ) => {
            // The active case is discovered from the wire discriminator.
            let DynamicType::Union(u) = ty else {
                return Err(shape(format!("expected union type, got {}", ty.name())));
            };
            let (_, wire_case) = WireKind::union_case_by_discriminator(cases, *discriminator)
                .ok_or_else(|| shape(format!("no wire case for discriminator {}", discriminator)))?;
            let (x_idx, x_case) = u
                .case_by_discriminator(*discriminator)
                .ok_or_else(|| shape(format!("no case for discriminator {}", discriminator)))?;
            let inner = to_xtypes_value(value, &wire_case.ty.kind, x_case.ty.resolved())?;
            Ok(Value::Union {
                discriminator: *discriminator,
                case: x_idx,
                value: Box::new(inner),
            })
        }
        (wire, value) => Err(shape(format!(
            "cannot convert wire {:?} into {:?}",
            std::mem::discriminant(value),
            std::mem::discriminant(wire)
        ))),
    }
}

/// Collect leaf element values of a nested array, depth extents deep.
fn collect_flat<'a>(
    value: &'a Value,
    depth: usize,
    out: &mut Vec<&'a Value>,
) -> Result<(), ConvertError> {
    if depth == 0 {
        out.push(value);
        return Ok(());
    }
    let Value::Array(elems) = value else {
        return Err(shape("expected array value while flattening"));
    };
    for elem in elems {
        collect_flat(elem, depth - 1, out)?;
    }
    Ok(())
}

/// The structured element type after descending `depth` array extents.
fn array_element_type(ty: &DynamicType, depth: usize) -> Result<&DynamicType, ConvertError> {
    let mut current = ty;
    for _ in 0..depth {
        let DynamicType::Array(a) = current else {
            return Err(shape("array nesting shallower than wire dims"));
        };
        current = a.element.resolved();
    }
    Ok(current)
}

/// Rebuild a nested structured array from the flattened wire layout.
fn unflatten(
    values: &[WireValue],
    dims: &[u32],
    element: &WireKind,
    ty: &DynamicType,
) -> Result<Value, ConvertError> {
    let DynamicType::Array(a) = ty else {
        return Err(shape(format!("expected array type, got {}", ty.name())));
    };
    let Some((&outer, rest)) = dims.split_first() else {
        return Err(shape("empty wire dims"));
    };
    if a.len != outer as usize {
        return Err(shape(format!(
            "array extent mismatch: {} vs {}",
            a.len, outer
        )));
    }
    let chunk = values.len() / outer.max(1) as usize;
    let mut out = Vec::with_capacity(outer as usize);
    if rest.is_empty() {
        let elem_ty = a.element.resolved();
        for v in values {
            out.push(to_xtypes_value(v, element, elem_ty)?);
        }
    } else {
        for part in values.chunks(chunk) {
            out.push(unflatten(part, rest, element, a.element.resolved())?);
        }
    }
    Ok(Value::Array(out))
}

#[cfg(test)]
mod tests {
    use super::super::Converter;
    use crate::dynamic::WireData;
    use crate::idl::parse_idl;
    use crate::xtypes::{DynamicData, PathStep, Value};

    const IDL: &str = r#"
        enum Mode { IDLE, ACTIVE };
        struct Inner { uint32 count; };
        struct Everything {
          boolean flag;
          char letter;
          uint8 tiny;
          int64 big;
          double ratio;
          string label;
          Mode mode;
          Inner nested;
          uint32 grid[2][3];
        };
    "#;

    #[test]
    fn roundtrip_preserves_every_leaf() {
        let ctx = parse_idl(IDL).expect("parse");
        let ty = ctx.structure("Everything").expect("type").clone();
        let conv = Converter::new();
        let wire_ty = conv.create_builder(&ty).expect("builder");

        let mut data = DynamicData::new(&ty);
        *data.leaf_mut(&[PathStep::Field(0)]).unwrap() = Value::Bool(true);
        *data.leaf_mut(&[PathStep::Field(1)]).unwrap() = Value::Char('q');
        *data.leaf_mut(&[PathStep::Field(2)]).unwrap() = Value::U8(200);
        *data.leaf_mut(&[PathStep::Field(3)]).unwrap() = Value::I64(-9_000_000_000);
        *data.leaf_mut(&[PathStep::Field(4)]).unwrap() = Value::F64(0.125);
        *data.leaf_mut(&[PathStep::Field(5)]).unwrap() = Value::Str("probe".into());
        *data.leaf_mut(&[PathStep::Field(6)]).unwrap() = Value::Enum(1);
        *data
            .leaf_mut(&[PathStep::Field(7), PathStep::Field(0)])
            .unwrap() = Value::U32(17);
        for i in 0..2 {
            for j in 0..3 {
                *data
                    .leaf_mut(&[PathStep::Field(8), PathStep::Index(i), PathStep::Index(j)])
                    .unwrap() = Value::U32((i * 3 + j) as u32);
            }
        }

        let mut wire = WireData::new(&wire_ty);
        conv.xtypes_to_wire(&data, &mut wire).expect("to wire");
        let mut back = DynamicData::new(&ty);
        conv.wire_to_xtypes(&wire, &mut back).expect("from wire");
        assert_eq!(back, data);
    }

    #[test]
    fn roundtrip_union() {
        let idl = r#"
            union Pick switch (int32) {
              case 0: double d;
              case 1: string s;
            };
            struct Holder { int32 tag; };
        "#;
        let ctx = parse_idl(idl).expect("parse");
        let ty = ctx.lookup("Pick").expect("union").clone();
        let conv = Converter::new();
        let wire_ty = conv.create_builder(&ty).expect("builder");

        let mut data = DynamicData::new(&ty);
        *data.value_mut() = Value::Union {
            discriminator: 1,
            case: 1,
            value: Box::new(Value::Str("chosen".into())),
        };
        let mut wire = WireData::new(&wire_ty);
        conv.xtypes_to_wire(&data, &mut wire).expect("to wire");
        let mut back = DynamicData::new(&ty);
        conv.wire_to_xtypes(&wire, &mut back).expect("from wire");
        assert_eq!(back, data);
    }
}
