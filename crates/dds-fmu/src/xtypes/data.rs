// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Dynamic data trees conforming to a [`DynamicType`].

use std::fmt;
use std::sync::Arc;

use super::type_desc::{DynamicType, PrimitiveKind};

/// Errors for structured data access.
#[derive(Debug)]
pub enum DataError {
    /// A path step does not fit the type at that position.
    BadPath { step: usize, detail: String },
    /// The addressed node is not a scalar leaf.
    NotALeaf(String),
    /// A scalar access used the wrong kind.
    TypeMismatch { expected: &'static str, got: String },
    /// A dotted member name did not resolve.
    MemberNotFound(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPath { step, detail } => {
                write!(f, "invalid path at step {}: {}", step, detail)
            }
            Self::NotALeaf(name) => write!(f, "node is not a leaf: {}", name),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {}, got {}", expected, got)
            }
            Self::MemberNotFound(name) => write!(f, "member not found: {}", name),
        }
    }
}

impl std::error::Error for DataError {}

/// One step of a leaf address: a struct field by index or an array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    Field(usize),
    Index(usize),
}

/// Address of a node inside a data tree, outermost step first.
pub type MemberPath = Vec<PathStep>;

/// A dynamic value node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
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
    /// Enumerator value (uint32 underlying).
    Enum(u32),
    /// Positional field values, matching member declaration order.
    Struct(Vec<Value>),
    Array(Vec<Value>),
    Union {
        discriminator: i64,
        case: usize,
        value: Box<Value>,
    },
}

/// A data tree with runtime type information.
///
/// Every reachable leaf holds a defined value from construction on.
#[derive(Debug, Clone)]
pub struct DynamicData {
    ty: Arc<DynamicType>,
    value: Value,
}

impl DynamicData {
    /// Create a default-initialized value tree for a type.
    pub fn new(ty: &Arc<DynamicType>) -> Self {
        Self {
            ty: ty.clone(),
            value: default_value(ty),
        }
    }

    pub fn ty(&self) -> &Arc<DynamicType> {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Borrow the leaf value addressed by `path`.
    pub fn leaf(&self, path: &[PathStep]) -> Result<&Value, DataError> {
        let mut value = &self.value;
        for (i, step) in path.iter().enumerate() {
            value = descend(value, *step, i)?;
        }
        Ok(value)
    }

    /// Mutably borrow the leaf value addressed by `path`.
    pub fn leaf_mut(&mut self, path: &[PathStep]) -> Result<&mut Value, DataError> {
        let mut value = &mut self.value;
        for (i, step) in path.iter().enumerate() {
            value = descend_mut(value, *step, i)?;
        }
        Ok(value)
    }

    /// Resolved type of the node addressed by `path`.
    pub fn leaf_type(&self, path: &[PathStep]) -> Result<&DynamicType, DataError> {
        let mut ty = self.ty.resolved();
        for (i, step) in path.iter().enumerate() {
            ty = match (ty, step) {
                (DynamicType::Struct(s), PathStep::Field(idx)) => s
                    .members
                    .get(*idx)
                    .map(|m| m.ty.resolved())
                    .ok_or_else(|| DataError::BadPath {
                        step: i,
                        detail: format!("field {} out of range in {}", idx, s.name),
                    })?,
                (DynamicType::Array(a), PathStep::Index(idx)) => {
                    if *idx >= a.len {
                        return Err(DataError::BadPath {
                            step: i,
                            detail: format!("index {} out of range ({})", idx, a.len),
                        });
                    }
                    a.element.resolved()
                }
                (other, _) => {
                    return Err(DataError::BadPath {
                        step: i,
                        detail: format!("cannot descend into {}", other.name()),
                    })
                }
            };
        }
        Ok(ty)
    }
}

impl PartialEq for DynamicData {
    fn eq(&self, other: &Self) -> bool {
        self.ty.name() == other.ty.name() && self.value == other.value
    }
}

fn descend<'a>(value: &'a Value, step: PathStep, at: usize) -> Result<&'a Value, DataError> {
    match (value, step) {
        (Value::Struct(fields), PathStep::Field(i)) => {
            fields.get(i).ok_or_else(|| DataError::BadPath {
                step: at,
                detail: format!("field {} out of range", i),
            })
        }
        (Value::Array(elems), PathStep::Index(i)) => {
            elems.get(i).ok_or_else(|| DataError::BadPath {
                step: at,
                detail: format!("index {} out of range", i),
            })
        }
        (other, _) => Err(DataError::BadPath {
            step: at,
            detail: format!("cannot descend into {:?}", std::mem::discriminant(other)),
        }),
    }
}

fn descend_mut<'a>(
    value: &'a mut Value,
    step: PathStep,
    at: usize,
) -> Result<&'a mut Value, DataError> {
    match (value, step) {
        (Value::Struct(fields), PathStep::Field(i)) => {
            fields.get_mut(i).ok_or_else(|| DataError::BadPath {
                step: at,
                detail: format!("field {} out of range", i),
            })
        }
        (Value::Array(elems), PathStep::Index(i)) => {
            elems.get_mut(i).ok_or_else(|| DataError::BadPath {
                step: at,
                detail: format!("index {} out of range", i),
            })
        }
        (_, _) => Err(DataError::BadPath {
            step: at,
            detail: "cannot descend into scalar".into(),
        }),
    }
}

/// Default value per type: zero scalars, empty strings, first enumerator,
/// first union case.
pub(crate) fn default_value(ty: &DynamicType) -> Value {
    match ty.resolved() {
        DynamicType::Primitive(p) => default_primitive(*p),
        DynamicType::Str { .. } => Value::Str(String::new()),
        DynamicType::WStr => Value::Str(String::new()),
        DynamicType::Enum(e) => Value::Enum(e.enumerators.first().map_or(0, |v| v.value)),
        DynamicType::Struct(s) => {
            Value::Struct(s.members.iter().map(|m| default_value(&m.ty)).collect())
        }
        DynamicType::Array(a) => {
            let elem = default_value(&a.element);
            Value::Array(vec![elem; a.len])
        }
        DynamicType::Sequence(_) | DynamicType::Map(_) => Value::Array(Vec::new()),
        DynamicType::Union(u) => match u.cases.first() {
            Some(case) => Value::Union {
                discriminator: case.labels.first().copied().unwrap_or(0),
                case: 0,
                value: Box::new(default_value(&case.ty)),
            },
            None => Value::Union {
                discriminator: 0,
                case: 0,
                value: Box::new(Value::I32(0)),
            },
        },
        DynamicType::Alias(_) => unreachable!("resolved() strips aliases"),
    }
}

fn default_primitive(kind: PrimitiveKind) -> Value {
    match kind {
        PrimitiveKind::Bool => Value::Bool(false),
        PrimitiveKind::Char => Value::Char('\0'),
        PrimitiveKind::WChar => Value::Char('\0'),
        PrimitiveKind::I8 => Value::I8(0),
        PrimitiveKind::U8 => Value::U8(0),
        PrimitiveKind::I16 => Value::I16(0),
        PrimitiveKind::U16 => Value::U16(0),
        PrimitiveKind::I32 => Value::I32(0),
        PrimitiveKind::U32 => Value::U32(0),
        PrimitiveKind::I64 => Value::I64(0),
        PrimitiveKind::U64 => Value::U64(0),
        PrimitiveKind::F32 => Value::F32(0.0),
        PrimitiveKind::F64 => Value::F64(0.0),
        PrimitiveKind::F128 => Value::F64(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xtypes::type_desc::{ArrayType, Member, StructType};

    fn point_type() -> Arc<DynamicType> {
        let f64_ty = Arc::new(DynamicType::Primitive(PrimitiveKind::F64));
        Arc::new(DynamicType::Struct(StructType {
            name: "Point".into(),
            members: vec![
                Member::new("x", f64_ty.clone()),
                Member::new("y", f64_ty),
            ],
        }))
    }

    #[test]
    fn defaults_are_zeroed() {
        let data = DynamicData::new(&point_type());
        assert_eq!(data.leaf(&[PathStep::Field(0)]).unwrap(), &Value::F64(0.0));
        assert_eq!(data.leaf(&[PathStep::Field(1)]).unwrap(), &Value::F64(0.0));
    }

    #[test]
    fn leaf_mut_roundtrip() {
        let mut data = DynamicData::new(&point_type());
        *data.leaf_mut(&[PathStep::Field(1)]).unwrap() = Value::F64(2.5);
        assert_eq!(data.leaf(&[PathStep::Field(1)]).unwrap(), &Value::F64(2.5));
    }

    #[test]
    fn array_paths() {
        let u32_ty = Arc::new(DynamicType::Primitive(PrimitiveKind::U32));
        let arr = Arc::new(DynamicType::Struct(StructType {
            name: "Holder".into(),
            members: vec![Member::new(
                "values",
                Arc::new(DynamicType::Array(ArrayType {
                    element: u32_ty,
                    len: 3,
                })),
            )],
        }));
        let mut data = DynamicData::new(&arr);
        let path = vec![PathStep::Field(0), PathStep::Index(2)];
        *data.leaf_mut(&path).unwrap() = Value::U32(9);
        assert_eq!(data.leaf(&path).unwrap(), &Value::U32(9));
        assert_eq!(data.leaf_type(&path).unwrap().name(), "uint32");
        assert!(data.leaf(&[PathStep::Field(0), PathStep::Index(3)]).is_err());
    }
}
