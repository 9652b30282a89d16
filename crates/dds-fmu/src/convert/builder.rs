// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Wire type builder: structured types to wire types.

use std::sync::Arc;

use super::ConvertError;
use crate::dynamic::{WireKind, WireLiteral, WireMember, WireType, WireUnionCase};
use crate::xtypes::{DynamicType, PrimitiveKind};

/// Patch type names for the wire: `/` is reserved, replace with `__`.
pub fn convert_type_name(name: &str) -> String {
    name.replace('/', "__")
}

fn unsupported(ty: &DynamicType, detail: &str) -> ConvertError {
    ConvertError::UnsupportedKind {
        type_name: ty.name().to_string(),
        detail: detail.to_string(),
    }
}

/// Recursively build a wire type for a structured type.
pub(super) fn build_wire_type(ty: &DynamicType) -> Result<WireType, ConvertError> {
    let resolved = ty.resolved();
    match resolved {
        DynamicType::Primitive(p) => {
            let kind = match p {
                PrimitiveKind::Bool => WireKind::Bool,
                PrimitiveKind::Char => WireKind::Char,
                PrimitiveKind::I8 => WireKind::I8,
                PrimitiveKind::U8 => WireKind::U8,
                PrimitiveKind::I16 => WireKind::I16,
                PrimitiveKind::U16 => WireKind::U16,
                PrimitiveKind::I32 => WireKind::I32,
                PrimitiveKind::U32 => WireKind::U32,
                PrimitiveKind::I64 => WireKind::I64,
                PrimitiveKind::U64 => WireKind::U64,
                PrimitiveKind::F32 => WireKind::F32,
                PrimitiveKind::F64 => WireKind::F64,
                PrimitiveKind::F128 => return Err(unsupported(resolved, "long double")),
                PrimitiveKind::WChar => return Err(unsupported(resolved, "wchar")),
            };
            Ok(WireType::new(p.idl_name(), kind))
        }
        DynamicType::Str { bound } => Ok(WireType::new(
            "string",
            WireKind::Str {
                bound: bound.map(|b| b as u32),
            },
        )),
        DynamicType::WStr => Err(unsupported(resolved, "wstring")),
        DynamicType::Sequence(_) => Err(unsupported(resolved, "sequence")),
        DynamicType::Map(_) => Err(unsupported(resolved, "map")),
        DynamicType::Enum(e) => Ok(WireType::new(
            convert_type_name(&e.name),
            WireKind::Enum(
                e.enumerators
                    .iter()
                    .map(|en| WireLiteral {
                        name: en.name.clone(),
                        value: en.value,
                    })
                    .collect(),
            ),
        )),
        DynamicType::Struct(s) => {
            let mut members = Vec::with_capacity(s.members.len());
            for m in &s.members {
                members.push(WireMember {
                    name: m.name.clone(),
                    ty: Arc::new(build_wire_type(&m.ty)?),
                    is_key: m.is_key,
                });
            }
            Ok(WireType::new(
                convert_type_name(&s.name),
                WireKind::Struct(members),
            ))
        }
        DynamicType::Array(_) => {
            // Iterate nested extents until a non-array element is reached,
            // collecting the dimensions outermost-first.
            let mut dims = Vec::new();
            let mut element = resolved;
            while let DynamicType::Array(a) = element {
                dims.push(a.len as u32);
                element = a.element.resolved();
            }
            let element = Arc::new(build_wire_type(element)?);
            Ok(WireType::new("array", WireKind::Array { element, dims }))
        }
        DynamicType::Union(u) => {
            let discriminator = Arc::new(build_wire_type(&u.discriminator)?);
            let mut cases = Vec::with_capacity(u.cases.len());
            for c in &u.cases {
                cases.push(WireUnionCase {
                    name: c.name.clone(),
                    labels: c.labels.clone(),
                    is_default: c.is_default,
                    ty: Arc::new(build_wire_type(&c.ty)?),
                });
            }
            Ok(WireType::new(
                convert_type_name(&u.name),
                WireKind::Union {
                    discriminator,
                    cases,
                },
            ))
        }
        DynamicType::Alias(_) => unreachable!("resolved() strips aliases"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xtypes::{ArrayType, Member, SequenceType, StructType};

    fn prim(kind: PrimitiveKind) -> Arc<DynamicType> {
        Arc::new(DynamicType::Primitive(kind))
    }

    #[test]
    fn nested_arrays_flatten_to_dims() {
        let ty = DynamicType::Array(ArrayType {
            element: Arc::new(DynamicType::Array(ArrayType {
                element: prim(PrimitiveKind::U32),
                len: 2,
            })),
            len: 3,
        });
        let wire = build_wire_type(&ty).expect("build");
        let WireKind::Array { dims, element } = &wire.kind else {
            panic!("expected array");
        };
        assert_eq!(dims, &vec![3, 2]);
        assert_eq!(element.kind, WireKind::U32);
    }

    #[test]
    fn key_annotation_survives() {
        let ty = DynamicType::Struct(StructType {
            name: "Keyed".into(),
            members: vec![
                Member::new("id", prim(PrimitiveKind::U32)).key(),
                Member::new("v", prim(PrimitiveKind::F64)),
            ],
        });
        let wire = build_wire_type(&ty).expect("build");
        let WireKind::Struct(members) = &wire.kind else {
            panic!("expected struct");
        };
        assert!(members[0].is_key);
        assert!(!members[1].is_key);
    }

    #[test]
    fn sequences_are_rejected() {
        let ty = DynamicType::Struct(StructType {
            name: "S".into(),
            members: vec![Member::new(
                "xs",
                Arc::new(DynamicType::Sequence(SequenceType {
                    element: prim(PrimitiveKind::F64),
                    bound: None,
                })),
            )],
        });
        assert!(build_wire_type(&ty).is_err());
    }

    #[test]
    fn name_patching() {
        assert_eq!(convert_type_name("rt/odom"), "rt__odom");
        assert_eq!(convert_type_name("My::Impl"), "My::Impl");
    }
}
