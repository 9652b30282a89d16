// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Depth-first leaf enumeration and structured name generation.
//!
//! Traversal order is member declaration order, arrays element by element.
//! Union interiors are not enumerated: only primitive, enumeration and
//! string nodes can become FMI variables, and a union member does not have
//! a stable scalar layout.

use std::sync::Arc;

use super::data::{MemberPath, PathStep};
use super::type_desc::{DynamicType, Member};

/// One segment of a structured name: a member name plus the array indices
/// accumulated while descending through (possibly nested) array extents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSeg {
    pub member: String,
    pub indices: Vec<usize>,
}

impl NameSeg {
    fn render(&self) -> Option<String> {
        if self.member.is_empty() && self.indices.is_empty() {
            return None;
        }
        let mut out = self.member.clone();
        if !self.indices.is_empty() {
            let joined = self
                .indices
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.push('[');
            out.push_str(&joined);
            out.push(']');
        }
        Some(out)
    }
}

/// A visited leaf: its address, resolved type, originating member and the
/// ancestor segments needed for name generation.
pub struct LeafNode<'t, 's> {
    pub path: MemberPath,
    /// Resolved leaf type (aliases stripped).
    pub ty: &'t DynamicType,
    /// The member this node originates from, if any; carries `is_key` and
    /// `is_optional`.
    pub member: Option<&'t Member>,
    pub segments: &'s [NameSeg],
}

impl LeafNode<'_, '_> {
    /// FMI structured name: members joined with `.`, array index groups as
    /// `[i]` or `[i,j,...]`, no trailing separator.
    pub fn structured_name(&self) -> String {
        self.segments
            .iter()
            .filter_map(NameSeg::render)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Whether the originating member carries the `@key` annotation.
    pub fn is_key(&self) -> bool {
        self.member.is_some_and(|m| m.is_key)
    }
}

/// Enumerate the leaves of `ty` depth-first, in declaration order.
///
/// Name generation is pure and deterministic: the same type always yields
/// the same sequence of paths and structured names.
pub fn for_each_leaf<'t, F>(ty: &'t Arc<DynamicType>, mut visit: F)
where
    F: FnMut(LeafNode<'t, '_>),
{
    let mut walker = Walker {
        path: Vec::new(),
        segments: Vec::new(),
    };
    walker.walk(ty, None, &mut visit);
}

struct Walker {
    path: MemberPath,
    segments: Vec<NameSeg>,
}

impl Walker {
    fn walk<'t, F>(&mut self, ty: &'t Arc<DynamicType>, member: Option<&'t Member>, visit: &mut F)
    where
        F: FnMut(LeafNode<'t, '_>),
    {
        match ty.resolved() {
            DynamicType::Struct(s) => {
                for (idx, m) in s.members.iter().enumerate() {
                    self.path.push(PathStep::Field(idx));
                    self.segments.push(NameSeg {
                        member: m.name.clone(),
                        indices: Vec::new(),
                    });
                    self.walk(&m.ty, Some(m), visit);
                    self.segments.pop();
                    self.path.pop();
                }
            }
            DynamicType::Array(a) => {
                // Indices of nested extents accumulate on the member's own
                // segment, so `T m[3][2]` renders as `m[i,j]`.
                if self.segments.is_empty() {
                    self.segments.push(NameSeg {
                        member: String::new(),
                        indices: Vec::new(),
                    });
                }
                for idx in 0..a.len {
                    self.path.push(PathStep::Index(idx));
                    if let Some(seg) = self.segments.last_mut() {
                        seg.indices.push(idx);
                    }
                    self.walk(&a.element, member, visit);
                    if let Some(seg) = self.segments.last_mut() {
                        seg.indices.pop();
                    }
                    self.path.pop();
                }
            }
            DynamicType::Union(_) => {}
            leaf => visit(LeafNode {
                path: self.path.clone(),
                ty: leaf,
                member,
                segments: &self.segments,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xtypes::type_desc::{ArrayType, EnumType, Enumerator, PrimitiveKind, StructType};

    fn prim(kind: PrimitiveKind) -> Arc<DynamicType> {
        Arc::new(DynamicType::Primitive(kind))
    }

    /// The nested fixture from the naming convention: an `int32`, an array
    /// of structs holding a struct, a string and a 3x2 matrix.
    fn sun_type() -> Arc<DynamicType> {
        let inner = Arc::new(DynamicType::Struct(StructType {
            name: "Inner".into(),
            members: vec![Member::new("my_uint32", prim(PrimitiveKind::U32))],
        }));
        let universe = Arc::new(DynamicType::Struct(StructType {
            name: "Universe".into(),
            members: vec![Member::new("my_inner", inner)],
        }));
        let matrix = Arc::new(DynamicType::Array(ArrayType {
            element: Arc::new(DynamicType::Array(ArrayType {
                element: prim(PrimitiveKind::U32),
                len: 2,
            })),
            len: 3,
        }));
        Arc::new(DynamicType::Struct(StructType {
            name: "Sun".into(),
            members: vec![
                Member::new("distance", prim(PrimitiveKind::I32)),
                Member::new(
                    "universe",
                    Arc::new(DynamicType::Array(ArrayType {
                        element: universe,
                        len: 2,
                    })),
                ),
                Member::new("name", Arc::new(DynamicType::Str { bound: None })),
                Member::new("matrix", matrix),
            ],
        }))
    }

    #[test]
    fn structured_names_match_convention() {
        let mut names = Vec::new();
        for_each_leaf(&sun_type(), |leaf| names.push(leaf.structured_name()));
        assert_eq!(
            names,
            vec![
                "distance",
                "universe[0].my_inner.my_uint32",
                "universe[1].my_inner.my_uint32",
                "name",
                "matrix[0,0]",
                "matrix[0,1]",
                "matrix[1,0]",
                "matrix[1,1]",
                "matrix[2,0]",
                "matrix[2,1]",
            ]
        );
    }

    #[test]
    fn name_generation_is_deterministic() {
        let ty = sun_type();
        let collect = |ty: &Arc<DynamicType>| {
            let mut names = Vec::new();
            for_each_leaf(ty, |leaf| names.push(leaf.structured_name()));
            names
        };
        assert_eq!(collect(&ty), collect(&ty));
    }

    #[test]
    fn key_flag_follows_member() {
        let keyed = Arc::new(DynamicType::Struct(StructType {
            name: "Keyed".into(),
            members: vec![
                Member::new("id", prim(PrimitiveKind::U32)).key(),
                Member::new("value", prim(PrimitiveKind::F64)),
            ],
        }));
        let mut keys = Vec::new();
        for_each_leaf(&keyed, |leaf| keys.push(leaf.is_key()));
        assert_eq!(keys, vec![true, false]);
    }

    #[test]
    fn enums_are_leaves() {
        let color = Arc::new(DynamicType::Enum(EnumType {
            name: "Color".into(),
            enumerators: vec![
                Enumerator { name: "ALPHA".into(), value: 0 },
                Enumerator { name: "BETA".into(), value: 1 },
            ],
        }));
        let ty = Arc::new(DynamicType::Struct(StructType {
            name: "Sample".into(),
            members: vec![Member::new("color", color)],
        }));
        let mut count = 0;
        for_each_leaf(&ty, |leaf| {
            assert!(matches!(leaf.ty, DynamicType::Enum(_)));
            count += 1;
        });
        assert_eq!(count, 1);
    }
}
