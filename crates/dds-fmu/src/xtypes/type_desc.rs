// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Type descriptors for the structured representation.

use std::sync::Arc;

/// Primitive type kinds as they appear in IDL.
///
/// `F128` and `WChar` are parsed but rejected when mapped onto FMI
/// variables or wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    WChar,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    F128,
}

impl PrimitiveKind {
    /// IDL spelling of the kind.
    pub fn idl_name(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Char => "char",
            Self::WChar => "wchar",
            Self::I8 => "int8",
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::I32 => "int32",
            Self::U32 => "uint32",
            Self::I64 => "int64",
            Self::U64 => "uint64",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::F128 => "long double",
        }
    }
}

/// A named member of a structured type, carrying its IDL annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    pub ty: Arc<DynamicType>,
    /// `@key` annotation: member participates in instance identity.
    pub is_key: bool,
    /// `@optional` annotation.
    pub is_optional: bool,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: Arc<DynamicType>) -> Self {
        Self {
            name: name.into(),
            ty,
            is_key: false,
            is_optional: false,
        }
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }
}

/// Structure with ordered named members.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub members: Vec<Member>,
}

impl StructType {
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }
}

/// One enumerator of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
    pub name: String,
    pub value: u32,
}

/// Enumeration with uint32 underlying values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub enumerators: Vec<Enumerator>,
}

impl EnumType {
    pub fn enumerator(&self, name: &str) -> Option<&Enumerator> {
        self.enumerators.iter().find(|e| e.name == name)
    }
}

/// Fixed-extent array. Multidimensional arrays nest: `T a[3][2]` is an
/// array of length 3 whose element is an array of length 2.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub element: Arc<DynamicType>,
    pub len: usize,
}

/// Sequence; parsed from IDL but rejected at mapping time.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceType {
    pub element: Arc<DynamicType>,
    pub bound: Option<usize>,
}

/// Map; parsed from IDL but rejected at mapping time.
#[derive(Debug, Clone, PartialEq)]
pub struct MapType {
    pub key: Arc<DynamicType>,
    pub value: Arc<DynamicType>,
}

/// One case of a union, keeping the IDL label values.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    pub name: String,
    pub labels: Vec<i64>,
    pub is_default: bool,
    pub ty: Arc<DynamicType>,
}

/// Discriminated union.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub name: String,
    pub discriminator: Arc<DynamicType>,
    pub cases: Vec<UnionCase>,
}

impl UnionType {
    /// Case selected by a discriminator value, falling back to the default
    /// case when no label matches.
    pub fn case_by_discriminator(&self, value: i64) -> Option<(usize, &UnionCase)> {
        self.cases
            .iter()
            .enumerate()
            .find(|(_, c)| c.labels.contains(&value))
            .or_else(|| self.cases.iter().enumerate().find(|(_, c)| c.is_default))
    }
}

/// Named alias (typedef) for another type.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasType {
    pub name: String,
    pub underlying: Arc<DynamicType>,
}

/// A structured dynamic type, immutable once parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicType {
    Primitive(PrimitiveKind),
    /// `string` / `string<N>`.
    Str { bound: Option<usize> },
    /// `wstring`; parsed but rejected at mapping time.
    WStr,
    Enum(EnumType),
    Struct(StructType),
    Array(ArrayType),
    Sequence(SequenceType),
    Map(MapType),
    Union(UnionType),
    Alias(AliasType),
}

impl DynamicType {
    /// Display name of the type.
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(p) => p.idl_name(),
            Self::Str { .. } => "string",
            Self::WStr => "wstring",
            Self::Enum(e) => &e.name,
            Self::Struct(s) => &s.name,
            Self::Array(_) => "array",
            Self::Sequence(_) => "sequence",
            Self::Map(_) => "map",
            Self::Union(u) => &u.name,
            Self::Alias(a) => &a.name,
        }
    }

    /// Strip aliases down to the underlying type.
    pub fn resolved(&self) -> &DynamicType {
        let mut ty = self;
        while let DynamicType::Alias(a) = ty {
            ty = &a.underlying;
        }
        ty
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.resolved(), DynamicType::Primitive(_))
    }

    pub fn is_enumerated(&self) -> bool {
        matches!(self.resolved(), DynamicType::Enum(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self.resolved(), DynamicType::Str { .. })
    }

    pub fn as_struct(&self) -> Option<&StructType> {
        match self.resolved() {
            DynamicType::Struct(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolution() {
        let base = Arc::new(DynamicType::Primitive(PrimitiveKind::U32));
        let alias = DynamicType::Alias(AliasType {
            name: "Depth".into(),
            underlying: Arc::new(DynamicType::Alias(AliasType {
                name: "Meters".into(),
                underlying: base,
            })),
        });
        assert!(alias.is_primitive());
        assert_eq!(alias.resolved().name(), "uint32");
    }

    #[test]
    fn union_case_selection() {
        let i32_ty = Arc::new(DynamicType::Primitive(PrimitiveKind::I32));
        let union = UnionType {
            name: "U".into(),
            discriminator: i32_ty.clone(),
            cases: vec![
                UnionCase {
                    name: "a".into(),
                    labels: vec![0, 1],
                    is_default: false,
                    ty: i32_ty.clone(),
                },
                UnionCase {
                    name: "b".into(),
                    labels: vec![],
                    is_default: true,
                    ty: i32_ty,
                },
            ],
        };
        assert_eq!(union.case_by_discriminator(1).map(|(i, _)| i), Some(0));
        assert_eq!(union.case_by_discriminator(7).map(|(i, _)| i), Some(1));
    }
}
