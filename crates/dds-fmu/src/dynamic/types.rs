// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Wire type descriptors.

use std::sync::Arc;

/// One literal of a wire enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireLiteral {
    pub name: String,
    pub value: u32,
}

/// One member of a wire struct. `is_key` mirrors the IDL `@key` annotation
/// and drives instance identity on the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct WireMember {
    pub name: String,
    pub ty: Arc<WireType>,
    pub is_key: bool,
}

/// One case of a wire union, preserving the IDL label values.
#[derive(Debug, Clone, PartialEq)]
pub struct WireUnionCase {
    pub name: String,
    pub labels: Vec<i64>,
    pub is_default: bool,
    pub ty: Arc<WireType>,
}

/// Wire type kinds. Sequences, maps and wide strings never reach this
/// level: the builder rejects them.
#[derive(Debug, Clone, PartialEq)]
pub enum WireKind {
    Bool,
    Char,
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
    Str { bound: Option<u32> },
    Enum(Vec<WireLiteral>),
    Struct(Vec<WireMember>),
    /// Flattened multi-dimensional array; `dims` is outermost-first and the
    /// element is never itself an array.
    Array { element: Arc<WireType>, dims: Vec<u32> },
    Union {
        discriminator: Arc<WireType>,
        cases: Vec<WireUnionCase>,
    },
}

/// A complete wire type.
#[derive(Debug, Clone, PartialEq)]
pub struct WireType {
    pub name: String,
    pub kind: WireKind,
}

impl WireType {
    pub fn new(name: impl Into<String>, kind: WireKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Total element count of a flattened array.
    pub fn flat_len(dims: &[u32]) -> usize {
        dims.iter().map(|d| *d as usize).product()
    }
}

impl WireKind {
    pub fn union_case_by_discriminator(
        cases: &[WireUnionCase],
        value: i64,
    ) -> Option<(usize, &WireUnionCase)> {
        cases
            .iter()
            .enumerate()
            .find(|(_, c)| c.labels.contains(&value))
            .or_else(|| cases.iter().enumerate().find(|(_, c)| c.is_default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_len_multiplies_dims() {
        assert_eq!(WireType::flat_len(&[3, 2]), 6);
        assert_eq!(WireType::flat_len(&[5]), 5);
        assert_eq!(WireType::flat_len(&[]), 1);
    }
}
