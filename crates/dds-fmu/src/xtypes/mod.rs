// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Structured dynamic types and data.
//!
//! This is the in-memory representation the FMU works with: a
//! [`DynamicType`] tree parsed from IDL and a [`DynamicData`] value tree
//! conforming to it. Every reachable leaf holds a defined value at all
//! times (scalars default to zero, strings to empty, enumerations to their
//! first enumerator).
//!
//! Leaves are addressed by [`MemberPath`] - a list of field/index steps -
//! and enumerated in depth-first declaration order by [`for_each_leaf`],
//! which also carries the ancestor information needed to produce FMI
//! structured names.

mod data;
mod traverse;
mod type_desc;

pub use data::{DataError, DynamicData, MemberPath, PathStep, Value};
pub use traverse::{for_each_leaf, LeafNode, NameSeg};
pub use type_desc::{
    AliasType, ArrayType, DynamicType, EnumType, Enumerator, MapType, Member, PrimitiveKind,
    SequenceType, StructType, UnionCase, UnionType,
};
