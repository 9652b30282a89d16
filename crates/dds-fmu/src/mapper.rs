// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Mapping between FMU value references and structured data buffers.
//!
//! IDL types map onto the four FMU kinds Real, Integer, Boolean and
//! String. Integer types wider than 32 bits map to Real; enumerations map
//! to Integer; `char` maps to single-character strings. All data lives in
//! per-(topic, direction) [`DynamicData`] buffers; each scalar access goes
//! through an accessor record holding the leaf's path into its buffer.
//!
//! One accessor table per kind serves both the setter and the getter, so
//! the "reader and writer tables have equal length" invariant holds by
//! construction: every registered leaf is readable and writable, which is
//! what FMI's `initial="exact"` expects of outputs and parameters too.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;

use crate::config::{self, MappingDirection, ScalarVariableType};
use crate::distributor::SignalDistributor;
use crate::idl::{self, IdlContext};
use crate::xtypes::{for_each_leaf, DynamicData, DynamicType, MemberPath, PrimitiveKind, Value};
use crate::{FmuError, Result};

/// Whether a buffer is read from DDS (FMU output), written to DDS (FMU
/// input), or holds the key-filter reference values (FMU parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    /// Read from DDS, FMU output.
    Read,
    /// Write to DDS, FMU input.
    Write,
    /// Key-filter reference values, FMU parameter.
    Parameter,
}

impl Direction {
    fn describe(self) -> &'static str {
        match self {
            Direction::Read => "output",
            Direction::Write => "input",
            Direction::Parameter => "parameter",
        }
    }
}

/// Buffer identity: topic name plus direction.
pub type StoreKey = (String, Direction);

/// Accessor table lengths per kind at the time a topic was added, in the
/// order Real, Integer, Boolean, String. Useful for addressing a topic's
/// leaves directly.
pub type IndexOffsets = (usize, usize, usize, usize);

/// Exact leaf kind, fixed at registration so access never re-resolves the
/// type tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafKind {
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
    Str,
    Enum,
}

impl LeafKind {
    fn of(ty: &DynamicType) -> Option<Self> {
        match ty.resolved() {
            DynamicType::Primitive(p) => match p {
                PrimitiveKind::Bool => Some(Self::Bool),
                PrimitiveKind::Char => Some(Self::Char),
                PrimitiveKind::I8 => Some(Self::I8),
                PrimitiveKind::U8 => Some(Self::U8),
                PrimitiveKind::I16 => Some(Self::I16),
                PrimitiveKind::U16 => Some(Self::U16),
                PrimitiveKind::I32 => Some(Self::I32),
                PrimitiveKind::U32 => Some(Self::U32),
                PrimitiveKind::I64 => Some(Self::I64),
                PrimitiveKind::U64 => Some(Self::U64),
                PrimitiveKind::F32 => Some(Self::F32),
                PrimitiveKind::F64 => Some(Self::F64),
                PrimitiveKind::F128 | PrimitiveKind::WChar => None,
            },
            DynamicType::Str { .. } => Some(Self::Str),
            DynamicType::Enum(_) => Some(Self::Enum),
            _ => None,
        }
    }
}

/// One leaf binding: which buffer, where in it, and what lives there.
#[derive(Debug, Clone)]
struct Accessor {
    key: StoreKey,
    path: MemberPath,
    kind: LeafKind,
}

/// Owns the per-topic data buffers and the value-reference tables.
#[derive(Default)]
pub struct DataMapper {
    context: IdlContext,
    store: BTreeMap<StoreKey, DynamicData>,
    offsets: BTreeMap<StoreKey, IndexOffsets>,
    real: Vec<Accessor>,
    integer: Vec<Accessor>,
    boolean: Vec<Accessor>,
    string: Vec<Accessor>,
    potential_keys: VecDeque<(String, String)>,
}

impl DataMapper {
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        self.real.clear();
        self.integer.clear();
        self.boolean.clear();
        self.string.clear();
        self.store.clear();
        self.offsets.clear();
        self.potential_keys.clear();
    }

    /// Clear and repopulate from the FMU resources folder.
    ///
    /// Outputs are processed before inputs so reader-side value references
    /// match the layout the signal distributor computes for the model
    /// description; queued key parameters are materialized last.
    pub fn reset(&mut self, fmu_resources: &Path) -> Result<()> {
        self.clear();
        self.context = idl::load_fmu_idls(fmu_resources)?;

        let mapping_path = fmu_resources
            .join("config")
            .join("dds")
            .join("ddsfmu_mapping.xml");
        let entries = config::load_mapping(&mapping_path)?;

        for pass in [MappingDirection::FmuOut, MappingDirection::FmuIn] {
            for entry in entries.iter().filter(|e| e.direction == pass) {
                if !self.context.has_structure(&entry.type_name) {
                    return Err(FmuError::Config(format!(
                        "got non-existing 'type': {}",
                        entry.type_name
                    )));
                }
                let direction = match pass {
                    MappingDirection::FmuOut => Direction::Read,
                    MappingDirection::FmuIn => Direction::Write,
                };
                self.add(&entry.topic, &entry.type_name, direction)?;
                if entry.key_filter {
                    self.potential_keys
                        .push_back((entry.topic.clone(), entry.type_name.clone()));
                }
            }
        }

        while let Some((topic, ty)) = self.potential_keys.pop_front() {
            self.add(&topic, &ty, Direction::Parameter)?;
        }
        Ok(())
    }

    /// Register one buffer and its leaf accessors.
    ///
    /// The leaf admission rule must stay identical to the signal
    /// distributor's, or value references will drift apart.
    fn add(&mut self, topic_name: &str, topic_type: &str, direction: Direction) -> Result<()> {
        let ty = self.context.structure(topic_type)?.clone();
        let key: StoreKey = (topic_name.to_string(), direction);

        if self.store.contains_key(&key) {
            return Err(FmuError::Config(format!(
                "tried to create existing topic: {} for FMU {}",
                topic_name,
                direction.describe()
            )));
        }
        self.store.insert(key.clone(), DynamicData::new(&ty));
        self.offsets.insert(
            key.clone(),
            (
                self.real.len(),
                self.integer.len(),
                self.boolean.len(),
                self.string.len(),
            ),
        );

        for_each_leaf(&ty, |leaf| {
            let supported =
                leaf.ty.is_primitive() || leaf.ty.is_enumerated() || leaf.ty.is_string();
            if !supported {
                log::warn!("unsupported type: {}", leaf.ty.name());
                return;
            }
            if direction == Direction::Parameter && !leaf.is_key() {
                return;
            }
            let Some(kind) = LeafKind::of(leaf.ty) else {
                log::warn!("unsupported type: {}", leaf.ty.name());
                return;
            };
            let accessor = Accessor {
                key: key.clone(),
                path: leaf.path.clone(),
                kind,
            };
            match SignalDistributor::resolve_type(leaf.ty) {
                ScalarVariableType::Real => self.real.push(accessor),
                ScalarVariableType::Integer => self.integer.push(accessor),
                ScalarVariableType::Boolean => self.boolean.push(accessor),
                ScalarVariableType::String => self.string.push(accessor),
                ScalarVariableType::Unknown => {}
            }
        });
        Ok(())
    }

    fn lookup<'a>(
        table: &'a [Accessor],
        kind: &'static str,
        value_ref: u32,
    ) -> Result<&'a Accessor> {
        table.get(value_ref as usize).ok_or(FmuError::OutOfRange {
            kind,
            value_ref,
            len: table.len(),
        })
    }

    pub fn set_double(&mut self, value_ref: u32, value: f64) -> Result<()> {
        let accessor = Self::lookup(&self.real, "Real", value_ref)?;
        let data = store_mut(&mut self.store, &accessor.key)?;
        let leaf = data.leaf_mut(&accessor.path)?;
        *leaf = match accessor.kind {
            LeafKind::F32 => Value::F32(value as f32),
            LeafKind::F64 => Value::F64(value),
            LeafKind::U32 => Value::U32(value as u32),
            LeafKind::I64 => Value::I64(value as i64),
            LeafKind::U64 => Value::U64(value as u64),
            other => return Err(kind_mismatch("Real", other)),
        };
        Ok(())
    }

    pub fn get_double(&self, value_ref: u32) -> Result<f64> {
        let accessor = Self::lookup(&self.real, "Real", value_ref)?;
        let data = store_ref(&self.store, &accessor.key)?;
        Ok(match data.leaf(&accessor.path)? {
            Value::F32(v) => f64::from(*v),
            Value::F64(v) => *v,
            Value::U32(v) => f64::from(*v),
            Value::I64(v) => *v as f64,
            Value::U64(v) => *v as f64,
            other => return Err(value_mismatch("Real", other)),
        })
    }

    pub fn set_int(&mut self, value_ref: u32, value: i32) -> Result<()> {
        let accessor = Self::lookup(&self.integer, "Integer", value_ref)?;
        let data = store_mut(&mut self.store, &accessor.key)?;
        let leaf = data.leaf_mut(&accessor.path)?;
        *leaf = match accessor.kind {
            LeafKind::I8 => Value::I8(value as i8),
            LeafKind::U8 => Value::U8(value as u8),
            LeafKind::I16 => Value::I16(value as i16),
            LeafKind::U16 => Value::U16(value as u16),
            LeafKind::I32 => Value::I32(value),
            LeafKind::Enum => Value::Enum(value as u32),
            other => return Err(kind_mismatch("Integer", other)),
        };
        Ok(())
    }

    pub fn get_int(&self, value_ref: u32) -> Result<i32> {
        let accessor = Self::lookup(&self.integer, "Integer", value_ref)?;
        let data = store_ref(&self.store, &accessor.key)?;
        Ok(match data.leaf(&accessor.path)? {
            Value::I8(v) => i32::from(*v),
            Value::U8(v) => i32::from(*v),
            Value::I16(v) => i32::from(*v),
            Value::U16(v) => i32::from(*v),
            Value::I32(v) => *v,
            Value::Enum(v) => *v as i32,
            other => return Err(value_mismatch("Integer", other)),
        })
    }

    pub fn set_bool(&mut self, value_ref: u32, value: bool) -> Result<()> {
        let accessor = Self::lookup(&self.boolean, "Boolean", value_ref)?;
        let data = store_mut(&mut self.store, &accessor.key)?;
        let leaf = data.leaf_mut(&accessor.path)?;
        *leaf = match accessor.kind {
            LeafKind::Bool => Value::Bool(value),
            other => return Err(kind_mismatch("Boolean", other)),
        };
        Ok(())
    }

    pub fn get_bool(&self, value_ref: u32) -> Result<bool> {
        let accessor = Self::lookup(&self.boolean, "Boolean", value_ref)?;
        let data = store_ref(&self.store, &accessor.key)?;
        match data.leaf(&accessor.path)? {
            Value::Bool(v) => Ok(*v),
            other => Err(value_mismatch("Boolean", other)),
        }
    }

    pub fn set_string(&mut self, value_ref: u32, value: &str) -> Result<()> {
        let accessor = Self::lookup(&self.string, "String", value_ref)?;
        let data = store_mut(&mut self.store, &accessor.key)?;
        let leaf = data.leaf_mut(&accessor.path)?;
        *leaf = match accessor.kind {
            LeafKind::Str => Value::Str(value.to_string()),
            // char leaves carry exactly one character.
            LeafKind::Char => Value::Char(value.chars().next().unwrap_or('\0')),
            other => return Err(kind_mismatch("String", other)),
        };
        Ok(())
    }

    pub fn get_string(&self, value_ref: u32) -> Result<String> {
        let accessor = Self::lookup(&self.string, "String", value_ref)?;
        let data = store_ref(&self.store, &accessor.key)?;
        match data.leaf(&accessor.path)? {
            Value::Str(s) => Ok(s.clone()),
            Value::Char(c) => Ok(c.to_string()),
            other => Err(value_mismatch("String", other)),
        }
    }

    /// Direct access to a buffer, used by the pub/sub layer and the key
    /// filter.
    pub fn data_ref(&self, topic: &str, direction: Direction) -> Result<&DynamicData> {
        store_ref(&self.store, &(topic.to_string(), direction))
    }

    pub fn data_ref_mut(&mut self, topic: &str, direction: Direction) -> Result<&mut DynamicData> {
        store_mut(&mut self.store, &(topic.to_string(), direction))
    }

    /// Whether a buffer exists for the given topic and direction.
    pub fn has_data(&self, topic: &str, direction: Direction) -> bool {
        self.store.contains_key(&(topic.to_string(), direction))
    }

    /// Accessor table lengths recorded when the topic was added.
    pub fn index_offsets(&self, topic: &str, direction: Direction) -> Result<IndexOffsets> {
        self.offsets
            .get(&(topic.to_string(), direction))
            .copied()
            .ok_or_else(|| FmuError::Config(format!("no buffer for topic '{}'", topic)))
    }

    /// The IDL context loaded by the last reset.
    pub fn idl_context(&self) -> &IdlContext {
        &self.context
    }
}

fn store_ref<'a>(
    store: &'a BTreeMap<StoreKey, DynamicData>,
    key: &StoreKey,
) -> Result<&'a DynamicData> {
    store.get(key).ok_or_else(|| {
        FmuError::Config(format!(
            "no buffer for topic '{}' ({})",
            key.0,
            key.1.describe()
        ))
    })
}

fn store_mut<'a>(
    store: &'a mut BTreeMap<StoreKey, DynamicData>,
    key: &StoreKey,
) -> Result<&'a mut DynamicData> {
    store.get_mut(key).ok_or_else(|| {
        FmuError::Config(format!(
            "no buffer for topic '{}' ({})",
            key.0,
            key.1.describe()
        ))
    })
}

fn kind_mismatch(expected: &'static str, got: LeafKind) -> FmuError {
    FmuError::Config(format!(
        "accessor kind mismatch: {} table holds {:?}",
        expected, got
    ))
}

fn value_mismatch(expected: &'static str, got: &Value) -> FmuError {
    FmuError::Config(format!(
        "buffer value does not match {} accessor: {:?}",
        expected,
        std::mem::discriminant(got)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::parse_idl;

    const MIXED_IDL: &str = r#"
        enum Mode { IDLE, ACTIVE, FAULT };
        struct Mixed {
          boolean flag;
          char letter;
          int8 a; uint8 b; int16 c; uint16 d; int32 e;
          uint32 f; int64 g; uint64 h;
          float x; double y;
          string label;
          Mode mode;
        };
    "#;

    fn mapper_with(idl: &str, topic: &str, ty: &str, directions: &[Direction]) -> DataMapper {
        let mut mapper = DataMapper::new();
        mapper.context = parse_idl(idl).expect("parse");
        for d in directions {
            mapper.add(topic, ty, *d).expect("add");
        }
        mapper
    }

    #[test]
    fn cross_kind_coverage() {
        let mut mapper = mapper_with(
            MIXED_IDL,
            "m",
            "Mixed",
            &[Direction::Read, Direction::Write],
        );

        // Read buffer layout: Real <- f,g,h,x,y; Integer <- a..e,mode;
        // Boolean <- flag; String <- letter,label.
        // Populate the Read buffer through the setters of the Read-side
        // accessors (registered first, so they occupy the low references).
        mapper.set_bool(0, true).unwrap();
        mapper.set_string(0, "Z").unwrap();
        mapper.set_int(0, -8).unwrap();
        mapper.set_int(1, 200).unwrap();
        mapper.set_int(2, -3000).unwrap();
        mapper.set_int(3, 40000).unwrap();
        mapper.set_int(4, -100000).unwrap();
        mapper.set_int(5, 2).unwrap();
        mapper.set_double(0, 4_000_000_000.0).unwrap();
        mapper.set_double(1, -5.0e9).unwrap();
        mapper.set_double(2, 6.0e9).unwrap();
        mapper.set_double(3, 1.5).unwrap();
        mapper.set_double(4, -2.25).unwrap();
        mapper.set_string(1, "hello").unwrap();

        assert!(mapper.get_bool(0).unwrap());
        assert_eq!(mapper.get_string(0).unwrap(), "Z");
        assert_eq!(mapper.get_int(0).unwrap(), -8);
        assert_eq!(mapper.get_int(1).unwrap(), 200);
        assert_eq!(mapper.get_int(2).unwrap(), -3000);
        assert_eq!(mapper.get_int(3).unwrap(), 40000);
        assert_eq!(mapper.get_int(4).unwrap(), -100000);
        assert_eq!(mapper.get_int(5).unwrap(), 2);
        assert_eq!(mapper.get_double(0).unwrap(), 4_000_000_000.0);
        assert_eq!(mapper.get_double(1).unwrap(), -5.0e9);
        assert_eq!(mapper.get_double(2).unwrap(), 6.0e9);
        assert_eq!(mapper.get_double(3).unwrap(), 1.5);
        assert_eq!(mapper.get_double(4).unwrap(), -2.25);
        assert_eq!(mapper.get_string(1).unwrap(), "hello");

        // Mirror everything onto the Write buffer and compare structurally.
        let (real_off, int_off, bool_off, string_off) =
            mapper.index_offsets("m", Direction::Write).unwrap();
        for i in 0..5 {
            let v = mapper.get_double(i).unwrap();
            mapper.set_double(real_off as u32 + i, v).unwrap();
        }
        for i in 0..6 {
            let v = mapper.get_int(i).unwrap();
            mapper.set_int(int_off as u32 + i, v).unwrap();
        }
        let v = mapper.get_bool(0).unwrap();
        mapper.set_bool(bool_off as u32, v).unwrap();
        for i in 0..2 {
            let v = mapper.get_string(i).unwrap();
            mapper.set_string(string_off as u32 + i, &v).unwrap();
        }

        let read = mapper.data_ref("m", Direction::Read).unwrap();
        let write = mapper.data_ref("m", Direction::Write).unwrap();
        assert_eq!(read.value(), write.value());
    }

    #[test]
    fn out_of_range_reference_is_an_error() {
        let mapper = mapper_with("struct S { double v; };", "t", "S", &[Direction::Read]);
        assert!(mapper.get_double(0).is_ok());
        assert!(matches!(
            mapper.get_double(1),
            Err(FmuError::OutOfRange { .. })
        ));
    }

    #[test]
    fn duplicate_topic_is_fatal() {
        let mut mapper = mapper_with("struct S { double v; };", "t", "S", &[Direction::Read]);
        assert!(mapper.add("t", "S", Direction::Read).is_err());
        assert!(mapper.add("t", "S", Direction::Write).is_ok());
    }

    #[test]
    fn parameter_registers_only_keys() {
        let idl = "struct K { @key uint32 id; double v; };";
        let mapper = mapper_with(idl, "t", "K", &[Direction::Parameter]);
        // Only the key leaf id (u32 -> Real) is registered.
        assert_eq!(mapper.real.len(), 1);
        assert!(mapper.get_double(0).is_ok());
        assert!(mapper.get_double(1).is_err());
    }

    #[test]
    fn narrowing_casts_truncate() {
        let mut mapper = mapper_with(
            "struct S { uint64 ticks; };",
            "t",
            "S",
            &[Direction::Write],
        );
        mapper.set_double(0, 3.9).unwrap();
        assert_eq!(mapper.get_double(0).unwrap(), 3.0);
    }

    #[test]
    fn char_as_single_character_string() {
        let mut mapper = mapper_with("struct S { char c; };", "t", "S", &[Direction::Write]);
        mapper.set_string(0, "wave").unwrap();
        assert_eq!(mapper.get_string(0).unwrap(), "w");
    }
}
