// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! Signal distribution: from mapped topic types to the FMI signal table.
//!
//! The distributor walks every requested topic type depth-first and emits
//! one table entry per admissible leaf (primitive, enumeration or string).
//! Value references are dense and zero-based per FMI kind. The caller is
//! responsible for ordering: outputs first, inputs second, then the queued
//! key parameters, which makes the `<ModelStructure>` output indices simply
//! `1..=outputs()`.

use std::collections::VecDeque;
use std::path::Path;

use log::warn;

use crate::config::ScalarVariableType;
use crate::idl::{self, IdlContext};
use crate::xtypes::{for_each_leaf, DynamicType, PrimitiveKind};

/// Whether a mapped topic feeds an input, an output, or the key parameters
/// of a filtered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Input,
    Output,
    Parameter,
}

/// One row of the signal table.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInfo {
    pub value_ref: u32,
    pub name: String,
    pub causality: String,
    pub ty: ScalarVariableType,
}

/// Builds the signal table and output count for the model description.
#[derive(Default)]
pub struct SignalDistributor {
    context: IdlContext,
    real_idx: u32,
    integer_idx: u32,
    boolean_idx: u32,
    string_idx: u32,
    outputs: u32,
    mapping: Vec<SignalInfo>,
    potential_keys: VecDeque<(String, String)>,
}

impl SignalDistributor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the FMI kind of a leaf type.
    ///
    /// Wide integers map to Real: FMI 2.0 Integer is 32-bit signed, and
    /// widening to double keeps values exact up to 2^53 and preserves
    /// ordering.
    pub fn resolve_type(ty: &DynamicType) -> ScalarVariableType {
        match ty.resolved() {
            DynamicType::Primitive(p) => match p {
                PrimitiveKind::Bool => ScalarVariableType::Boolean,
                PrimitiveKind::I8
                | PrimitiveKind::U8
                | PrimitiveKind::I16
                | PrimitiveKind::U16
                | PrimitiveKind::I32 => ScalarVariableType::Integer,
                PrimitiveKind::U32
                | PrimitiveKind::I64
                | PrimitiveKind::U64
                | PrimitiveKind::F32
                | PrimitiveKind::F64 => ScalarVariableType::Real,
                PrimitiveKind::Char => ScalarVariableType::String,
                PrimitiveKind::F128 | PrimitiveKind::WChar => ScalarVariableType::Unknown,
            },
            DynamicType::Str { .. } => ScalarVariableType::String,
            DynamicType::Enum(_) => ScalarVariableType::Integer,
            _ => ScalarVariableType::Unknown,
        }
    }

    /// Load the IDL files from the FMU resources folder.
    pub fn load_idls(&mut self, resource_path: &Path) -> crate::Result<()> {
        self.context = idl::load_fmu_idls(resource_path)?;
        Ok(())
    }

    /// Whether the registry holds a structure under the scoped name.
    pub fn has_structure(&self, topic_type: &str) -> bool {
        self.context.has_structure(topic_type)
    }

    /// Walk a topic type and append its signals.
    ///
    /// The structured name is `<prefix>.<topic>.<leaf name>` where the
    /// prefix encodes the causality: `sub` for outputs, `pub` for inputs,
    /// `key.sub` for parameters. For `Parameter` only `@key` leaves
    /// contribute. Unsupported leaf kinds are logged and skipped.
    pub fn add(&mut self, topic_name: &str, topic_type: &str, cardinal: Cardinality) -> crate::Result<()> {
        let ty = self.context.structure(topic_type)?.clone();
        let (causality, prefix) = match cardinal {
            Cardinality::Input => ("input", "pub."),
            Cardinality::Output => ("output", "sub."),
            Cardinality::Parameter => ("parameter", "key.sub."),
        };

        for_each_leaf(&ty, |leaf| {
            let supported = leaf.ty.is_primitive() || leaf.ty.is_enumerated() || leaf.ty.is_string();
            if !supported {
                warn!("unsupported type: {}", leaf.ty.name());
                return;
            }
            if cardinal == Cardinality::Parameter && !leaf.is_key() {
                return;
            }

            let fmi_type = Self::resolve_type(leaf.ty);
            let idx = match fmi_type {
                ScalarVariableType::Real => &mut self.real_idx,
                ScalarVariableType::Integer => &mut self.integer_idx,
                ScalarVariableType::Boolean => &mut self.boolean_idx,
                ScalarVariableType::String => &mut self.string_idx,
                ScalarVariableType::Unknown => {
                    warn!("unsupported type: {}", leaf.ty.name());
                    return;
                }
            };
            let value_ref = *idx;
            *idx += 1;
            if cardinal == Cardinality::Output {
                self.outputs += 1;
            }
            self.mapping.push(SignalInfo {
                value_ref,
                name: format!("{}{}.{}", prefix, topic_name, leaf.structured_name()),
                causality: causality.to_string(),
                ty: fmi_type,
            });
        });
        Ok(())
    }

    /// Defer a topic's key parameters until all outputs and inputs have
    /// been added, so parameter value references sit after all live
    /// signals. Run [`Self::process_key_queue`] afterwards.
    pub fn queue_for_key_parameter(&mut self, topic_name: &str, topic_type: &str) {
        self.potential_keys
            .push_back((topic_name.to_string(), topic_type.to_string()));
    }

    /// Materialize the queued key parameters.
    pub fn process_key_queue(&mut self) -> crate::Result<()> {
        while let Some((topic, ty)) = self.potential_keys.pop_front() {
            self.add(&topic, &ty, Cardinality::Parameter)?;
        }
        Ok(())
    }

    /// The signal table, in emission order.
    pub fn get_mapping(&self) -> &[SignalInfo] {
        &self.mapping
    }

    /// Number of scalar FMU outputs.
    pub fn outputs(&self) -> u32 {
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::parse_idl;

    fn distributor_with(idl: &str) -> SignalDistributor {
        let mut d = SignalDistributor::new();
        d.context = parse_idl(idl).expect("parse");
        d
    }

    const IDL: &str = r#"
        struct Roundtrip { double val; };
        struct Keyed {
          @key uint32 id;
          double measurement;
          string label;
        };
    "#;

    #[test]
    fn outputs_before_inputs_before_parameters() {
        let mut d = distributor_with(IDL);
        d.add("out_topic", "Keyed", Cardinality::Output).unwrap();
        d.queue_for_key_parameter("out_topic", "Keyed");
        d.add("in_topic", "Roundtrip", Cardinality::Input).unwrap();
        d.process_key_queue().unwrap();

        let causalities: Vec<_> = d.get_mapping().iter().map(|s| s.causality.as_str()).collect();
        assert_eq!(
            causalities,
            vec!["output", "output", "output", "input", "parameter"]
        );
        assert_eq!(d.outputs(), 3);
    }

    #[test]
    fn value_references_are_dense_per_kind() {
        let mut d = distributor_with(IDL);
        d.add("a", "Keyed", Cardinality::Output).unwrap();
        d.add("b", "Roundtrip", Cardinality::Input).unwrap();

        // Keyed: id (u32 -> Real 0), measurement (Real 1), label (String 0);
        // Roundtrip: val (Real 2).
        let reals: Vec<_> = d
            .get_mapping()
            .iter()
            .filter(|s| s.ty == ScalarVariableType::Real)
            .map(|s| s.value_ref)
            .collect();
        assert_eq!(reals, vec![0, 1, 2]);
        let strings: Vec<_> = d
            .get_mapping()
            .iter()
            .filter(|s| s.ty == ScalarVariableType::String)
            .map(|s| s.value_ref)
            .collect();
        assert_eq!(strings, vec![0]);
    }

    #[test]
    fn names_carry_cardinality_prefix() {
        let mut d = distributor_with(IDL);
        d.add("nav", "Keyed", Cardinality::Output).unwrap();
        d.add("cmd", "Roundtrip", Cardinality::Input).unwrap();
        d.queue_for_key_parameter("nav", "Keyed");
        d.process_key_queue().unwrap();

        let names: Vec<_> = d.get_mapping().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "sub.nav.id",
                "sub.nav.measurement",
                "sub.nav.label",
                "pub.cmd.val",
                "key.sub.nav.id",
            ]
        );
    }

    #[test]
    fn parameter_only_admits_key_leaves() {
        let mut d = distributor_with(IDL);
        d.add("nav", "Keyed", Cardinality::Parameter).unwrap();
        assert_eq!(d.get_mapping().len(), 1);
        assert_eq!(d.get_mapping()[0].name, "key.sub.nav.id");
        assert_eq!(d.outputs(), 0);
    }

    #[test]
    fn wide_integers_map_to_real() {
        let mut d = distributor_with(
            "struct Wide { uint32 a; int64 b; uint64 c; float e; double f; int32 g; };",
        );
        d.add("t", "Wide", Cardinality::Output).unwrap();
        let kinds: Vec<_> = d.get_mapping().iter().map(|s| s.ty).collect();
        assert_eq!(
            kinds,
            vec![
                ScalarVariableType::Real,
                ScalarVariableType::Real,
                ScalarVariableType::Real,
                ScalarVariableType::Real,
                ScalarVariableType::Real,
                ScalarVariableType::Integer,
            ]
        );
    }

    #[test]
    fn unsupported_kinds_are_skipped() {
        let mut d = distributor_with("struct S { sequence<double> xs; double ok; };");
        d.add("t", "S", Cardinality::Output).unwrap();
        assert_eq!(d.get_mapping().len(), 1);
        assert_eq!(d.get_mapping()[0].name, "sub.t.ok");
    }
}
