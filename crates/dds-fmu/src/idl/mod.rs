// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! IDL parsing into a scoped type registry.
//!
//! The parser understands the subset of IDL 4.2 the FMU configuration
//! uses: modules, structs, enums, typedefs, unions, fixed multi-dimensional
//! arrays, bounded and unbounded strings, sequences, maps and the member
//! annotations `@key` and `@optional`. Sequences, maps, wstrings and the
//! wide/128-bit primitives parse fine but are rejected later, when a
//! mapped topic type tries to turn them into FMI variables or wire types.
//!
//! `#include` directives are resolved textually against a list of include
//! directories before tokenization.

mod lexer;
mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::xtypes::DynamicType;

pub use parser::parse_idl;

/// A single parser diagnostic with its source line.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Errors from loading or parsing IDL files.
#[derive(Debug)]
pub enum IdlError {
    /// The entry IDL file (or an include) could not be read.
    Io(PathBuf, std::io::Error),
    /// An include directive did not resolve against the include paths.
    IncludeNotFound(String),
    /// Parsing failed; all diagnostics are concatenated.
    Parse(Vec<Diagnostic>),
    /// A scoped name lookup failed.
    UnknownType(String),
}

impl fmt::Display for IdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "could not read IDL file {}: {}", path.display(), e),
            Self::IncludeNotFound(name) => write!(f, "include not found: {}", name),
            Self::Parse(diags) => {
                write!(f, "failed to parse IDL files:")?;
                for d in diags {
                    write!(f, "\n  {}", d)?;
                }
                Ok(())
            }
            Self::UnknownType(name) => write!(f, "unknown IDL type: {}", name),
        }
    }
}

impl std::error::Error for IdlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

/// Immutable registry of parsed types keyed by fully scoped name
/// (`My::Impl`). Created at reset, dropped at teardown.
#[derive(Debug, Default, Clone)]
pub struct IdlContext {
    types: BTreeMap<String, Arc<DynamicType>>,
}

impl IdlContext {
    pub(crate) fn from_types(types: BTreeMap<String, Arc<DynamicType>>) -> Self {
        Self { types }
    }

    /// Whether a structure is registered under the scoped name.
    pub fn has_structure(&self, scoped_name: &str) -> bool {
        self.types
            .get(scoped_name)
            .is_some_and(|ty| matches!(ty.resolved(), DynamicType::Struct(_)))
    }

    /// Look up a structure by scoped name.
    pub fn structure(&self, scoped_name: &str) -> Result<&Arc<DynamicType>, IdlError> {
        self.types
            .get(scoped_name)
            .filter(|ty| matches!(ty.resolved(), DynamicType::Struct(_)))
            .ok_or_else(|| IdlError::UnknownType(scoped_name.to_string()))
    }

    /// Look up any registered type by scoped name.
    pub fn lookup(&self, scoped_name: &str) -> Option<&Arc<DynamicType>> {
        self.types.get(scoped_name)
    }

    /// Iterate all scoped types in name order.
    pub fn types(&self) -> impl Iterator<Item = (&str, &Arc<DynamicType>)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Inline `#include` directives, depth-first, each file at most once.
fn preprocess(
    source: &str,
    origin_dir: Option<&Path>,
    include_dirs: &[PathBuf],
    seen: &mut Vec<PathBuf>,
    out: &mut String,
) -> Result<(), IdlError> {
    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("#include") {
            let name = rest
                .trim()
                .trim_matches(|c| c == '"' || c == '<' || c == '>')
                .to_string();
            let mut candidates: Vec<PathBuf> = Vec::new();
            if let Some(dir) = origin_dir {
                candidates.push(dir.join(&name));
            }
            for dir in include_dirs {
                candidates.push(dir.join(&name));
            }
            let found = candidates.into_iter().find(|p| p.is_file());
            let Some(path) = found else {
                return Err(IdlError::IncludeNotFound(name));
            };
            let canonical = path.canonicalize().unwrap_or(path.clone());
            if seen.contains(&canonical) {
                out.push('\n');
                continue;
            }
            seen.push(canonical);
            let text =
                std::fs::read_to_string(&path).map_err(|e| IdlError::Io(path.clone(), e))?;
            preprocess(&text, path.parent(), include_dirs, seen, out)?;
        } else if trimmed.starts_with('#') {
            // Other preprocessor directives are ignored.
            out.push('\n');
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(())
}

/// Parse an IDL file with includes resolved against `include_dirs`.
pub fn parse_file(entry: &Path, include_dirs: &[PathBuf]) -> Result<IdlContext, IdlError> {
    let source =
        std::fs::read_to_string(entry).map_err(|e| IdlError::Io(entry.to_path_buf(), e))?;
    let mut seen = vec![entry.canonicalize().unwrap_or_else(|_| entry.to_path_buf())];
    let mut flattened = String::new();
    preprocess(&source, entry.parent(), include_dirs, &mut seen, &mut flattened)?;
    parse_idl(&flattened)
}

/// Load the FMU's IDL entry file from its resources folder.
///
/// The entry is `<resources>/config/idl/dds-fmu.idl`, with the `idl`
/// directory as include path. A missing entry file or any parse error is
/// fatal.
pub fn load_fmu_idls(resource_path: &Path) -> Result<IdlContext, IdlError> {
    let idl_dir = resource_path.join("config").join("idl");
    let entry = idl_dir.join("dds-fmu.idl");
    if !entry.is_file() {
        return Err(IdlError::Io(
            entry.clone(),
            std::io::Error::new(std::io::ErrorKind::NotFound, "main IDL file does not exist"),
        ));
    }
    parse_file(&entry, &[idl_dir])
}
