// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! FMU GUID computation.
//!
//! The GUID is a name-based UUID (v5) over the concatenated contents of
//! every configuration file plus optional extra strings. Before hashing,
//! the byte stream is normalized: all ASCII whitespace goes away, and any
//! existing `guid="..."` attribute is stripped so that regenerating a
//! model description does not change its own fingerprint.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::warn;
use regex::Regex;
use uuid::Uuid;

use super::ConfigError;

/// Namespace for the v5 UUID derivation.
pub const GUID_NAMESPACE: Uuid = uuid::uuid!("1a9ff216-b23c-24a7-ff73-e4e6d3ab3dcd");

fn strip_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\s+|\r|\n|guid *= *"[-0-9a-f]{36}"|guid *= *"[-0-9a-z]{36}""#)
            .expect("static regex literal")
    })
}

/// Create a UUID from a list of files and a list of strings.
///
/// Missing files are skipped with a warning, matching the behavior of the
/// repacker on partially staged trees. The result is idempotent in its
/// inputs and invariant under whitespace reshuffling and `guid` attribute
/// replacement.
pub fn generate_uuid(files: &[PathBuf], strings: &[String]) -> Result<String, ConfigError> {
    let mut buffer = String::new();
    for path in files {
        if !path.is_file() {
            warn!("file does not exist, skipping: {}", path.display());
            continue;
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        buffer.push_str(&contents);
    }
    for s in strings {
        buffer.push_str(s);
    }
    let filtered = strip_re().replace_all(&buffer, "");
    Ok(Uuid::new_v5(&GUID_NAMESPACE, filtered.as_bytes()).to_string())
}

/// List the files under `<fmu_root>/resources/config/` that feed the GUID:
/// every `.idl`, `.xml` and `.yml`, recursively, in stable path order.
/// Optionally appends the root `modelDescription.xml`.
pub fn uuid_files(fmu_root: &Path, skip_model_description: bool) -> Vec<PathBuf> {
    let config_dir = fmu_root.join("resources").join("config");
    let mut files = Vec::new();
    if config_dir.exists() {
        collect(&config_dir, &mut files);
        files.sort();
    } else {
        warn!("expected path does not exist: {}", config_dir.display());
    }
    if !skip_model_description {
        files.push(fmu_root.join("modelDescription.xml"));
    }
    files
}

fn collect(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(&path, out);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("idl" | "xml" | "yml")
        ) {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_in_inputs() {
        let strings = vec!["struct A { double x; };".to_string()];
        let a = generate_uuid(&[], &strings).expect("uuid");
        let b = generate_uuid(&[], &strings).expect("uuid");
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_is_insignificant() {
        let a = generate_uuid(&[], &["struct A { double x; };".into()]).expect("uuid");
        let b = generate_uuid(&[], &["struct A {\n  double x;\r\n};\n".into()]).expect("uuid");
        assert_eq!(a, b);
    }

    #[test]
    fn guid_attribute_is_stripped() {
        let with_old = r#"<fmi guid="0f0a1c2d-3e4f-5061-7283-94a5b6c7d8e9" x="1"/>"#;
        let with_new = r#"<fmi guid="ffffffff-ffff-ffff-ffff-ffffffffffff" x="1"/>"#;
        let a = generate_uuid(&[], &[with_old.into()]).expect("uuid");
        let b = generate_uuid(&[], &[with_new.into()]).expect("uuid");
        assert_eq!(a, b);
    }

    #[test]
    fn file_order_is_stable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("resources").join("config");
        std::fs::create_dir_all(config.join("idl")).expect("mkdir");
        std::fs::write(config.join("idl").join("b.idl"), "struct B {};").expect("write");
        std::fs::write(config.join("idl").join("a.idl"), "struct A {};").expect("write");
        std::fs::write(config.join("skip.txt"), "ignored").expect("write");
        let files = uuid_files(dir.path(), true);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.idl", "b.idl"]);
    }
}
