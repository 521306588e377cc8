//! The package manifest: `manifest.json` at the archive root.
//!
//! Emission is deterministic: fixed schema key order, two-space indent,
//! `main` keys in ascending byte order, no trailing whitespace, no BOM.
//! Parsing is strict about shape (every required field must be present with
//! the right JSON kind) but tolerant about key casing in `main`, which is
//! folded to lowercase on load.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::path::{self, ArchivePath};

/// Manifest version written by this crate. Only major version `0` is
/// accepted on load.
pub const CURRENT_VERSION: &str = "0.1.0";

/// Structured metadata document for a package.
///
/// Field declaration order is the JSON key order. `icon` lives on the model
/// but is not part of the serialized schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    #[serde(rename = "manifestVersion")]
    pub manifest_version: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub category: String,
    pub dependencies: Vec<String>,
    /// Lowercased variant name -> entry-point path relative to the variant
    /// root. `BTreeMap` keeps emission order canonical.
    pub main: BTreeMap<String, String>,
    #[serde(skip)]
    pub icon: String,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            manifest_version: CURRENT_VERSION.to_string(),
            name: String::new(),
            version: String::new(),
            description: String::new(),
            author: String::new(),
            type_: String::new(),
            category: String::new(),
            dependencies: Vec::new(),
            main: BTreeMap::new(),
            icon: String::new(),
        }
    }
}

fn required_string(obj: &serde_json::Map<String, Value>, key: &str) -> Result<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(Error::InvalidManifest(format!(
            "missing or invalid '{key}' field"
        ))),
    }
}

impl Manifest {
    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidManifest`] naming the offending field when a required
    /// field is missing or of the wrong JSON kind, or when the document is
    /// not valid JSON.
    pub fn from_json(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| Error::InvalidManifest(format!("json parse error: {e}")))?;
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidManifest("top-level value is not an object".into()))?;

        let mut manifest = Manifest {
            manifest_version: required_string(obj, "manifestVersion")?,
            name: required_string(obj, "name")?,
            version: required_string(obj, "version")?,
            description: required_string(obj, "description")?,
            author: required_string(obj, "author")?,
            type_: required_string(obj, "type")?,
            category: required_string(obj, "category")?,
            ..Manifest::default()
        };

        let deps = match obj.get("dependencies") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::InvalidManifest(
                    "missing or invalid 'dependencies' field".into(),
                ))
            }
        };
        for dep in deps {
            match dep {
                Value::String(s) => manifest.dependencies.push(s.clone()),
                _ => {
                    return Err(Error::InvalidManifest(
                        "invalid dependency entry (not a string)".into(),
                    ))
                }
            }
        }

        let main = match obj.get("main") {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(Error::InvalidManifest(
                    "missing or invalid 'main' field".into(),
                ))
            }
        };
        for (key, value) in main {
            match value {
                Value::String(s) => {
                    manifest
                        .main
                        .insert(path::to_lowercase(key), s.clone());
                }
                _ => {
                    return Err(Error::InvalidManifest(format!(
                        "invalid main entry for '{key}' (not a string)"
                    )))
                }
            }
        }

        Ok(manifest)
    }

    /// Serialize to canonical JSON text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InvalidManifest(format!("json serialization error: {e}")))
    }

    /// Intrinsic validation: version gate, non-empty identity fields,
    /// canonical `main` keys and valid `main` paths. Errors accumulate.
    pub fn validate(&self) -> Vec<Error> {
        let mut errors = Vec::new();

        if !is_version_supported(&self.manifest_version) {
            errors.push(Error::InvalidManifest(format!(
                "unsupported manifest version: {}",
                self.manifest_version
            )));
        }
        if self.name.is_empty() {
            errors.push(Error::InvalidManifest("'name' field is empty".into()));
        }
        if self.version.is_empty() {
            errors.push(Error::InvalidManifest("'version' field is empty".into()));
        }

        for (variant, main_path) in &self.main {
            if *variant != path::to_lowercase(variant) {
                errors.push(Error::InvalidManifest(format!(
                    "variant key '{variant}' is not lowercase"
                )));
            }
            if let Err(e) = path::validate_archive_path(main_path) {
                errors.push(Error::InvalidManifest(format!(
                    "invalid main path for '{variant}': {e}"
                )));
            }
        }

        errors
    }

    /// Completeness against the set of variant directories actually present
    /// in the archive: `main` and `existing` must cover each other exactly.
    ///
    /// Names in `existing` are folded before comparison, so callers may pass
    /// raw directory names.
    pub fn validate_completeness(&self, existing: &BTreeSet<String>) -> Vec<Error> {
        let existing: BTreeSet<String> = existing.iter().map(|v| path::to_lowercase(v)).collect();
        let mut errors = Vec::new();

        for variant in self.main.keys() {
            if !existing.contains(variant) {
                errors.push(Error::InvariantViolation(format!(
                    "main[{variant}] has no corresponding variant directory"
                )));
            }
        }
        for variant in &existing {
            if !self.main.contains_key(variant) {
                errors.push(Error::InvariantViolation(format!(
                    "variant '{variant}' has no main entry"
                )));
            }
        }

        errors
    }

    /// Fold the package name to lowercase.
    pub fn normalize_name(&mut self) {
        self.name = path::to_lowercase(&self.name);
    }

    /// Add or replace the `main` entry for `variant`; the key is folded.
    pub fn set_main(&mut self, variant: &str, main_path: ArchivePath) {
        self.main
            .insert(path::to_lowercase(variant), main_path.into_string());
    }

    /// Remove the `main` entry for `variant` (case-insensitive).
    pub fn remove_main(&mut self, variant: &str) {
        self.main.remove(&path::to_lowercase(variant));
    }

    /// Look up the `main` entry for `variant` (case-insensitive).
    pub fn get_main(&self, variant: &str) -> Option<&str> {
        self.main
            .get(&path::to_lowercase(variant))
            .map(String::as_str)
    }

    /// Variant names with a `main` entry, already lowercased.
    pub fn variants(&self) -> BTreeSet<String> {
        self.main.keys().cloned().collect()
    }
}

/// Only major version `0` is supported.
pub fn is_version_supported(version: &str) -> bool {
    match version.split_once('.') {
        Some((major, _)) => major == "0",
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        let mut m = Manifest {
            name: "mypkg".into(),
            version: "0.0.1".into(),
            ..Manifest::default()
        };
        m.set_main("linux-amd64", ArchivePath::new("lib.so").unwrap());
        m
    }

    #[test]
    fn test_default_carries_current_version() {
        let m = Manifest::default();
        assert_eq!(m.manifest_version, CURRENT_VERSION);
        assert!(m.main.is_empty());
        assert!(m.dependencies.is_empty());
    }

    #[test]
    fn test_emit_canonical_form() {
        let json = sample().to_json().unwrap();
        assert_eq!(
            json,
            r#"{
  "manifestVersion": "0.1.0",
  "name": "mypkg",
  "version": "0.0.1",
  "description": "",
  "author": "",
  "type": "",
  "category": "",
  "dependencies": [],
  "main": {
    "linux-amd64": "lib.so"
  }
}"#
        );
        assert!(!json.ends_with('\n'));
        assert!(json.lines().all(|l| l == l.trim_end()));
    }

    #[test]
    fn test_emit_orders_main_keys() {
        let mut m = sample();
        m.set_main("web", ArchivePath::new("app.js").unwrap());
        m.set_main("darwin-arm64", ArchivePath::new("lib.dylib").unwrap());
        let json = m.to_json().unwrap();
        let darwin = json.find("darwin-arm64").unwrap();
        let linux = json.find("linux-amd64").unwrap();
        let web = json.find("web").unwrap();
        assert!(darwin < linux && linux < web);
    }

    #[test]
    fn test_roundtrip() {
        let m = sample();
        let parsed = Manifest::from_json(&m.to_json().unwrap()).unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn test_parse_names_missing_field() {
        let json = r#"{"manifestVersion":"0.1.0","name":"x"}"#;
        let err = Manifest::from_json(json).unwrap_err();
        assert!(
            err.to_string().contains("'version'"),
            "error should name the field: {err}"
        );
    }

    #[test]
    fn test_parse_names_mistyped_field() {
        let json = r#"{
            "manifestVersion": "0.1.0", "name": "x", "version": "1",
            "description": "", "author": "", "type": "", "category": "",
            "dependencies": "not-an-array", "main": {}
        }"#;
        let err = Manifest::from_json(json).unwrap_err();
        assert!(err.to_string().contains("'dependencies'"), "{err}");
    }

    #[test]
    fn test_parse_rejects_non_string_dependency() {
        let json = r#"{
            "manifestVersion": "0.1.0", "name": "x", "version": "1",
            "description": "", "author": "", "type": "", "category": "",
            "dependencies": [1], "main": {}
        }"#;
        let err = Manifest::from_json(json).unwrap_err();
        assert!(err.to_string().contains("dependency"), "{err}");
    }

    #[test]
    fn test_parse_rejects_non_string_main_entry() {
        let json = r#"{
            "manifestVersion": "0.1.0", "name": "x", "version": "1",
            "description": "", "author": "", "type": "", "category": "",
            "dependencies": [], "main": {"web": 42}
        }"#;
        let err = Manifest::from_json(json).unwrap_err();
        assert!(err.to_string().contains("'web'"), "{err}");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(
            Manifest::from_json("{nope"),
            Err(Error::InvalidManifest(_))
        ));
        assert!(matches!(
            Manifest::from_json("[]"),
            Err(Error::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_parse_folds_main_keys() {
        let json = r#"{
            "manifestVersion": "0.1.0", "name": "x", "version": "1",
            "description": "", "author": "", "type": "", "category": "",
            "dependencies": [], "main": {"Linux-AMD64": "lib.so"}
        }"#;
        let m = Manifest::from_json(json).unwrap();
        assert_eq!(m.get_main("linux-amd64"), Some("lib.so"));
        assert_eq!(m.get_main("LINUX-amd64"), Some("lib.so"));
        assert!(m.main.contains_key("linux-amd64"));
    }

    #[test]
    fn test_normalize_name() {
        let mut m = sample();
        m.name = "MyPkg".into();
        m.normalize_name();
        assert_eq!(m.name, "mypkg");
    }

    #[test]
    fn test_version_gate() {
        assert!(is_version_supported("0.1.0"));
        assert!(is_version_supported("0.9"));
        assert!(!is_version_supported("1.0.0"));
        assert!(!is_version_supported("2.0"));
        assert!(!is_version_supported("0"));
        assert!(!is_version_supported(""));
    }

    #[test]
    fn test_validate_accumulates() {
        let mut m = Manifest {
            manifest_version: "1.0.0".into(),
            ..Manifest::default()
        };
        m.main.insert("WEB".into(), "/abs".into());
        let errors = m.validate();
        let text: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert!(text.iter().any(|e| e.contains("unsupported manifest version")));
        assert!(text.iter().any(|e| e.contains("'name' field is empty")));
        assert!(text.iter().any(|e| e.contains("'version' field is empty")));
        assert!(text.iter().any(|e| e.contains("not lowercase")));
        assert!(text.iter().any(|e| e.contains("invalid main path")));
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample().validate().is_empty());
    }

    #[test]
    fn test_completeness_both_directions() {
        let m = sample();

        let present: BTreeSet<String> = ["linux-amd64".to_string()].into();
        assert!(m.validate_completeness(&present).is_empty());

        // Case-insensitive probe.
        let present: BTreeSet<String> = ["Linux-AMD64".to_string()].into();
        assert!(m.validate_completeness(&present).is_empty());

        let missing_dir = m.validate_completeness(&BTreeSet::new());
        assert_eq!(missing_dir.len(), 1);
        assert!(missing_dir[0].to_string().contains("main[linux-amd64]"));

        let present: BTreeSet<String> =
            ["linux-amd64".to_string(), "orphan".to_string()].into();
        let missing_main = m.validate_completeness(&present);
        assert_eq!(missing_main.len(), 1);
        assert!(missing_main[0].to_string().contains("'orphan'"));
    }
}
