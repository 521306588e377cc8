//! Cross-layer consistency checks between the manifest and the archive tree.
//!
//! Verification never short-circuits: every failed check lands in the
//! report. The `warnings` list is empty in this revision and exists for
//! forward compatibility.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::Error;
use crate::package::{Package, ALLOWED_ROOT_ENTRIES, VARIANTS_DIR};
use crate::path;

/// Outcome of a verification pass.
#[derive(Debug, Default)]
pub struct VerifyReport {
    pub errors: Vec<Error>,
    pub warnings: Vec<String>,
}

impl VerifyReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Load the package at `lgx_path` and check every cross-invariant.
///
/// A package that fails to load yields a report carrying the load error;
/// nothing is enforced at load time, so structurally decodable but invalid
/// packages get a full invariant report.
pub fn verify(lgx_path: &Path) -> VerifyReport {
    match Package::load(lgx_path) {
        Ok(pkg) => verify_package(&pkg),
        Err(e) => VerifyReport {
            errors: vec![e],
            warnings: Vec::new(),
        },
    }
}

/// Check an in-memory package against every cross-invariant.
///
/// The `manifest.json` invariant is structural here: holding a `Package`
/// means the manifest was present and parseable.
pub fn verify_package(pkg: &Package) -> VerifyReport {
    let mut errors = pkg.manifest().validate();

    let mut has_variants_dir = false;
    let mut variant_dirs: BTreeSet<String> = BTreeSet::new();

    for entry in pkg.entries() {
        let root = path::root_component(&entry.path);

        if !ALLOWED_ROOT_ENTRIES.contains(&root) {
            errors.push(Error::InvariantViolation(format!(
                "forbidden root entry: {root}"
            )));
        }

        if root == VARIANTS_DIR {
            let components = path::split_path(&entry.path);

            if components.len() == 1 && entry.is_directory {
                has_variants_dir = true;
            }

            if components.len() == 2 && !entry.is_directory {
                errors.push(Error::InvariantViolation(format!(
                    "regular file directly under {VARIANTS_DIR}/: {}",
                    entry.path
                )));
            }

            // A name counts as a variant directory when it is one, or when
            // deeper entries imply it.
            if components.len() >= 2 && (entry.is_directory || components.len() >= 3) {
                variant_dirs.insert(path::to_lowercase(components[1]));
            }
        }

        if let Err(e) = path::validate_archive_path(entry.path.trim_end_matches('/')) {
            errors.push(e);
        }
    }

    if !has_variants_dir {
        errors.push(Error::InvariantViolation(format!(
            "missing {VARIANTS_DIR}/ directory"
        )));
    }

    errors.extend(pkg.manifest().validate_completeness(&variant_dirs));

    for (variant, main_path) in &pkg.manifest().main {
        let full = format!("{VARIANTS_DIR}/{variant}/{main_path}");
        let found = pkg
            .entries()
            .iter()
            .any(|e| !e.is_directory && e.path.trim_end_matches('/') == full);
        if !found {
            errors.push(Error::InvariantViolation(format!(
                "main[{variant}] points to non-existent file: {main_path}"
            )));
        }
    }

    VerifyReport {
        errors,
        warnings: Vec::new(),
    }
}
