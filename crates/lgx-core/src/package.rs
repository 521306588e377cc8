//! The package aggregate: one manifest plus the archive entry list.
//!
//! A `Package` is loaded wholly into memory. The `manifest.json` entry is
//! never stored in the entry list: it is parsed out on load and
//! materialized from the held [`Manifest`] on save. Mutation follows
//! total-replacement semantics: adding a variant that already exists drops
//! every entry under it first.
//!
//! `load` is deliberately tolerant: it only needs a decodable archive with a
//! parseable manifest, so damaged packages can still be opened for
//! diagnostics. Cross-invariants live in [`crate::verify`].

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::gzip;
use crate::manifest::Manifest;
use crate::path::{self, ArchivePath};
use crate::tar::{self, TarEntry, TarWriter};

/// Archive path of the manifest document.
pub const MANIFEST_PATH: &str = "manifest.json";

/// Root directory holding one subtree per variant.
pub const VARIANTS_DIR: &str = "variants";

/// The only entries permitted at the archive root.
pub const ALLOWED_ROOT_ENTRIES: [&str; 5] = [
    "manifest.json",
    "manifest.cose",
    "variants",
    "docs",
    "licenses",
];

/// In-memory package state.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub(crate) manifest: Manifest,
    pub(crate) entries: Vec<TarEntry>,
}

impl Package {
    /// Build a package with defaults and write it to `output`.
    ///
    /// The manifest gets the folded `name`, version `0.0.1` and otherwise
    /// empty fields; the archive holds `manifest.json` and an empty
    /// `variants` directory.
    pub fn create(output: &Path, name: &str) -> Result<Package> {
        let mut pkg = Package::default();
        pkg.manifest.name = name.to_string();
        pkg.manifest.normalize_name();
        pkg.manifest.version = "0.0.1".to_string();
        pkg.entries.push(TarEntry::directory(VARIANTS_DIR));
        pkg.save(output)?;
        Ok(pkg)
    }

    /// Read, ungzip and untar `lgx_path`, then parse the manifest out of the
    /// entry list.
    ///
    /// # Errors
    ///
    /// I/O failures, [`Error::InvalidCompression`], [`Error::InvalidArchive`]
    /// and [`Error::InvalidManifest`] (missing or malformed `manifest.json`).
    /// Cross-invariants are *not* enforced here.
    pub fn load(lgx_path: &Path) -> Result<Package> {
        let gzip_data = fs::read(lgx_path)?;
        let tar_data = gzip::decompress(&gzip_data)?;
        let mut entries = tar::read(&tar_data)?;

        let manifest_idx = entries
            .iter()
            .position(|e| e.path == MANIFEST_PATH && !e.is_directory)
            .ok_or_else(|| {
                Error::InvalidManifest(format!("{MANIFEST_PATH} not found in archive"))
            })?;
        let manifest_entry = entries.remove(manifest_idx);

        let text = String::from_utf8(manifest_entry.data)
            .map_err(|_| Error::InvalidManifest(format!("{MANIFEST_PATH} is not valid UTF-8")))?;
        let manifest = Manifest::from_json(&text)?;

        Ok(Package { manifest, entries })
    }

    /// Serialize the package to `lgx_path` as a deterministic `.lgx` file.
    ///
    /// The manifest is emitted first, every entry gets its ancestor
    /// directory chain synthesized, and a `variants` directory is added if
    /// none was present. Final ordering is the tar encoder's concern; the
    /// insertion order here only drives ancestor generation.
    pub fn save(&self, lgx_path: &Path) -> Result<()> {
        let mut writer = TarWriter::new();
        writer.add_file(MANIFEST_PATH, self.manifest.to_json()?.into_bytes());

        let mut added_dirs: HashSet<String> = HashSet::new();
        for entry in &self.entries {
            if entry.path == MANIFEST_PATH {
                continue;
            }

            for dir in ancestor_directories(&entry.path) {
                if added_dirs.insert(dir.clone()) {
                    writer.add_directory(dir);
                }
            }

            if entry.is_directory {
                let dir_path = entry.path.trim_end_matches('/').to_string();
                if added_dirs.insert(dir_path.clone()) {
                    writer.add_directory(dir_path);
                }
            } else {
                writer.add_entry(entry.clone());
            }
        }

        if !added_dirs.contains(VARIANTS_DIR) {
            writer.add_directory(VARIANTS_DIR);
        }

        let tar_data = writer.finalize()?;
        let gzip_data = gzip::compress(&tar_data)?;
        fs::write(lgx_path, gzip_data)?;
        Ok(())
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn manifest_mut(&mut self) -> &mut Manifest {
        &mut self.manifest
    }

    pub fn entries(&self) -> &[TarEntry] {
        &self.entries
    }

    /// Add or replace a variant from a file or directory on disk.
    ///
    /// The variant name is folded to lowercase. For a directory source,
    /// `main` is required and the directory contents land directly under
    /// `variants/<variant>/`; for a regular-file source, `main` defaults to
    /// the file's name. Replacement is total: every existing entry under the
    /// variant is dropped first. Symlinks, special files, hidden files,
    /// non-UTF-8 names and unreadable entries are skipped during the walk.
    pub fn add_variant(
        &mut self,
        variant: &str,
        source: &Path,
        main: Option<&str>,
    ) -> Result<()> {
        let variant_lc = path::to_lowercase(variant);
        if variant_lc.is_empty() {
            return Err(Error::Usage("variant name cannot be empty".into()));
        }

        let meta = fs::metadata(source)?;
        if !meta.is_dir() && !meta.is_file() {
            return Err(Error::Usage(format!(
                "source is not a regular file or directory: {}",
                source.display()
            )));
        }

        let resolved_main = if meta.is_dir() {
            main.ok_or_else(|| {
                Error::Usage("--main is required when the source is a directory".into())
            })?
            .to_string()
        } else {
            match main {
                Some(m) => m.to_string(),
                None => source
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::InvalidPath(format!(
                            "source file name is not valid UTF-8: {}",
                            source.display()
                        ))
                    })?,
            }
        };
        let resolved_main = ArchivePath::new(resolved_main)?;

        self.remove_variant_entries(&variant_lc);

        let variant_root = format!("{VARIANTS_DIR}/{variant_lc}");
        self.entries.push(TarEntry::directory(variant_root.clone()));

        if meta.is_dir() {
            self.ingest_tree(source, &variant_root)?;
        } else {
            let file_name = source
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    Error::InvalidPath(format!(
                        "source file name is not valid UTF-8: {}",
                        source.display()
                    ))
                })?;
            let data = fs::read(source)?;
            let archive_path = path::to_nfc(&format!("{variant_root}/{file_name}"));
            self.entries.push(TarEntry::file(archive_path, data));
        }

        self.manifest.set_main(&variant_lc, resolved_main);
        Ok(())
    }

    /// Walk `source` iteratively and insert every regular file and
    /// subdirectory under `archive_base`. Archive paths are NFC-normalized.
    fn ingest_tree(&mut self, source: &Path, archive_base: &str) -> Result<()> {
        let mut pending = VecDeque::new();
        pending.push_back((source.to_path_buf(), archive_base.to_string()));

        while let Some((dir, base)) = pending.pop_front() {
            let reader = match fs::read_dir(&dir) {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("skipping unreadable directory {}: {e}", dir.display());
                    continue;
                }
            };

            for item in reader {
                let item = match item {
                    Ok(i) => i,
                    Err(e) => {
                        log::warn!("skipping unreadable entry in {}: {e}", dir.display());
                        continue;
                    }
                };

                let name = match item.file_name().to_str() {
                    Some(n) => n.to_string(),
                    None => {
                        log::warn!(
                            "skipping non-UTF-8 file name in {}",
                            dir.display()
                        );
                        continue;
                    }
                };
                if name.starts_with('.') {
                    log::warn!("skipping hidden entry: {}", item.path().display());
                    continue;
                }

                let file_type = match item.file_type() {
                    Ok(t) => t,
                    Err(e) => {
                        log::warn!("skipping {}: {e}", item.path().display());
                        continue;
                    }
                };
                if file_type.is_symlink() {
                    log::warn!("skipping symlink: {}", item.path().display());
                    continue;
                }

                let archive_path = path::to_nfc(&format!("{base}/{name}"));

                if file_type.is_dir() {
                    self.entries.push(TarEntry::directory(archive_path.clone()));
                    pending.push_back((item.path(), archive_path));
                } else if file_type.is_file() {
                    match fs::read(item.path()) {
                        Ok(data) => self.entries.push(TarEntry::file(archive_path, data)),
                        Err(e) => {
                            log::warn!("skipping unreadable file {}: {e}", item.path().display());
                        }
                    }
                } else {
                    log::warn!("skipping special file: {}", item.path().display());
                }
            }
        }

        Ok(())
    }

    /// Remove a variant and its `main` entry.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] when no such variant exists.
    pub fn remove_variant(&mut self, variant: &str) -> Result<()> {
        let variant_lc = path::to_lowercase(variant);
        if !self.has_variant(&variant_lc) {
            return Err(Error::Usage(format!("variant does not exist: {variant}")));
        }
        self.remove_variant_entries(&variant_lc);
        self.manifest.remove_main(&variant_lc);
        Ok(())
    }

    /// Case-insensitive check against the archive tree (not the manifest).
    pub fn has_variant(&self, variant: &str) -> bool {
        let variant_lc = path::to_lowercase(variant);
        let exact = format!("{VARIANTS_DIR}/{variant_lc}");
        let prefix = format!("{exact}/");

        self.entries.iter().any(|entry| {
            let p = entry.path.trim_end_matches('/');
            p == exact || p.starts_with(&prefix)
        })
    }

    /// Lowercased, deduplicated names of variants present in the archive
    /// tree.
    pub fn variants(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for entry in &self.entries {
            let components = path::split_path(&entry.path);
            if components.len() >= 2 && components[0] == VARIANTS_DIR {
                names.insert(path::to_lowercase(components[1]));
            }
        }
        names
    }

    /// Whether setting `main[variant] = new_main` would change an existing
    /// mapping. Used by front-ends for confirmation prompts.
    pub fn would_main_change(&self, variant: &str, new_main: &str) -> bool {
        self.manifest
            .get_main(variant)
            .is_some_and(|current| current != new_main)
    }

    /// Write every entry of `variant` below `out_dir/<variant>/`.
    ///
    /// Entry paths are re-validated relative to the variant root before
    /// anything touches the filesystem, so a hostile archive cannot write
    /// outside the output directory.
    pub fn extract_variant(&self, variant: &str, out_dir: &Path) -> Result<()> {
        let variant_lc = path::to_lowercase(variant);
        if !self.has_variant(&variant_lc) {
            return Err(Error::Usage(format!("variant does not exist: {variant}")));
        }

        let variant_out = out_dir.join(&variant_lc);
        fs::create_dir_all(&variant_out)?;

        let prefix = format!("{VARIANTS_DIR}/{variant_lc}/");
        for entry in &self.entries {
            let Some(relative) = entry.path.strip_prefix(&prefix) else {
                continue;
            };
            let relative = relative.trim_end_matches('/');
            if relative.is_empty() {
                continue;
            }
            path::validate_archive_path(relative)?;

            let target = variant_out.join(relative);
            if entry.is_directory {
                fs::create_dir_all(&target)?;
            } else {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, &entry.data)?;
            }
        }

        Ok(())
    }

    /// Extract every variant below `out_dir`.
    pub fn extract_all(&self, out_dir: &Path) -> Result<()> {
        for variant in self.variants() {
            self.extract_variant(&variant, out_dir)?;
        }
        Ok(())
    }

    fn remove_variant_entries(&mut self, variant_lc: &str) {
        let exact = format!("{VARIANTS_DIR}/{variant_lc}");
        let prefix = format!("{exact}/");
        self.entries.retain(|entry| {
            let p = entry.path.trim_end_matches('/');
            p != exact && !p.starts_with(&prefix)
        });
    }
}

/// The chain of directory paths above `path`, shallowest first.
fn ancestor_directories(path: &str) -> Vec<String> {
    let components = path::split_path(path);
    let mut dirs = Vec::new();
    let mut current = String::new();
    for component in components.iter().take(components.len().saturating_sub(1)) {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(component);
        dirs.push(current.clone());
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_with(paths: &[(&str, bool)]) -> Package {
        let mut pkg = Package::default();
        for (p, is_dir) in paths {
            pkg.entries.push(if *is_dir {
                TarEntry::directory(*p)
            } else {
                TarEntry::file(*p, b"x".to_vec())
            });
        }
        pkg
    }

    #[test]
    fn test_ancestor_directories() {
        assert_eq!(
            ancestor_directories("variants/web/js/app.js"),
            vec!["variants", "variants/web", "variants/web/js"]
        );
        assert!(ancestor_directories("manifest.json").is_empty());
        assert_eq!(ancestor_directories("variants/web/"), vec!["variants"]);
    }

    #[test]
    fn test_has_variant_is_case_insensitive() {
        let pkg = package_with(&[("variants/", true), ("variants/web/app.js", false)]);
        assert!(pkg.has_variant("web"));
        assert!(pkg.has_variant("WEB"));
        assert!(!pkg.has_variant("linux-amd64"));
    }

    #[test]
    fn test_has_variant_matches_bare_directory_entry() {
        let pkg = package_with(&[("variants/web/", true)]);
        assert!(pkg.has_variant("web"));
    }

    #[test]
    fn test_variants_folds_and_dedupes() {
        let pkg = package_with(&[
            ("variants/", true),
            ("variants/Web/", true),
            ("variants/Web/app.js", false),
            ("variants/linux-amd64/lib.so", false),
        ]);
        let names: Vec<String> = pkg.variants().into_iter().collect();
        assert_eq!(names, vec!["linux-amd64", "web"]);
    }

    #[test]
    fn test_remove_variant_requires_existence() {
        let mut pkg = package_with(&[("variants/", true)]);
        let err = pkg.remove_variant("ghost").unwrap_err();
        assert!(matches!(err, Error::Usage(_)), "{err}");
    }

    #[test]
    fn test_remove_variant_drops_all_entries() {
        let mut pkg = package_with(&[
            ("variants/", true),
            ("variants/web/", true),
            ("variants/web/app.js", false),
            ("variants/other/", true),
        ]);
        pkg.manifest_mut().main.insert("web".into(), "app.js".into());

        pkg.remove_variant("WEB").unwrap();
        assert!(!pkg.has_variant("web"));
        assert!(pkg.has_variant("other"));
        assert!(pkg.manifest().get_main("web").is_none());
    }

    #[test]
    fn test_would_main_change() {
        let mut pkg = Package::default();
        assert!(!pkg.would_main_change("web", "app.js"));
        pkg.manifest_mut().main.insert("web".into(), "app.js".into());
        assert!(!pkg.would_main_change("web", "app.js"));
        assert!(pkg.would_main_change("web", "other.js"));
        assert!(pkg.would_main_change("WEB", "other.js"));
    }
}
