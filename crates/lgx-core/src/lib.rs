//! LGX package files: a deterministic multi-variant distribution container.
//!
//! An `.lgx` file is a gzip-compressed USTAR archive holding a JSON manifest
//! (`manifest.json`) and one directory tree per build variant under
//! `variants/`. Two packages built from the same logical inputs are
//! byte-identical on disk: the tar encoder zeroes all host metadata and sorts
//! entries canonically, and the gzip framer pins every header byte.
//!
//! # Modules
//!
//! - [`path`]: archive path rules (NFC, POSIX separators, traversal checks)
//! - [`tar`]: deterministic USTAR encoder and restrictive decoder
//! - [`gzip`]: fixed-header gzip framing over raw deflate
//! - [`manifest`]: the `manifest.json` document model
//! - [`package`]: the package aggregate and its mutation API
//! - [`verify`]: cross-layer consistency checks
//!
//! # Example
//!
//! ```no_run
//! use lgx_core::Package;
//!
//! let path = std::path::Path::new("mypkg.lgx");
//! Package::create(path, "mypkg").unwrap();
//!
//! let mut pkg = Package::load(path).unwrap();
//! pkg.add_variant("linux-amd64", std::path::Path::new("./lib.so"), None).unwrap();
//! pkg.save(path).unwrap();
//!
//! let report = lgx_core::verify(path);
//! assert!(report.is_valid());
//! ```

pub mod error;
pub mod gzip;
pub mod manifest;
pub mod package;
pub mod path;
pub mod tar;
pub mod verify;

// Convenience re-exports
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use package::Package;
pub use path::ArchivePath;
pub use tar::TarEntry;
pub use verify::{verify, VerifyReport};
