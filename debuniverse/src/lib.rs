//! The Debian-style package universe: `Packages`/`Release` parsing,
//! priority and status modeling, and dependency-closure resolution.
//!
//! This crate is the "package universe library" boundary: the
//! orchestration binary (`cdebootstrap-rs`) consumes only the public API
//! below and never reaches into RFC-822 parsing details itself.

pub mod dependency;
pub mod error;
pub mod package;
pub mod priority;
pub mod release;
pub mod rfc822;
pub mod status;
pub mod table;

pub use dependency::{Dependency, DependencyGroup};
pub use error::UniverseError;
pub use package::{parse_packages, Package};
pub use priority::Priority;
pub use release::{parse_release, Release, ReleaseFileEntry};
pub use status::Status;
pub use table::PackageTable;
