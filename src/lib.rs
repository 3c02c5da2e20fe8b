//! # atomic-assets
//!
//! Thread-safe manager for binary game-asset containers: standalone
//! assets files, bundle archives, and the class databases that describe
//! their object schemas.
//!
//! The [`manager::AssetsManager`] is the entry point. It deduplicates
//! containers by canonical path, resolves cross-file dependencies
//! lazily and memoized, addresses bundle members as bounded sub-streams
//! over the archive's data region, and caches derived schema templates
//! per class and per instance. Every registry, cache and instance is
//! internally synchronized; callers never take locks.
//!
//! ## Modules
//!
//! - [`util`] - Errors, typed little-endian IO, stream views, versions
//! - [`sync`] - Synchronized sequence/mapping primitives
//! - [`cldb`] - Class database ("CLDB") codec and packages
//! - [`format`] - Assets-file and bundle-file structures
//! - [`instance`] - Lock-guarded container/bundle instances
//! - [`manager`] - The registry, derived caches, load/unload cascade
//!
//! ## Example
//!
//! ```ignore
//! use atomic_assets::prelude::*;
//!
//! let manager = AssetsManager::new();
//! let bundle = manager.load_bundle_file_path("level0.bundle", true)?;
//! if let Some(member) = manager.load_assets_file_from_bundle(&bundle, 0, true)? {
//!     println!("{} externals", member.with_file(|f| f.externals.len())?);
//! }
//! ```

pub mod cldb;
pub mod format;
pub mod instance;
pub mod manager;
pub mod sync;
pub mod util;

// Re-export commonly used types
pub use manager::AssetsManager;
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cldb::{ClassDatabase, ClassPackage, CompressionKind};
    pub use crate::instance::{AssetsFileInstance, BundleFileInstance};
    pub use crate::manager::{AssetsManager, TemplateField, TypeReference};
    pub use crate::util::{
        AssetReader, AssetWriter, EngineVersion, Error, Result, SegmentStream, SharedStream,
    };
}
