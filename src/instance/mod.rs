//! Guarded container and bundle instances.
//!
//! An instance pairs one parsed file structure with its backing stream
//! behind a single per-instance lock. The only public access is "run
//! this closure with exclusive access", preserving all-or-nothing
//! granularity without exposing interior references.

mod assets;
mod bundle;

pub use assets::AssetsFileInstance;
pub use bundle::BundleFileInstance;
