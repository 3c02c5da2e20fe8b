//! Container file structures: standalone assets files and bundles.

mod assets;
mod bundle;

pub use assets::{
    AssetsFile, External, ObjectInfo, ASSETS_FORMAT_VERSION, ASSETS_MAGIC,
};
pub use bundle::{
    BundleEntry, BundleFile, BundleHeader, BUNDLE_FORMAT_VERSION, BUNDLE_HEADER_SIZE,
    BUNDLE_MAGIC,
};
