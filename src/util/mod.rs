//! Basic utilities: errors, typed readers, stream views, versions.

mod error;
mod reader;
mod stream;
mod version;

pub use error::{Error, Result};
pub use reader::{AssetReader, AssetWriter};
pub use stream::{ReadSeek, SegmentStream, SharedStream};
pub use version::EngineVersion;
