pub mod error;
pub mod extract;
pub mod import;
pub mod layout;
pub mod maintenance;
pub mod manifest;
pub mod naming;
pub mod probe;
pub mod register;
pub mod size;
pub mod tools;

pub use error::{BatchError, ImportError, ManifestError, ToolError};
pub use import::{BatchReport, Importer, InputOutcome};
pub use layout::GalleryLayout;
pub use manifest::{Category, GalleryItem, GalleryManifest, ManifestStore, Upsert};
pub use size::{format_size, ItemSize};
pub use tools::{Tool, Toolchain};
