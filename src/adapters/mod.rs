// Adapters layer: concrete implementations of the domain ports (filesystem, renderer, package).

pub mod package;
pub mod render;
pub mod storage;

pub use package::ApkgExporter;
pub use render::{MapRenderer, RenderStyle};
pub use storage::LocalStorage;
