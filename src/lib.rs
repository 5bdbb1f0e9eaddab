pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{toml_config::TomlConfig, RunConfig};

pub use adapters::{ApkgExporter, LocalStorage, MapRenderer, RenderStyle};
pub use core::{engine::DeckEngine, pipeline::DeckPipeline};
pub use domain::model::{RenderPolicy, RunReport};
pub use utils::error::{GeoDeckError, Result};
