#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::render::RenderStyle;
use crate::core::bounds::BoundsSettings;
use crate::core::ConfigProvider;
use crate::domain::model::{RenderPolicy, TagColor};
use crate::domain::ports::EmptyDeckPolicy;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_existing_file, validate_non_empty_string, validate_path, validate_range, Validate,
};

pub const DEFAULT_INPUT_PATH: &str = "locs.json";
pub const DEFAULT_OUTPUT_PATH: &str = "deck.apkg";
pub const DEFAULT_RENDER_WORKERS: usize = 4;

/// Fully resolved options for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input_path: String,
    pub deck_name: Option<String>,
    pub output_path: String,
    pub render_policy: RenderPolicy,
    pub render_workers: usize,
    pub bounds: BoundsSettings,
    pub style: RenderStyle,
    pub default_color: TagColor,
    pub id_seed: Option<u64>,
    pub empty_deck_policy: EmptyDeckPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: DEFAULT_INPUT_PATH.to_string(),
            deck_name: None,
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            render_policy: RenderPolicy::default(),
            render_workers: DEFAULT_RENDER_WORKERS,
            bounds: BoundsSettings::default(),
            style: RenderStyle::default(),
            default_color: TagColor::BLACK,
            id_seed: None,
            empty_deck_policy: EmptyDeckPolicy::default(),
        }
    }
}

impl ConfigProvider for RunConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn deck_name(&self) -> Option<&str> {
        self.deck_name.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn render_policy(&self) -> RenderPolicy {
        self.render_policy
    }

    fn render_workers(&self) -> usize {
        self.render_workers
    }

    fn bounds_settings(&self) -> BoundsSettings {
        self.bounds
    }

    fn default_color(&self) -> TagColor {
        self.default_color
    }

    fn id_seed(&self) -> Option<u64> {
        self.id_seed
    }

    fn empty_deck_policy(&self) -> EmptyDeckPolicy {
        self.empty_deck_policy
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_existing_file("input", &self.input_path)?;
        validate_path("output", &self.output_path)?;
        if let Some(name) = &self.deck_name {
            validate_non_empty_string("deck", name)?;
        }

        validate_range("render.workers", self.render_workers, 1, 64)?;
        validate_range("render.width", self.style.width, 64, 4096)?;
        validate_range("render.height", self.style.height, 64, 4096)?;
        validate_range("render.marker_radius", self.style.marker_radius, 1, 64)?;

        self.bounds.validate()?;

        Ok(())
    }
}
