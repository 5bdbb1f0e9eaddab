use crate::config::RunConfig;
use crate::domain::model::{RenderPolicy, TagColor};
use crate::domain::ports::EmptyDeckPolicy;
use crate::utils::error::{GeoDeckError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Optional settings file. Every section and key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub input: InputSection,
    pub deck: DeckSection,
    pub render: RenderSection,
    pub bounds: BoundsSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckSection {
    pub name: Option<String>,
    pub empty_deck: Option<EmptyDeckPolicy>,
    pub id_seed: Option<u64>,
    pub default_color: Option<TagColor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    pub policy: Option<RenderPolicy>,
    pub workers: Option<usize>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub marker_radius: Option<u32>,
    pub water_color: Option<TagColor>,
    pub grid_color: Option<TagColor>,
    pub frame_color: Option<TagColor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoundsSection {
    pub degree_padding: Option<f64>,
    pub metric_padding_ratio: Option<f64>,
    pub metric_padding_min: Option<f64>,
    pub metric_padding_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub path: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| GeoDeckError::ConfigError {
            message: format!("cannot read config file {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| GeoDeckError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DECK_NAME})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// Overlays every key present in the file onto `config`.
    pub fn apply_to(&self, config: &mut RunConfig) {
        if let Some(path) = &self.input.path {
            config.input_path = path.clone();
        }
        if let Some(path) = &self.output.path {
            config.output_path = path.clone();
        }

        if let Some(name) = &self.deck.name {
            config.deck_name = Some(name.clone());
        }
        if let Some(policy) = self.deck.empty_deck {
            config.empty_deck_policy = policy;
        }
        if let Some(seed) = self.deck.id_seed {
            config.id_seed = Some(seed);
        }
        if let Some(color) = self.deck.default_color {
            config.default_color = color;
        }

        let render = &self.render;
        if let Some(policy) = render.policy {
            config.render_policy = policy;
        }
        if let Some(workers) = render.workers {
            config.render_workers = workers;
        }
        let style = &mut config.style;
        style.width = render.width.unwrap_or(style.width);
        style.height = render.height.unwrap_or(style.height);
        style.marker_radius = render.marker_radius.unwrap_or(style.marker_radius);
        style.water_color = render.water_color.unwrap_or(style.water_color);
        style.grid_color = render.grid_color.unwrap_or(style.grid_color);
        style.frame_color = render.frame_color.unwrap_or(style.frame_color);

        let bounds = &mut config.bounds;
        bounds.degree_padding = self.bounds.degree_padding.unwrap_or(bounds.degree_padding);
        bounds.metric_padding_ratio = self
            .bounds
            .metric_padding_ratio
            .unwrap_or(bounds.metric_padding_ratio);
        bounds.metric_padding_min = self
            .bounds
            .metric_padding_min
            .unwrap_or(bounds.metric_padding_min);
        bounds.metric_padding_max = self
            .bounds
            .metric_padding_max
            .unwrap_or(bounds.metric_padding_max);
    }
}
