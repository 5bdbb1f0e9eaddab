use crate::config::toml_config::TomlConfig;
use crate::config::RunConfig;
use crate::domain::model::RenderPolicy;
use crate::domain::ports::EmptyDeckPolicy;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "geotag-deck")]
#[command(about = "Turn a geotagged location export into a deck of map flashcards")]
pub struct CliConfig {
    /// Input JSON export [default: locs.json]
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Deck name [default: document name, then input file stem]
    #[arg(short = 'd', long = "deck")]
    pub deck: Option<String>,

    /// Output package path [default: deck.apkg]
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Bounds policy used for every map
    #[arg(short = 'p', long = "policy", value_enum)]
    pub policy: Option<RenderPolicy>,

    /// Optional TOML settings file
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Concurrent map renders [default: 4]
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seed for deck and model ids, for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, help = "Fail instead of writing a deck with no cards")]
    pub abort_on_empty: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log memory and CPU usage per phase")]
    pub monitor: bool,
}

impl CliConfig {
    /// Builds the run options: built-in defaults, then the TOML file, then flags.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = RunConfig::default();

        if let Some(path) = &self.config {
            tracing::debug!("Loading settings from {}", path);
            TomlConfig::from_file(path)?.apply_to(&mut config);
        }

        self.apply_to(&mut config);
        Ok(config)
    }

    fn apply_to(&self, config: &mut RunConfig) {
        if let Some(file) = &self.file {
            config.input_path = file.clone();
        }
        if let Some(deck) = &self.deck {
            config.deck_name = Some(deck.clone());
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(policy) = self.policy {
            config.render_policy = policy;
        }
        if let Some(workers) = self.workers {
            config.render_workers = workers;
        }
        if let Some(seed) = self.seed {
            config.id_seed = Some(seed);
        }
        if self.abort_on_empty {
            config.empty_deck_policy = EmptyDeckPolicy::Abort;
        }
    }
}
