use crate::core::bounds::BoundsSettings;
use crate::domain::model::{AssembledDeck, Deck, RenderPolicy, RenderRegion, Tag, TagColor};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// What to do when no tag produced a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyDeckPolicy {
    #[default]
    Write,
    Abort,
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn deck_name(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn render_policy(&self) -> RenderPolicy;
    fn render_workers(&self) -> usize;
    fn bounds_settings(&self) -> BoundsSettings;
    fn default_color(&self) -> TagColor;
    fn id_seed(&self) -> Option<u64>;
    fn empty_deck_policy(&self) -> EmptyDeckPolicy;
}

/// One tag's render request. Owned so it can move onto a blocking worker.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub tag: Tag,
    pub region: RenderRegion,
    pub output_path: PathBuf,
}

pub trait Renderer: Send + Sync {
    /// Draws the tag's locations into `job.output_path` and returns the written path.
    fn render(&self, job: &RenderJob) -> Result<PathBuf>;
}

pub trait PackageWriter: Send + Sync {
    fn write_package(&self, deck: &Deck, media_files: &[PathBuf]) -> Result<Vec<u8>>;
}

pub trait IdGenerator: Send {
    fn next_id(&mut self) -> i64;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<serde_json::Value>;
    async fn transform(&self, document: serde_json::Value, workspace: &Path)
        -> Result<AssembledDeck>;
    async fn load(&self, assembled: AssembledDeck) -> Result<String>;
}
