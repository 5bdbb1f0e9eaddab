#![allow(dead_code)]

use geotag_deck::domain::ports::{PackageWriter, Renderer};
use geotag_deck::{ApkgExporter, DeckEngine, DeckPipeline, LocalStorage, RunConfig, RunReport};
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const INPUT: &str = "locs.json";
pub const OUTPUT: &str = "out/deck.apkg";

/// A scratch directory holding the input document, the output and the render workspace.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn with_document(document: &serde_json::Value) -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join(INPUT), serde_json::to_vec(document)?)?;
        std::fs::create_dir(dir.path().join("scratch"))?;
        Ok(Self { dir })
    }

    pub fn config(&self) -> RunConfig {
        RunConfig {
            input_path: INPUT.to_string(),
            output_path: OUTPUT.to_string(),
            render_workers: 2,
            id_seed: Some(7),
            ..RunConfig::default()
        }
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join(OUTPUT)
    }

    pub fn scratch(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    pub fn scratch_is_empty(&self) -> anyhow::Result<bool> {
        Ok(std::fs::read_dir(self.scratch())?.next().is_none())
    }

    pub async fn run<R: Renderer + 'static>(
        &self,
        config: RunConfig,
        renderer: R,
    ) -> geotag_deck::Result<RunReport> {
        self.run_with_writer(config, renderer, ApkgExporter::new()).await
    }

    pub async fn run_with_writer<R, W>(
        &self,
        config: RunConfig,
        renderer: R,
        writer: W,
    ) -> geotag_deck::Result<RunReport>
    where
        R: Renderer + 'static,
        W: PackageWriter,
    {
        let storage = LocalStorage::new(self.dir.path());
        let pipeline = DeckPipeline::new(storage, config, renderer, writer)?;
        DeckEngine::new(pipeline)
            .with_workspace_root(self.scratch())
            .run()
            .await
    }
}

/// Opened package with helpers for its well-known entries.
pub struct Package {
    archive: zip::ZipArchive<std::fs::File>,
}

impl Package {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let archive = zip::ZipArchive::new(std::fs::File::open(path)?)?;
        Ok(Self { archive })
    }

    pub fn entry_bytes(&mut self, name: &str) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.archive.by_name(name)?.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    pub fn collection(&mut self) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.entry_bytes("collection.json")?)?)
    }

    pub fn media_index(&mut self) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
        Ok(serde_json::from_slice(&self.entry_bytes("media")?)?)
    }

    /// Card labels in deck order.
    pub fn labels(&mut self) -> anyhow::Result<Vec<String>> {
        let collection = self.collection()?;
        Ok(collection["notes"]
            .as_array()
            .map(|notes| {
                notes
                    .iter()
                    .filter_map(|note| note["fields"][0].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}
