use crate::core::aggregate::TagAggregator;
use crate::core::assemble::CardAssembler;
use crate::core::bounds::BoundsCalculator;
use crate::core::ids::{self, DeckIds};
use crate::core::schema::extract_sections;
use crate::core::{AssembledDeck, ConfigProvider, Pipeline, Storage};
use crate::domain::ports::{EmptyDeckPolicy, IdGenerator, PackageWriter, Renderer};
use crate::utils::error::{GeoDeckError, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};

const FALLBACK_DECK_NAME: &str = "Geotag Deck";

/// JSON export in, packaged deck out.
pub struct DeckPipeline<S: Storage, C: ConfigProvider, R: Renderer + 'static, W: PackageWriter> {
    storage: S,
    config: C,
    assembler: CardAssembler<R>,
    writer: W,
    ids: Mutex<Box<dyn IdGenerator>>,
}

impl<S, C, R, W> DeckPipeline<S, C, R, W>
where
    S: Storage,
    C: ConfigProvider,
    R: Renderer + 'static,
    W: PackageWriter,
{
    /// Fails when the configured bounds settings cannot frame a region.
    pub fn new(storage: S, config: C, renderer: R, writer: W) -> Result<Self> {
        let bounds = BoundsCalculator::new(config.render_policy(), config.bounds_settings())?;
        let assembler = CardAssembler::new(Arc::new(renderer), bounds, config.render_workers());
        let ids = Mutex::new(ids::generator_for(config.id_seed()));
        Ok(Self {
            storage,
            config,
            assembler,
            writer,
            ids,
        })
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = Mutex::new(ids);
        self
    }

    fn draw_ids(&self) -> Result<DeckIds> {
        let mut ids = self.ids.lock().map_err(|_| GeoDeckError::ProcessingError {
            message: "identifier generator lock poisoned".to_string(),
        })?;
        Ok(DeckIds::draw(ids.as_mut()))
    }

    fn resolve_deck_name(&self, document_name: Option<&str>) -> String {
        if let Some(name) = self.config.deck_name() {
            return name.to_string();
        }
        if let Some(name) = document_name {
            return name.to_string();
        }

        let stem = Path::new(self.config.input_path())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty());
        match stem {
            Some(stem) => {
                tracing::warn!("No deck name given or found in the input, using '{}'", stem);
                stem
            }
            None => FALLBACK_DECK_NAME.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl<S, C, R, W> Pipeline for DeckPipeline<S, C, R, W>
where
    S: Storage,
    C: ConfigProvider,
    R: Renderer + 'static,
    W: PackageWriter,
{
    async fn extract(&self) -> Result<serde_json::Value> {
        let input = self.config.input_path();
        tracing::debug!("Reading input JSON from: {}", input);

        let bytes = self.storage.read_file(input).await?;
        let document: serde_json::Value = serde_json::from_slice(&bytes)?;

        tracing::debug!("Parsed {} bytes of JSON", bytes.len());
        Ok(document)
    }

    async fn transform(
        &self,
        document: serde_json::Value,
        workspace: &Path,
    ) -> Result<AssembledDeck> {
        let sections = extract_sections(&document)?;
        let catalog = TagAggregator::new(self.config.default_color()).aggregate(&sections)?;
        tracing::info!(
            "🏷️ Found {} tags across {} coordinates",
            catalog.len(),
            sections.coordinates.len()
        );

        let deck_name = self.resolve_deck_name(sections.deck_name);
        let ids = self.draw_ids()?;

        let assembled = self
            .assembler
            .assemble(&catalog, deck_name, ids, workspace)
            .await?;

        if assembled.deck.cards.is_empty()
            && self.config.empty_deck_policy() == EmptyDeckPolicy::Abort
        {
            return Err(GeoDeckError::EmptyDeck);
        }

        Ok(assembled)
    }

    async fn load(&self, assembled: AssembledDeck) -> Result<String> {
        let output_path = self.config.output_path().to_string();

        tracing::debug!(
            "Packaging {} cards and {} images",
            assembled.deck.cards.len(),
            assembled.media_files.len()
        );
        let package = self
            .writer
            .write_package(&assembled.deck, &assembled.media_files)?;

        tracing::debug!("Writing package ({} bytes) to storage", package.len());
        self.storage
            .write_file(&output_path, &package)
            .await
            .map_err(|e| GeoDeckError::Export {
                message: format!("cannot write '{}': {}", output_path, e),
            })?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bounds::BoundsSettings;
    use crate::domain::model::{Deck, RenderPolicy, TagColor};
    use crate::domain::ports::RenderJob;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<AsyncMutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_input(document: serde_json::Value) -> Self {
            let mut files = HashMap::new();
            files.insert("locs.json".to_string(), document.to_string().into_bytes());
            Self {
                files: Arc::new(AsyncMutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                GeoDeckError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        deck_name: Option<String>,
        empty_deck_policy: EmptyDeckPolicy,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                deck_name: None,
                empty_deck_policy: EmptyDeckPolicy::Write,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "locs.json"
        }

        fn deck_name(&self) -> Option<&str> {
            self.deck_name.as_deref()
        }

        fn output_path(&self) -> &str {
            "deck.apkg"
        }

        fn render_policy(&self) -> RenderPolicy {
            RenderPolicy::DegreePadding
        }

        fn render_workers(&self) -> usize {
            2
        }

        fn bounds_settings(&self) -> BoundsSettings {
            BoundsSettings::default()
        }

        fn default_color(&self) -> TagColor {
            TagColor::BLACK
        }

        fn id_seed(&self) -> Option<u64> {
            Some(42)
        }

        fn empty_deck_policy(&self) -> EmptyDeckPolicy {
            self.empty_deck_policy
        }
    }

    struct TouchRenderer;

    impl Renderer for TouchRenderer {
        fn render(&self, job: &RenderJob) -> Result<PathBuf> {
            std::fs::write(&job.output_path, job.tag.color.to_hex())?;
            Ok(job.output_path.clone())
        }
    }

    /// Writes the card labels, one per line.
    struct LabelWriter;

    impl PackageWriter for LabelWriter {
        fn write_package(&self, deck: &Deck, _media_files: &[PathBuf]) -> Result<Vec<u8>> {
            Ok(deck.tag_names().join("\n").into_bytes())
        }
    }

    fn sample_document() -> serde_json::Value {
        json!({
            "name": "Europe",
            "customCoordinates": [
                {"lat": 48.85, "lng": 2.35, "extra": {"tags": ["capital"]}},
                {"lat": 52.52, "lng": 13.40, "extra": {"tags": ["capital"]}},
                {"lat": 41.90, "lng": 12.49, "extra": {"tags": ["capital"]}},
                {"lat": 45.0, "lng": 10.0, "extra": {"tags": ["river"]}},
                {"lat": 46.0, "lng": 11.0}
            ],
            "extra": {"tags": {"capital": {"color": [255, 0, 0]}}}
        })
    }

    fn pipeline(
        storage: MockStorage,
        config: MockConfig,
    ) -> DeckPipeline<MockStorage, MockConfig, TouchRenderer, LabelWriter> {
        DeckPipeline::new(storage, config, TouchRenderer, LabelWriter).unwrap()
    }

    #[tokio::test]
    async fn test_extract_reads_json_from_storage() {
        let storage = MockStorage::with_input(sample_document());
        let document = pipeline(storage, MockConfig::new()).extract().await.unwrap();
        assert_eq!(document["name"], "Europe");
    }

    #[tokio::test]
    async fn test_extract_rejects_invalid_json() {
        let storage = MockStorage::with_input(json!(null));
        storage
            .write_file("locs.json", b"{not json")
            .await
            .unwrap();

        let err = pipeline(storage, MockConfig::new()).extract().await.unwrap_err();
        assert!(matches!(err, GeoDeckError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_transform_builds_one_card_per_used_tag() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(MockStorage::with_input(json!(null)), MockConfig::new());

        let assembled = pipeline
            .transform(sample_document(), dir.path())
            .await
            .unwrap();

        assert_eq!(assembled.deck.name, "Europe");
        assert_eq!(assembled.deck.tag_names(), vec!["capital", "river"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("capital.png")).unwrap(),
            "#ff0000"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("river.png")).unwrap(),
            "#000000"
        );
    }

    #[tokio::test]
    async fn test_configured_deck_name_wins() {
        let dir = TempDir::new().unwrap();
        let mut config = MockConfig::new();
        config.deck_name = Some("Override".to_string());
        let pipeline = pipeline(MockStorage::with_input(json!(null)), config);

        let assembled = pipeline
            .transform(sample_document(), dir.path())
            .await
            .unwrap();
        assert_eq!(assembled.deck.name, "Override");
    }

    #[tokio::test]
    async fn test_deck_name_falls_back_to_input_stem() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(MockStorage::with_input(json!(null)), MockConfig::new());
        let document = json!({"customCoordinates": [], "extra": {"tags": {}}});

        let assembled = pipeline.transform(document, dir.path()).await.unwrap();
        assert_eq!(assembled.deck.name, "locs");
    }

    #[tokio::test]
    async fn test_schema_error_aborts_transform() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(MockStorage::with_input(json!(null)), MockConfig::new());
        let document = json!({"customCoordinates": []});

        let err = pipeline.transform(document, dir.path()).await.unwrap_err();
        assert_eq!(err.to_string(), "Schema error: JSON contains no extra section");
    }

    #[tokio::test]
    async fn test_empty_deck_is_written_by_default() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(MockStorage::with_input(json!(null)), MockConfig::new());
        let document = json!({"customCoordinates": [], "extra": {"tags": {}}});

        let assembled = pipeline.transform(document, dir.path()).await.unwrap();
        assert!(assembled.deck.cards.is_empty());
        assert!(assembled.media_files.is_empty());
    }

    #[tokio::test]
    async fn test_empty_deck_aborts_when_configured() {
        let dir = TempDir::new().unwrap();
        let mut config = MockConfig::new();
        config.empty_deck_policy = EmptyDeckPolicy::Abort;
        let pipeline = pipeline(MockStorage::with_input(json!(null)), config);
        let document = json!({
            "customCoordinates": [],
            "extra": {"tags": {"declared-only": {}}}
        });

        let err = pipeline.transform(document, dir.path()).await.unwrap_err();
        assert!(matches!(err, GeoDeckError::EmptyDeck));
    }

    #[tokio::test]
    async fn test_seeded_ids_repeat_across_runs() {
        let dir = TempDir::new().unwrap();
        let first = pipeline(MockStorage::with_input(json!(null)), MockConfig::new())
            .transform(sample_document(), dir.path())
            .await
            .unwrap();
        let second = pipeline(MockStorage::with_input(json!(null)), MockConfig::new())
            .transform(sample_document(), dir.path())
            .await
            .unwrap();

        assert_eq!(first.deck.id, second.deck.id);
        assert_eq!(first.deck.model.id, second.deck.model.id);
        assert_ne!(first.deck.id, first.deck.model.id);
    }

    #[tokio::test]
    async fn test_load_writes_package_to_output_path() {
        let dir = TempDir::new().unwrap();
        let storage = MockStorage::with_input(json!(null));
        let pipeline = pipeline(storage.clone(), MockConfig::new());

        let assembled = pipeline
            .transform(sample_document(), dir.path())
            .await
            .unwrap();
        let output = pipeline.load(assembled).await.unwrap();

        assert_eq!(output, "deck.apkg");
        let written = storage.get_file("deck.apkg").await.unwrap();
        assert_eq!(String::from_utf8(written).unwrap(), "capital\nriver");
    }
}
