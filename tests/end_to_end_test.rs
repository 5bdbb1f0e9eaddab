mod common;

use common::{Fixture, Package};
use geotag_deck::domain::model::Deck;
use geotag_deck::domain::ports::{EmptyDeckPolicy, PackageWriter, RenderJob, Renderer};
use geotag_deck::{GeoDeckError, MapRenderer, RenderPolicy, RenderStyle};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;

/// Package writer whose target is never writable.
struct UnwritablePackage;

impl PackageWriter for UnwritablePackage {
    fn write_package(
        &self,
        _deck: &Deck,
        _media_files: &[PathBuf],
    ) -> geotag_deck::Result<Vec<u8>> {
        Err(GeoDeckError::Export {
            message: "disk full".to_string(),
        })
    }
}

/// Writes the card labels instead of a zip.
struct LabelPackage;

impl PackageWriter for LabelPackage {
    fn write_package(
        &self,
        deck: &Deck,
        _media_files: &[PathBuf],
    ) -> geotag_deck::Result<Vec<u8>> {
        Ok(deck.tag_names().join("\n").into_bytes())
    }
}

/// Renders, then removes the whole workspace out from under the engine.
struct WorkspaceWiper;

impl Renderer for WorkspaceWiper {
    fn render(&self, job: &RenderJob) -> geotag_deck::Result<PathBuf> {
        if let Some(workspace) = job.output_path.parent() {
            std::fs::remove_dir_all(workspace)?;
        }
        Ok(job.output_path.clone())
    }
}

fn capitals_document() -> serde_json::Value {
    json!({
        "name": "Europe",
        "customCoordinates": [
            {"lat": 48.85, "lng": 2.35, "extra": {"tags": ["capital"]}},
            {"lat": 52.52, "lng": 13.40, "extra": {"tags": ["capital"]}},
            {"lat": 41.90, "lng": 12.49, "extra": {"tags": ["capital"]}},
            {"lat": 45.0, "lng": 10.0, "extra": {"tags": ["river"]}}
        ],
        "extra": {"tags": {"capital": {"color": [255, 0, 0]}}}
    })
}

#[tokio::test]
async fn test_full_run_writes_package() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&capitals_document())?;

    let report = fixture.run(fixture.config(), MapRenderer::default()).await?;

    assert_eq!(report.deck_name, "Europe");
    assert_eq!(report.card_count, 2);
    assert!(report.omitted.is_empty());
    assert!(fixture.output().is_file());

    let mut package = Package::open(&fixture.output())?;
    assert_eq!(package.labels()?, vec!["capital", "river"]);

    let index = package.media_index()?;
    assert_eq!(index["0"], "capital.png");
    assert_eq!(index["1"], "river.png");

    let image = image::load_from_memory(&package.entry_bytes("0")?)?.to_rgb8();
    assert_eq!(image.dimensions(), (640, 480));
    assert!(image.pixels().any(|p| p.0 == [255, 0, 0]));

    let collection = package.collection()?;
    assert_eq!(collection["deck"]["name"], "Europe");
    assert_eq!(collection["notes"][0]["color"], "#ff0000");
    assert_eq!(collection["notes"][1]["color"], "#000000");
    assert_eq!(
        collection["notes"][1]["fields"][1],
        r#"<img src="river.png">"#
    );
    Ok(())
}

#[tokio::test]
async fn test_workspace_is_removed_after_success() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&capitals_document())?;

    fixture.run(fixture.config(), MapRenderer::default()).await?;

    assert!(fixture.scratch_is_empty()?);
    Ok(())
}

#[tokio::test]
async fn test_schema_error_leaves_no_output() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&json!({
        "customCoordinates": [{"lat": 1.0, "lng": 2.0, "extra": {"tags": ["a"]}}]
    }))?;

    let err = fixture
        .run(fixture.config(), MapRenderer::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GeoDeckError::Schema(_)));
    assert_eq!(err.to_string(), "Schema error: JSON contains no extra section");
    assert!(!fixture.output().exists());
    assert!(fixture.scratch_is_empty()?);
    Ok(())
}

#[tokio::test]
async fn test_invalid_json_leaves_no_output() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&json!({}))?;
    std::fs::write(fixture.dir.path().join(common::INPUT), b"{ not json")?;

    let err = fixture
        .run(fixture.config(), MapRenderer::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GeoDeckError::SerializationError(_)));
    assert!(!fixture.output().exists());
    Ok(())
}

#[tokio::test]
async fn test_metric_policy_run() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&capitals_document())?;
    let mut config = fixture.config();
    config.render_policy = RenderPolicy::MetricPadding;
    let style = RenderStyle {
        width: 300,
        height: 300,
        ..RenderStyle::default()
    };

    let report = fixture.run(config, MapRenderer::new(style)).await?;
    assert_eq!(report.card_count, 2);

    let mut package = Package::open(&fixture.output())?;
    let image = image::load_from_memory(&package.entry_bytes("1")?)?.to_rgb8();
    assert_eq!(image.dimensions(), (300, 300));
    Ok(())
}

#[tokio::test]
async fn test_empty_deck_written_by_default() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&json!({
        "customCoordinates": [],
        "extra": {"tags": {"unused": {"color": [0, 0, 255]}}}
    }))?;

    let report = fixture.run(fixture.config(), MapRenderer::default()).await?;

    assert_eq!(report.card_count, 0);
    assert_eq!(report.omitted.len(), 1);
    assert_eq!(report.omitted[0].tag, "unused");

    let mut package = Package::open(&fixture.output())?;
    assert!(package.labels()?.is_empty());
    assert!(package.media_index()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_empty_deck_aborts_when_configured() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&json!({
        "customCoordinates": [],
        "extra": {"tags": {}}
    }))?;
    let mut config = fixture.config();
    config.empty_deck_policy = EmptyDeckPolicy::Abort;

    let err = fixture
        .run(config, MapRenderer::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GeoDeckError::EmptyDeck));
    assert!(!fixture.output().exists());
    assert!(fixture.scratch_is_empty()?);
    Ok(())
}

#[tokio::test]
async fn test_export_failure_cleans_workspace() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&capitals_document())?;

    let err = fixture
        .run_with_writer(fixture.config(), MapRenderer::default(), UnwritablePackage)
        .await
        .unwrap_err();

    assert!(matches!(err, GeoDeckError::Export { ref message } if message == "disk full"));
    assert!(!fixture.output().exists());
    assert!(fixture.scratch_is_empty()?);
    Ok(())
}

#[tokio::test]
async fn test_workspace_cleanup_failure_keeps_finished_deck() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&json!({
        "customCoordinates": [{"lat": 45.0, "lng": 10.0, "extra": {"tags": ["river"]}}],
        "extra": {"tags": {}}
    }))?;

    let report = fixture
        .run_with_writer(fixture.config(), WorkspaceWiper, LabelPackage)
        .await?;

    assert_eq!(report.card_count, 1);
    assert_eq!(std::fs::read_to_string(fixture.output())?, "river");
    Ok(())
}

#[tokio::test]
async fn test_inverted_metric_limits_are_rejected_before_rendering() -> anyhow::Result<()> {
    let fixture = Fixture::with_document(&capitals_document())?;
    let mut config = fixture.config();
    config.render_policy = RenderPolicy::MetricPadding;
    config.bounds.metric_padding_min = 2_000_000.0;

    let err = fixture
        .run(config, MapRenderer::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GeoDeckError::InvalidConfigValueError { .. }));
    assert!(!fixture.output().exists());
    assert!(fixture.scratch_is_empty()?);
    Ok(())
}
