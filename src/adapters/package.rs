use crate::domain::model::{media_name, CardModel, Deck};
use crate::domain::ports::PackageWriter;
use crate::utils::error::{GeoDeckError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use zip::write::{FileOptions, SimpleFileOptions, ZipWriter};

pub const COLLECTION_ENTRY: &str = "collection.json";
pub const MEDIA_INDEX_ENTRY: &str = "media";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct Collection<'a> {
    format_version: u32,
    created_at: String,
    deck: DeckEntry<'a>,
    model: &'a CardModel,
    notes: Vec<NoteEntry>,
}

#[derive(Debug, Serialize)]
struct DeckEntry<'a> {
    id: i64,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct NoteEntry {
    model_id: i64,
    fields: Vec<String>,
    color: String,
}

/// Writes a deck as a zip package: the collection JSON, a media index, and the images
/// stored under numeric entry names.
#[derive(Debug, Clone, Default)]
pub struct ApkgExporter;

impl ApkgExporter {
    pub fn new() -> Self {
        Self
    }

    fn collection<'a>(&self, deck: &'a Deck) -> Collection<'a> {
        Collection {
            format_version: FORMAT_VERSION,
            created_at: chrono::Utc::now().to_rfc3339(),
            deck: DeckEntry {
                id: deck.id,
                name: &deck.name,
            },
            model: &deck.model,
            notes: deck
                .cards
                .iter()
                .map(|card| NoteEntry {
                    model_id: deck.model.id,
                    fields: card.note_fields(),
                    color: card.tag.color.to_hex(),
                })
                .collect(),
        }
    }
}

impl PackageWriter for ApkgExporter {
    fn write_package(&self, deck: &Deck, media_files: &[PathBuf]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        // 卡片與模型
        let collection = serde_json::to_vec_pretty(&self.collection(deck))?;
        zip.start_file::<_, ()>(COLLECTION_ENTRY, FileOptions::default())?;
        zip.write_all(&collection)?;

        // 媒體索引: "0" -> "capital.png"
        let index: BTreeMap<String, String> = media_files
            .iter()
            .enumerate()
            .map(|(i, path)| (i.to_string(), media_name(path)))
            .collect();
        zip.start_file::<_, ()>(MEDIA_INDEX_ENTRY, FileOptions::default())?;
        zip.write_all(&serde_json::to_vec(&index)?)?;

        for (i, path) in media_files.iter().enumerate() {
            let bytes = std::fs::read(path).map_err(|e| GeoDeckError::Export {
                message: format!("cannot read media file {}: {}", path.display(), e),
            })?;
            // PNG 已經壓縮過
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            zip.start_file(i.to_string(), options)?;
            zip.write_all(&bytes)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}
