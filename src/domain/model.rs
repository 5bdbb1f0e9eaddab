use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// An RGB color. Accepts `[r, g, b]` or `"#rrggbb"` when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorValue", into = "String")]
pub struct TagColor([u8; 3]);

#[derive(Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Rgb([u8; 3]),
    Hex(String),
}

impl TagColor {
    pub const BLACK: TagColor = TagColor([0, 0, 0]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }

    pub fn from_hex(value: &str) -> Option<Self> {
        let digits = value.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self([channel(0)?, channel(2)?, channel(4)?]))
    }

    /// Reads a color straight from the input document.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(hex) => Self::from_hex(hex),
            serde_json::Value::Array(channels) if channels.len() == 3 => {
                let mut rgb = [0u8; 3];
                for (slot, channel) in rgb.iter_mut().zip(channels) {
                    let n = channel.as_f64()?;
                    if !(0.0..=255.0).contains(&n) {
                        return None;
                    }
                    *slot = n.round() as u8;
                }
                Some(Self(rgb))
            }
            _ => None,
        }
    }
}

impl Default for TagColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for TagColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<ColorValue> for TagColor {
    type Error = String;

    fn try_from(repr: ColorValue) -> Result<Self, Self::Error> {
        match repr {
            ColorValue::Rgb(rgb) => Ok(Self(rgb)),
            ColorValue::Hex(hex) => {
                Self::from_hex(&hex).ok_or_else(|| format!("invalid hex color '{}'", hex))
            }
        }
    }
}

impl From<TagColor> for String {
    fn from(color: TagColor) -> Self {
        color.to_hex()
    }
}

/// Where a tag first came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagOrigin {
    /// Listed in the document's global `extra.tags` section.
    Declared,
    /// Only ever referenced from a coordinate.
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub name: String,
    pub color: TagColor,
    pub origin: TagOrigin,
    pub locations: Vec<Location>,
}

impl Tag {
    pub fn new(name: impl Into<String>, color: TagColor, origin: TagOrigin) -> Self {
        Self {
            name: name.into(),
            color,
            origin,
            locations: Vec::new(),
        }
    }

    pub fn has_locations(&self) -> bool {
        !self.locations.is_empty()
    }
}

/// Tags keyed by name, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: Vec<Tag>,
    index: HashMap<String, usize>,
}

impl TagCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tag unless one with the same name exists. Returns whether it was inserted.
    pub fn insert(&mut self, tag: Tag) -> bool {
        if self.index.contains_key(&tag.name) {
            return false;
        }
        self.index.insert(tag.name.clone(), self.tags.len());
        self.tags.push(tag);
        true
    }

    pub(crate) fn get_or_insert_with(
        &mut self,
        name: &str,
        create: impl FnOnce() -> Tag,
    ) -> &mut Tag {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let tag = create();
                let idx = self.tags.len();
                self.index.insert(name.to_string(), idx);
                self.tags.push(tag);
                idx
            }
        };
        &mut self.tags[idx]
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.index.get(name).map(|&idx| &self.tags[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Bounding policy selected per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum RenderPolicy {
    /// Pad in degrees and draw equirectangular.
    #[default]
    DegreePadding,
    /// Pad in Web Mercator metres and draw projected.
    MetricPadding,
}

impl fmt::Display for RenderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderPolicy::DegreePadding => f.write_str("degree-padding"),
            RenderPolicy::MetricPadding => f.write_str("metric-padding"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoBounds {
    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

/// Bounds in Web Mercator metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl ProjectedBounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// The padded frame a tag's map is drawn in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderRegion {
    Geographic(GeoBounds),
    Projected(ProjectedBounds),
}

impl RenderRegion {
    pub fn policy(&self) -> RenderPolicy {
        match self {
            RenderRegion::Geographic(_) => RenderPolicy::DegreePadding,
            RenderRegion::Projected(_) => RenderPolicy::MetricPadding,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardTemplate {
    pub name: String,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardModel {
    pub id: i64,
    pub name: String,
    pub fields: Vec<String>,
    pub templates: Vec<CardTemplate>,
}

impl CardModel {
    pub const NAME: &'static str = "JSON Card Model";

    /// Label on the front, the plotted map under the answer line.
    pub fn standard(id: i64) -> Self {
        Self {
            id,
            name: Self::NAME.to_string(),
            fields: vec!["Label".to_string(), "PlotAnswer".to_string()],
            templates: vec![CardTemplate {
                name: "Card 1".to_string(),
                front: r#"<div style="text-align: center; ">{{Label}}</div>"#.to_string(),
                back: r#"<div style="text-align: center; ">{{FrontSide}}<hr id="answer">{{PlotAnswer}}</div>"#
                    .to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
    pub tag: Tag,
    pub image_path: PathBuf,
}

impl CardRecord {
    /// Base file name of the image; the package resolves full paths itself.
    pub fn media_name(&self) -> String {
        media_name(&self.image_path)
    }

    pub fn note_fields(&self) -> Vec<String> {
        vec![
            self.tag.name.clone(),
            format!(r#"<img src="{}">"#, self.media_name()),
        ]
    }
}

pub fn media_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub model: CardModel,
    pub cards: Vec<CardRecord>,
}

impl Deck {
    pub fn tag_names(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.tag.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OmissionReason {
    NoLocations,
    RenderFailed(String),
}

impl fmt::Display for OmissionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OmissionReason::NoLocations => f.write_str("no locations"),
            OmissionReason::RenderFailed(message) => write!(f, "render failed: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmittedTag {
    pub tag: String,
    pub reason: OmissionReason,
}

/// Output of card assembly, handed to the package writer.
#[derive(Debug, Clone)]
pub struct AssembledDeck {
    pub deck: Deck,
    pub media_files: Vec<PathBuf>,
    pub omitted: Vec<OmittedTag>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub deck_name: String,
    pub card_count: usize,
    pub omitted: Vec<OmittedTag>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FINISHED: Created deck '{}' with {} cards at output file {} ({} tags omitted)",
            self.deck_name,
            self.card_count,
            self.output_path,
            self.omitted.len()
        )
    }
}
