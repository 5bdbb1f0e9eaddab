use crate::utils::error::{SchemaError, SchemaErrorKind};
use serde_json::{Map, Value};

pub const EXTRA_KEY: &str = "extra";
pub const TAGS_KEY: &str = "tags";
pub const COORDINATES_KEY: &str = "customCoordinates";
pub const NAME_KEY: &str = "name";

/// Borrowed views of the sections the aggregator needs.
#[derive(Debug, Clone, Copy)]
pub struct SchemaSections<'a> {
    pub deck_name: Option<&'a str>,
    pub tag_definitions: &'a Map<String, Value>,
    pub coordinates: &'a [Value],
}

/// Locates the global tag definitions and the coordinate list, or fails fast.
pub fn extract_sections(document: &Value) -> Result<SchemaSections<'_>, SchemaError> {
    let root = document
        .as_object()
        .ok_or_else(|| malformed("<root>", "an object"))?;

    let extra = root
        .get(EXTRA_KEY)
        .ok_or(SchemaErrorKind::MissingExtraSection)?
        .as_object()
        .ok_or_else(|| malformed(EXTRA_KEY, "an object"))?;

    let tag_definitions = extra
        .get(TAGS_KEY)
        .ok_or(SchemaErrorKind::MissingTagsSection)?
        .as_object()
        .ok_or_else(|| malformed("extra.tags", "an object"))?;

    let coordinates = root
        .get(COORDINATES_KEY)
        .ok_or(SchemaErrorKind::MissingCoordinatesSection)?
        .as_array()
        .ok_or_else(|| malformed(COORDINATES_KEY, "a list"))?;

    let deck_name = root
        .get(NAME_KEY)
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty());

    Ok(SchemaSections {
        deck_name,
        tag_definitions,
        coordinates,
    })
}

pub(crate) fn malformed(section: impl Into<String>, expected: &'static str) -> SchemaError {
    SchemaError::new(SchemaErrorKind::MalformedSection {
        section: section.into(),
        expected,
    })
}
