use crate::core::schema::{malformed, SchemaSections, EXTRA_KEY, TAGS_KEY};
use crate::domain::model::{Location, Tag, TagCatalog, TagColor, TagOrigin};
use crate::utils::error::{SchemaError, SchemaErrorKind};
use serde_json::Value;

const COLOR_KEY: &str = "color";
const LAT_KEY: &str = "lat";
const LNG_KEY: &str = "lng";

/// Builds the tag catalog from the global tag definitions and the per-coordinate tag lists.
#[derive(Debug, Clone, Copy)]
pub struct TagAggregator {
    default_color: TagColor,
}

impl TagAggregator {
    pub fn new(default_color: TagColor) -> Self {
        Self { default_color }
    }

    pub fn aggregate(&self, sections: &SchemaSections<'_>) -> Result<TagCatalog, SchemaError> {
        let mut catalog = TagCatalog::new();

        // 先放入全域宣告的標籤，保持宣告順序
        for (name, definition) in sections.tag_definitions {
            let color = self.declared_color(name, definition)?;
            catalog.insert(Tag::new(name.clone(), color, TagOrigin::Declared));
        }
        let declared = catalog.len();

        for (index, record) in sections.coordinates.iter().enumerate() {
            let Some(tag_names) = coordinate_tags(index, record)? else {
                continue;
            };

            let location = read_location(index, record)?;

            for name in tag_names {
                let default_color = self.default_color;
                catalog
                    .get_or_insert_with(name, || {
                        Tag::new(name, default_color, TagOrigin::Implicit)
                    })
                    .locations
                    .push(location);
            }
        }

        tracing::debug!(
            "Aggregated {} tags ({} declared, {} implicit) from {} coordinates",
            catalog.len(),
            declared,
            catalog.len() - declared,
            sections.coordinates.len()
        );

        Ok(catalog)
    }

    fn declared_color(&self, name: &str, definition: &Value) -> Result<TagColor, SchemaError> {
        let color = match definition {
            Value::Object(fields) => fields.get(COLOR_KEY),
            Value::Null => None,
            _ => return Err(malformed(format!("extra.tags.{}", name), "an object")),
        };

        match color {
            None | Some(Value::Null) => Ok(self.default_color),
            Some(value) => TagColor::from_json(value).ok_or_else(|| {
                SchemaError::new(SchemaErrorKind::InvalidTagColor {
                    tag: name.to_string(),
                })
            }),
        }
    }
}

/// The coordinate's tag names, or `None` when it carries no tags at all.
fn coordinate_tags(index: usize, record: &Value) -> Result<Option<Vec<&str>>, SchemaError> {
    let record = record
        .as_object()
        .ok_or_else(|| malformed(format!("customCoordinates[{}]", index), "an object"))?;

    let Some(extra) = record.get(EXTRA_KEY) else {
        return Ok(None);
    };
    let extra = match extra {
        Value::Object(extra) => extra,
        Value::Null => return Ok(None),
        _ => {
            return Err(malformed(
                format!("customCoordinates[{}].extra", index),
                "an object",
            ))
        }
    };

    let Some(tags) = extra.get(TAGS_KEY) else {
        return Ok(None);
    };
    let section = || format!("customCoordinates[{}].extra.tags", index);
    let tags = tags
        .as_array()
        .ok_or_else(|| malformed(section(), "a list of strings"))?;

    tags.iter()
        .map(|tag| {
            tag.as_str()
                .ok_or_else(|| malformed(section(), "a list of strings"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn read_location(index: usize, record: &Value) -> Result<Location, SchemaError> {
    let latitude = read_degrees(index, record, LAT_KEY, 90.0)?;
    let longitude = read_degrees(index, record, LNG_KEY, 180.0)?;
    Ok(Location::new(latitude, longitude))
}

fn read_degrees(
    index: usize,
    record: &Value,
    field: &'static str,
    limit: f64,
) -> Result<f64, SchemaError> {
    let value = record
        .get(field)
        .ok_or(SchemaErrorKind::MissingCoordinateField { index, field })?;

    value
        .as_f64()
        .filter(|degrees| degrees.is_finite() && degrees.abs() <= limit)
        .ok_or_else(|| {
            SchemaError::new(SchemaErrorKind::InvalidCoordinateField {
                index,
                field,
                value: value.to_string(),
            })
        })
}
