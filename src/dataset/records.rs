//! Typed records and their normalization from `RawTree` nodes
//!
//! Field names are the markup tag names. Serializing a record gives back the
//! same keys (`EPOCH`, `X`, `@units`, `#text`, `country`, ...) so the HTTP
//! facade can return records verbatim.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::dataset::DatasetKind;
use crate::error::ParseError;
use crate::markup::RawTree;

const EPOCH_KEY: &str = "EPOCH";
const POSITION_KEYS: [&str; 3] = ["X", "Y", "Z"];
const VELOCITY_KEYS: [&str; 3] = ["X_DOT", "Y_DOT", "Z_DOT"];

const COUNTRY_KEY: &str = "country";
const REGION_KEY: &str = "region";
const CITY_KEY: &str = "city";

const UNITS_KEY: &str = "@units";
const TEXT_KEY: &str = "#text";

/// A record type that can be built from one node of a parsed document
pub(crate) trait DatasetRecord: Sized + Send + Sync + 'static {
    const KIND: DatasetKind;

    fn from_node(node: &RawTree) -> Result<Self, ParseError>;
}

/// Walk to the record list of `T`'s dataset and normalize every node.
///
/// A single map at the end of the path is one record: the tree builder only
/// produces a list when a tag repeats. A lone empty element is one record with
/// no fields.
pub(crate) fn extract_records<T: DatasetRecord>(tree: &RawTree) -> Result<Vec<T>, ParseError> {
    let path = T::KIND.record_path();

    let mut node = tree;
    for key in path {
        node = node
            .get(key)
            .ok_or_else(|| ParseError::unexpected_schema(path))?;
    }

    match node {
        Value::Array(items) => items.iter().map(T::from_node).collect(),
        Value::Object(_) => Ok(vec![T::from_node(node)?]),
        Value::Null => Ok(vec![T::from_node(&Value::Object(Map::new()))?]),
        _ => Err(ParseError::unexpected_schema(path)),
    }
}

/// Text content of a leaf: a plain string, the `#text` of an attributed
/// element, or empty for an empty element. An element with child elements
/// has no text.
fn text_of(node: &RawTree) -> Option<&str> {
    match node {
        Value::String(s) => Some(s),
        Value::Null => Some(""),
        Value::Object(map) => match map.get(TEXT_KEY) {
            Some(Value::String(s)) => Some(s),
            None if map.keys().all(|k| k.starts_with('@')) => Some(""),
            _ => None,
        },
        _ => None,
    }
}

fn required_text<'a>(record: &'a Map<String, Value>, key: &str) -> Result<&'a str, ParseError> {
    let node = record
        .get(key)
        .ok_or_else(|| ParseError::MissingField(key.to_string()))?;
    text_of(node).ok_or_else(|| ParseError::InvalidField {
        key: key.to_string(),
        value: node.to_string(),
    })
}

// ============================================================================
// Positions
// ============================================================================

/// One numeric state-vector component, e.g. `<X units="km">-4945.2</X>`
#[derive(Debug, Clone, PartialEq)]
pub struct StateComponent {
    /// Parsed value
    pub value: f64,
    /// Source text, kept for verbatim output
    pub text: String,
    /// `units` attribute, when present
    pub units: Option<String>,
}

impl StateComponent {
    fn from_record(record: &Map<String, Value>, key: &str) -> Result<Self, ParseError> {
        let text = required_text(record, key)?;
        let value = text.parse::<f64>().map_err(|_| ParseError::InvalidField {
            key: key.to_string(),
            value: text.to_string(),
        })?;
        let units = record
            .get(key)
            .and_then(|node| node.get(UNITS_KEY))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            value,
            text: text.to_string(),
            units,
        })
    }
}

impl Serialize for StateComponent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.units {
            Some(units) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(UNITS_KEY, units)?;
                map.serialize_entry(TEXT_KEY, &self.text)?;
                map.end()
            }
            None => serializer.serialize_str(&self.text),
        }
    }
}

/// One ephemeris sample
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRecord {
    /// Source timestamp, e.g. `2022-042T12:00:00.000Z`. Compared verbatim.
    pub epoch: String,
    /// X, Y, Z
    pub position: [StateComponent; 3],
    /// X_DOT, Y_DOT, Z_DOT
    pub velocity: [StateComponent; 3],
}

impl DatasetRecord for PositionRecord {
    const KIND: DatasetKind = DatasetKind::Positions;

    fn from_node(node: &RawTree) -> Result<Self, ParseError> {
        let record = node
            .as_object()
            .ok_or_else(|| ParseError::unexpected_schema(Self::KIND.record_path()))?;

        let epoch = required_text(record, EPOCH_KEY)?.to_string();
        let [x, y, z] = POSITION_KEYS;
        let [dx, dy, dz] = VELOCITY_KEYS;

        Ok(Self {
            epoch,
            position: [
                StateComponent::from_record(record, x)?,
                StateComponent::from_record(record, y)?,
                StateComponent::from_record(record, z)?,
            ],
            velocity: [
                StateComponent::from_record(record, dx)?,
                StateComponent::from_record(record, dy)?,
                StateComponent::from_record(record, dz)?,
            ],
        })
    }
}

impl Serialize for PositionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(7))?;
        map.serialize_entry(EPOCH_KEY, &self.epoch)?;
        for (key, component) in POSITION_KEYS.iter().zip(&self.position) {
            map.serialize_entry(key, component)?;
        }
        for (key, component) in VELOCITY_KEYS.iter().zip(&self.velocity) {
            map.serialize_entry(key, component)?;
        }
        map.end()
    }
}

// ============================================================================
// Sightings
// ============================================================================

/// One visible pass.
///
/// `country`, `region` and `city` are the filter keys. Every field, including
/// the descriptive ones (`sighting_date`, `duration_minutes`, `max_elevation`,
/// `enters`, `exits`, ...), is kept verbatim in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct SightingRecord {
    country: String,
    region: String,
    city: String,
    fields: Map<String, Value>,
}

impl SightingRecord {
    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// Text of a single field, if present and textual.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

impl DatasetRecord for SightingRecord {
    const KIND: DatasetKind = DatasetKind::Sightings;

    fn from_node(node: &RawTree) -> Result<Self, ParseError> {
        let record = node
            .as_object()
            .ok_or_else(|| ParseError::unexpected_schema(Self::KIND.record_path()))?;

        Ok(Self {
            country: required_text(record, COUNTRY_KEY)?.to_string(),
            region: required_text(record, REGION_KEY)?.to_string(),
            city: required_text(record, CITY_KEY)?.to_string(),
            fields: record.clone(),
        })
    }
}

impl Serialize for SightingRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
