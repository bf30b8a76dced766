//! Position reports and their decoding at the transport boundary.
//!
//! Feeds disagree on field names, so decoding accepts both the canonical
//! names and the usual ADS-B aliases (`hex`, `flight`, `alt_baro`, `track`,
//! `gs`, `rssi`). When an object carries both, the canonical name wins, then
//! the first alias in [`FIELD_ALIASES`] order. Numeric fields are lenient: numbers and numeric strings are
//! accepted, anything else (e.g. `"alt_baro": "ground"`) reads as missing and
//! turns the report into a partial one rather than a decode failure.

use crate::error::TrackingError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

/// Canonical field name and the feed aliases it is read from, in precedence order.
pub const FIELD_ALIASES: &[(&str, &[&str])] = &[
    ("id", &["hex", "icao"]),
    ("lat", &["latitude"]),
    ("lon", &["longitude"]),
    ("alt_feet", &["alt_baro", "altitude"]),
    ("heading", &["track"]),
    ("speed", &["gs"]),
    ("label", &["flight", "callsign"]),
    ("signal", &["rssi"]),
    ("timestamp", &["ts", "now"]),
];

/// One ingested position sample for one identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Track key; empty means the report is invalid
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,

    /// Latitude in degrees
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,

    /// Longitude in degrees
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,

    /// Altitude in feet
    #[serde(default, deserialize_with = "lenient_f64")]
    pub alt_feet: Option<f64>,

    /// Heading in degrees, clockwise from north
    #[serde(default, deserialize_with = "lenient_f64")]
    pub heading: Option<f64>,

    /// Ground speed (knots as delivered by the feed)
    #[serde(default, deserialize_with = "lenient_f64")]
    pub speed: Option<f64>,

    /// Callsign-like label
    #[serde(default, deserialize_with = "lenient_label")]
    pub label: Option<String>,

    /// Signal quality as reported by the receiver
    #[serde(default, deserialize_with = "lenient_f64")]
    pub signal: Option<f64>,

    /// Tag of the receiver that heard the message
    #[serde(default, deserialize_with = "lenient_label")]
    pub receiver: Option<String>,

    /// Source timestamp, if the feed provides one
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: Option<f64>,

    /// The JSON object this report was decoded from
    #[serde(skip)]
    pub raw: Option<Arc<Value>>,
}

impl Report {
    /// A report carrying only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_position(mut self, lat: f64, lon: f64, alt_feet: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self.alt_feet = Some(alt_feet);
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_signal(mut self, signal: f64) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    /// Whether the identifier is usable as a track key.
    #[inline]
    pub fn has_valid_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// `(lat, lon, alt_feet)` when all three are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64, f64)> {
        match (self.lat, self.lon, self.alt_feet) {
            (Some(lat), Some(lon), Some(alt))
                if lat.is_finite() && lon.is_finite() && alt.is_finite() =>
            {
                Some((lat, lon, alt))
            }
            _ => None,
        }
    }

    /// A partial report misses at least one of lat/lon/alt.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Heading normalised into `[0, 360)`.
    pub fn normalized_heading(&self) -> Option<f64> {
        self.heading
            .filter(|h| h.is_finite())
            .map(|h| h.rem_euclid(360.0))
    }

    /// Decode a single JSON object.
    ///
    /// The decoded report keeps the original object in `raw` so selection
    /// can show the payload as received.
    pub fn from_json(json: &str) -> Result<Self, TrackingError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value (must be an object).
    pub fn from_value(value: Value) -> Result<Self, TrackingError> {
        let Value::Object(fields) = &value else {
            return Err(TrackingError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&value)
            )));
        };
        let mut report: Report =
            serde_json::from_value(Value::Object(canonical_fields(fields)))?;
        report.raw = Some(Arc::new(value));
        Ok(report)
    }
}

/// Copy of `fields` with every alias folded into its canonical name.
fn canonical_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    let mut out = fields.clone();
    for (canonical, aliases) in FIELD_ALIASES {
        let mut fallback = None;
        for alias in *aliases {
            if let Some(value) = out.remove(*alias) {
                if fallback.is_none() && !value.is_null() {
                    fallback = Some(value);
                }
            }
        }
        let has_canonical = out.get(*canonical).is_some_and(|v| !v.is_null());
        if let Some(value) = fallback.filter(|_| !has_canonical) {
            out.insert(canonical.to_string(), value);
        }
    }
    out
}

/// Reports decoded from one transport message.
#[derive(Debug, Clone, Default)]
pub struct DecodedMessage {
    pub reports: Vec<Report>,

    /// Elements of an array or envelope that failed to decode and were skipped
    pub skipped: usize,
}

/// Decode one transport message into zero or more reports.
///
/// Accepts a single report object, an array of report objects, or an
/// `{"aircraft": [...]}` envelope as published by common ADS-B decoders.
/// A bad element of an array or envelope is logged and skipped; the rest of
/// the batch still decodes. Only a message that is not JSON, or a single
/// object that does not decode, is an error.
pub fn decode_message(json: &str) -> Result<DecodedMessage, TrackingError> {
    let value: Value = serde_json::from_str(json)?;
    match value {
        Value::Array(items) => Ok(decode_batch(items)),
        Value::Object(mut map) => match map.remove("aircraft") {
            Some(Value::Array(items)) => Ok(decode_batch(items)),
            Some(other) => {
                map.insert("aircraft".to_string(), other);
                decode_single(Value::Object(map))
            }
            None => decode_single(Value::Object(map)),
        },
        other => Err(TrackingError::Decode(format!(
            "expected a JSON object or array, got {}",
            json_kind(&other)
        ))),
    }
}

fn decode_single(value: Value) -> Result<DecodedMessage, TrackingError> {
    Ok(DecodedMessage {
        reports: vec![Report::from_value(value)?],
        skipped: 0,
    })
}

fn decode_batch(items: Vec<Value>) -> DecodedMessage {
    let mut decoded = DecodedMessage {
        reports: Vec::with_capacity(items.len()),
        skipped: 0,
    };
    for (index, item) in items.into_iter().enumerate() {
        match Report::from_value(item) {
            Ok(report) => decoded.reports.push(report),
            Err(e) => {
                warn!(index, error = %e, "Skipping undecodable report");
                decoded.skipped += 1;
            }
        }
    }
    decoded
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_label(deserializer)?.unwrap_or_default())
}
