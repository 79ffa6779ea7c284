//! Analysis data model.
//!
//! Payloads arrive from two places (the prediction API and the persisted
//! analysis store) and are cached in a session envelope. Everything is
//! normalized into one [`AnalysisRecord`] before it is rendered.

mod demo;

pub use demo::demo_record;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

pub const SYMMETRIC_CIPHER: &str = "Symmetric Cipher";
pub const HASH_FUNCTION: &str = "Hash Function";
pub const MAC_ALGORITHM: &str = "MAC Algorithm";

/// Categories that get a table on the dashboard, in display order.
pub const TABLE_CATEGORIES: [&str; 3] = [SYMMETRIC_CIPHER, HASH_FUNCTION, MAC_ALGORITHM];

pub const DEFAULT_ARCHITECTURE: &str = "Auto-detected";
pub const DEFAULT_PROTOCOL_NAME: &str = "Detected";
pub const UNKNOWN: &str = "Unknown";

/// One candidate algorithm and the model's confidence in it (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmScore {
    pub name: String,
    pub confidence: f64,
}

/// A protocol seen in the binary, with its four lifecycle phase flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolDescriptor {
    #[serde(default = "default_protocol_name", deserialize_with = "name_or_detected")]
    pub name: String,
    #[serde(default, deserialize_with = "truthy_flag")]
    pub initialization: bool,
    #[serde(default, deserialize_with = "truthy_flag")]
    pub handshake: bool,
    #[serde(default, deserialize_with = "truthy_flag")]
    pub key_exchange: bool,
    #[serde(default, deserialize_with = "truthy_flag")]
    pub encrypted_phase: bool,
}

/// Coarse security classification derived from active phase count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    High,
    Medium,
    Low,
}

impl SecurityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            SecurityLevel::High => "High Security",
            SecurityLevel::Medium => "Medium Security",
            SecurityLevel::Low => "Low Security",
        }
    }
}

impl ProtocolDescriptor {
    pub fn new(name: impl Into<String>, flags: [bool; 4]) -> Self {
        Self {
            name: name.into(),
            initialization: flags[0],
            handshake: flags[1],
            key_exchange: flags[2],
            encrypted_phase: flags[3],
        }
    }

    /// Phase flags in lifecycle order.
    pub fn phases(&self) -> [bool; 4] {
        [
            self.initialization,
            self.handshake,
            self.key_exchange,
            self.encrypted_phase,
        ]
    }

    pub fn active_phases(&self) -> usize {
        self.phases().iter().filter(|&&active| active).count()
    }

    pub fn security_level(&self) -> SecurityLevel {
        match self.active_phases() {
            n if n >= 3 => SecurityLevel::High,
            2 => SecurityLevel::Medium,
            _ => SecurityLevel::Low,
        }
    }

    /// Legacy protocols are flagged by name.
    pub fn is_deprecated(&self) -> bool {
        self.name.contains("SSL") || self.name.contains("MD5")
    }
}

fn default_protocol_name() -> String {
    DEFAULT_PROTOCOL_NAME.to_string()
}

fn name_or_detected<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(name) if !name.is_empty() => Ok(name),
        _ => Ok(default_protocol_name()),
    }
}

/// Phase flags follow truthiness: null, zero and empty strings are off.
fn truthy_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(flag) => flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// `None` for missing and empty strings.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Header figures. Each result source fills these differently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMetrics {
    pub crypto_functions: u32,
    pub non_crypto_functions: u32,
    pub avg_confidence: f64,
    pub protocol: Option<String>,
}

/// Function row synthesized for persisted records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionEntry {
    pub address: String,
    pub function: String,
    pub classification: String,
    pub confidence: f64,
}

/// Normalized result of one binary analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub filename: String,
    pub filesize: u64,
    pub architecture: String,
    pub detected: String,
    pub category: String,
    pub confidence: f64,
    pub protocols: Vec<ProtocolDescriptor>,
    pub algorithms_by_category: HashMap<String, Vec<AlgorithmScore>>,
    pub metrics: RecordMetrics,
    pub functions: Vec<FunctionEntry>,
}

impl AnalysisRecord {
    /// Scores for one category in source order; empty when absent.
    pub fn scores(&self, category: &str) -> &[AlgorithmScore] {
        self.algorithms_by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Build from a cached session envelope, applying field defaults.
    pub fn from_envelope(envelope: &SessionResultEnvelope) -> Self {
        let payload = envelope.payload();
        let architecture = non_empty(payload.architecture.clone())
            .or_else(|| non_empty(envelope.architecture.clone()))
            .unwrap_or_else(|| DEFAULT_ARCHITECTURE.to_string());
        let confidence = payload.confidence.unwrap_or(0.0);
        let protocol = payload
            .protocols
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_else(default_protocol_name);

        Self {
            filename: envelope.filename.clone(),
            filesize: envelope.filesize,
            architecture,
            detected: non_empty(payload.detected.clone()).unwrap_or_else(|| UNKNOWN.to_string()),
            category: non_empty(payload.category.clone()).unwrap_or_else(|| UNKNOWN.to_string()),
            confidence,
            metrics: RecordMetrics {
                crypto_functions: 1,
                non_crypto_functions: 0,
                avg_confidence: confidence,
                protocol: Some(protocol),
            },
            protocols: payload.protocols,
            algorithms_by_category: scores_by_category(&payload.algorithms_by_category),
            functions: Vec::new(),
        }
    }
}

/// Raw result payload as produced by `/predict`. Fields default one by one:
/// a field of the wrong type reads as absent without discarding the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub detected: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub architecture: Option<String>,
    #[serde(default, deserialize_with = "lenient_protocols")]
    pub protocols: Vec<ProtocolDescriptor>,
    #[serde(default, deserialize_with = "lenient")]
    pub algorithms_by_category: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub analysis_id: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Non-list values read as no protocols; non-object entries are skipped.
fn lenient_protocols<'de, D>(deserializer: D) -> Result<Vec<ProtocolDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        _ => return Ok(Vec::new()),
    };
    Ok(entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// Convert `{category: {algorithm: confidence}}` keeping source order.
/// Non-object categories and non-numeric confidences are dropped.
pub fn scores_by_category(raw: &Map<String, Value>) -> HashMap<String, Vec<AlgorithmScore>> {
    raw.iter()
        .filter_map(|(category, algorithms)| {
            let algorithms = algorithms.as_object()?;
            let scores = algorithms
                .iter()
                .filter_map(|(name, confidence)| {
                    Some(AlgorithmScore {
                        name: name.clone(),
                        confidence: confidence.as_f64()?,
                    })
                })
                .collect();
            Some((category.clone(), scores))
        })
        .collect()
}

/// Session-scope wrapper around one cached analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResultEnvelope {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub result: Value,
}

impl SessionResultEnvelope {
    pub fn new(filename: impl Into<String>, filesize: u64, result: Value) -> Self {
        Self {
            filename: filename.into(),
            filesize,
            architecture: Some(DEFAULT_ARCHITECTURE.to_string()),
            timestamp: Some(chrono::Utc::now().timestamp_millis()),
            result,
        }
    }

    /// Typed view of the raw result. A non-object result reads as an empty
    /// payload so defaults apply.
    pub fn payload(&self) -> AnalysisPayload {
        if !self.result.is_object() {
            return AnalysisPayload::default();
        }
        match serde_json::from_value::<AnalysisPayload>(self.result.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                log::debug!("Cached result has unexpected shape, using defaults: {}", e);
                AnalysisPayload::default()
            }
        }
    }
}

/// Record returned by the persisted analysis lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedAnalysis {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default)]
    pub detected_algorithm: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

impl PersistedAnalysis {
    /// Persisted records only know a single algorithm; it becomes the sole
    /// detected function.
    pub fn into_record(self) -> AnalysisRecord {
        let detected = non_empty(self.detected_algorithm).unwrap_or_else(|| UNKNOWN.to_string());
        let function = strip_extension(&self.filename).to_string();

        AnalysisRecord {
            architecture: non_empty(self.architecture)
                .unwrap_or_else(|| DEFAULT_ARCHITECTURE.to_string()),
            category: non_empty(self.category).unwrap_or_else(|| UNKNOWN.to_string()),
            confidence: self.confidence,
            protocols: Vec::new(),
            algorithms_by_category: HashMap::new(),
            metrics: RecordMetrics {
                crypto_functions: 1,
                non_crypto_functions: 0,
                avg_confidence: self.confidence,
                protocol: Some(DEFAULT_PROTOCOL_NAME.to_string()),
            },
            functions: vec![FunctionEntry {
                address: "0x00401000".to_string(),
                function,
                classification: detected.clone(),
                confidence: self.confidence,
            }],
            detected,
            filename: self.filename,
            filesize: self.filesize,
        }
    }
}

/// Drop a trailing `.ext` from the last path component. A leading dot
/// counts, so `.bashrc` becomes empty; a bare trailing dot is kept.
fn strip_extension(filename: &str) -> &str {
    let start = filename.rfind('/').map_or(0, |idx| idx + 1);
    match filename[start..].rfind('.') {
        Some(idx) if start + idx + 1 < filename.len() => &filename[..start + idx],
        _ => filename,
    }
}
