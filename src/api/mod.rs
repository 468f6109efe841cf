//! Backend API: wire types and the transport seam.
//!
//! The dashboard never talks HTTP directly. It goes through a [`Transport`],
//! which moves JSON values to and from a path on the backend. Production
//! code uses [`http::HttpTransport`]; tests substitute scripted fakes.
//!
//! The typed helpers at the bottom of this module ([`fetch_model_info`],
//! [`classify`], ...) own the endpoint paths and response decoding, so the
//! controller only ever sees typed values or an error.

pub mod http;

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const MODEL_INFO_PATH: &str = "/model-info";
pub const CLASSIFY_PATH: &str = "/classify";
pub const HISTORY_PATH: &str = "/classification-history";
pub const MODEL_COMPARISON_PATH: &str = "/model-comparison";
pub const EDA_CATALOG_PATH: &str = "/eda";

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Moves JSON between the dashboard and the backend.
///
/// Any transport error, non-2xx status or non-JSON body is reported as an
/// `Err`. Implementations must be shareable across threads: the controller
/// allows overlapping requests from different callers.
pub trait Transport: Send + Sync {
    /// `GET path` and decode the body as JSON.
    fn get_json(&self, path: &str) -> Result<Value>;

    /// `POST path` with a JSON body and decode the response as JSON.
    fn post_json(&self, path: &str, body: &Value) -> Result<Value>;

    /// Absolute location of a plain resource (images) on the backend.
    fn resource_url(&self, path: &str) -> String {
        path.to_string()
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get_json(&self, path: &str) -> Result<Value> {
        (**self).get_json(path)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        (**self).post_json(path, body)
    }

    fn resource_url(&self, path: &str) -> String {
        (**self).resource_url(path)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get_json(&self, path: &str) -> Result<Value> {
        (**self).get_json(path)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        (**self).post_json(path, body)
    }

    fn resource_url(&self, path: &str) -> String {
        (**self).resource_url(path)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Metadata about the deployed classifier.
///
/// `feature_names` is optional on the wire; when it is absent the feature
/// form is simply not built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub best_params: Value,
    #[serde(default)]
    pub classification_report: Option<String>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    #[serde(default)]
    pub classes: Vec<String>,
}

/// Ordered `name → value` pairs, serialized as a JSON object.
///
/// Field order is preserved in both directions. Non-finite values serialize
/// as JSON `null`, which is what the backend receives for unparseable input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedValues(pub Vec<(String, f64)>);

impl NamedValues {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

impl FromIterator<(String, f64)> for NamedValues {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for NamedValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NamedValues {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct NamedValuesVisitor;

        impl<'de> Visitor<'de> for NamedValuesVisitor {
            type Value = NamedValues;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<NamedValues, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, Option<f64>>()? {
                    pairs.push((name, value.unwrap_or(f64::NAN)));
                }
                Ok(NamedValues(pairs))
            }
        }

        deserializer.deserialize_map(NamedValuesVisitor)
    }
}

/// Feature inputs for a single classification request.
pub type FeatureVector = NamedValues;

/// Body of `POST /classify`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifyRequest<'a> {
    pub features: &'a FeatureVector,
}

/// Response of `POST /classify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_class: String,
    pub confidence: f64,
    pub model_used: String,
    pub prediction_probabilities: NamedValues,
}

/// One row of `GET /classification-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub predicted_class: String,
    pub confidence: f64,
    pub model_used: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Per-model evaluation metrics from `GET /model-comparison`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub model_name: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub roc_auc: f64,
    #[serde(default)]
    pub best_params: Value,
    #[serde(default)]
    pub confusion_matrix: Vec<Vec<i64>>,
}

/// Response of `GET /model-comparison`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    pub models: Vec<ModelMetrics>,
    pub best_model: String,
    pub best_metric: String,
}

/// Response of `GET /eda`: which EDA charts the backend can serve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdaCatalog {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub charts_available: Vec<String>,
}

// ---------------------------------------------------------------------------
// Typed calls
// ---------------------------------------------------------------------------

/// `GET /model-info`.
pub fn fetch_model_info<T: Transport + ?Sized>(transport: &T) -> Result<ModelInfo> {
    let value = transport.get_json(MODEL_INFO_PATH)?;
    serde_json::from_value(value).context("failed to parse model info")
}

/// `POST /classify` with `{ "features": ... }`.
pub fn classify<T: Transport + ?Sized>(
    transport: &T,
    features: &FeatureVector,
) -> Result<PredictionResult> {
    let body = serde_json::to_value(ClassifyRequest { features })
        .context("failed to encode classify request")?;
    let value = transport.post_json(CLASSIFY_PATH, &body)?;
    serde_json::from_value(value).context("failed to parse prediction result")
}

/// `GET /classification-history?limit=N`.
pub fn fetch_history<T: Transport + ?Sized>(
    transport: &T,
    limit: u32,
) -> Result<Vec<HistoryRecord>> {
    let value = transport.get_json(&history_path(limit))?;
    serde_json::from_value(value).context("failed to parse classification history")
}

/// `GET /model-comparison`.
pub fn fetch_model_comparison<T: Transport + ?Sized>(transport: &T) -> Result<ModelComparison> {
    let value = transport.get_json(MODEL_COMPARISON_PATH)?;
    serde_json::from_value(value).context("failed to parse model comparison")
}

/// `GET /eda`.
pub fn fetch_eda_catalog<T: Transport + ?Sized>(transport: &T) -> Result<EdaCatalog> {
    let value = transport.get_json(EDA_CATALOG_PATH)?;
    serde_json::from_value(value).context("failed to parse EDA catalog")
}

/// Path of the history endpoint for the given limit.
pub fn history_path(limit: u32) -> String {
    format!("{HISTORY_PATH}?limit={limit}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
