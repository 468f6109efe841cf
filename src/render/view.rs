//! View models: what each slot shows, already formatted for display.
//!
//! Builders here are pure. They take wire types from [`crate::api`] and
//! return a [`SlotView`]; surfaces only lay the strings out.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;

use crate::api::{HistoryRecord, ModelComparison, ModelInfo, PredictionResult};

/// Start of every word: an ASCII word character right after an ASCII word
/// boundary. Non-ASCII letters are neither word characters nor uppercased,
/// matching how browsers read `\b\w`.
static WORD_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)[A-Za-z0-9_]").expect("word-start regex must compile")
});

/// Timestamp layout used for history rows.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Complete content of one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotView {
    /// A request for this slot is in flight.
    Loading,
    /// The last request for this slot failed.
    Error { message: String },
    ModelDetails(ModelDetailsView),
    /// One numeric input per feature, in model order.
    FeatureForm { fields: Vec<FeatureField> },
    Prediction(PredictionView),
    /// History rows in the order the backend returned them.
    History { rows: Vec<HistoryRow> },
    /// The backend returned no history at all.
    HistoryEmpty,
    EdaImage(EdaImageView),
    Comparison(ComparisonView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelDetailsView {
    pub model_name: String,
    /// Hyperparameters as pretty-printed JSON.
    pub best_params: String,
    pub classification_report: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureField {
    /// Form field name, identical to the feature name sent to the backend.
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionView {
    pub predicted_class: String,
    pub confidence: String,
    pub model_used: String,
    /// `(class, percentage)` in backend order.
    pub probabilities: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub id: i64,
    pub predicted_class: String,
    pub confidence: String,
    pub model_used: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdaImageView {
    pub name: String,
    pub title: String,
    pub src: String,
    pub fallback_src: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonView {
    pub best_model: String,
    pub best_metric: String,
    pub rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub model_name: String,
    pub accuracy: String,
    pub precision: String,
    pub recall: String,
    pub f1_score: String,
    pub roc_auc: String,
    pub is_best: bool,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn error(message: impl Into<String>) -> SlotView {
    SlotView::Error {
        message: message.into(),
    }
}

pub fn model_details(info: &ModelInfo) -> SlotView {
    let best_params =
        serde_json::to_string_pretty(&info.best_params).unwrap_or_else(|_| "{}".to_string());

    SlotView::ModelDetails(ModelDetailsView {
        model_name: info.model_name.clone(),
        best_params,
        classification_report: info.classification_report.clone().unwrap_or_default(),
        classes: info.classes.clone(),
    })
}

pub fn feature_form(feature_names: &[String]) -> SlotView {
    SlotView::FeatureForm {
        fields: feature_names
            .iter()
            .map(|name| FeatureField {
                name: name.clone(),
                label: format_title(name),
            })
            .collect(),
    }
}

pub fn prediction(result: &PredictionResult) -> SlotView {
    SlotView::Prediction(PredictionView {
        predicted_class: result.predicted_class.clone(),
        confidence: format_percent(result.confidence),
        model_used: result.model_used.clone(),
        probabilities: result
            .prediction_probabilities
            .iter()
            .map(|(label, prob)| (label.to_string(), format_percent(prob)))
            .collect(),
    })
}

pub fn history(records: &[HistoryRecord]) -> SlotView {
    if records.is_empty() {
        return SlotView::HistoryEmpty;
    }

    SlotView::History {
        rows: records
            .iter()
            .map(|r| HistoryRow {
                id: r.id,
                predicted_class: r.predicted_class.clone(),
                confidence: format_percent(r.confidence),
                model_used: r.model_used.clone(),
                timestamp: format_timestamp(&r.timestamp),
            })
            .collect(),
    }
}

pub fn eda_image(name: &str, src: String, fallback_src: String) -> SlotView {
    SlotView::EdaImage(EdaImageView {
        name: name.to_string(),
        title: format_title(name),
        src,
        fallback_src,
    })
}

pub fn comparison(data: &ModelComparison) -> SlotView {
    let metric = |v: f64| format!("{v:.4}");
    SlotView::Comparison(ComparisonView {
        best_model: data.best_model.clone(),
        best_metric: data.best_metric.clone(),
        rows: data
            .models
            .iter()
            .map(|m| ComparisonRow {
                model_name: m.model_name.clone(),
                accuracy: metric(m.accuracy),
                precision: metric(m.precision),
                recall: metric(m.recall),
                f1_score: metric(m.f1_score),
                roc_auc: metric(m.roc_auc),
                is_best: m.model_name == data.best_model,
            })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Human-readable label for a feature or chart name: hyphens become spaces
/// and every word starts upper-case. Underscores are word characters, so
/// `petal_width` becomes `Petal_width`.
pub fn format_title(name: &str) -> String {
    let spaced = name.replace('-', " ");
    WORD_START_RE
        .replace_all(&spaced, |caps: &regex::Captures| caps[0].to_uppercase())
        .into_owned()
}

/// A `[0, 1]` fraction as a percentage with two decimals: `0.87` → `87.00%`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Render an ISO-8601 timestamp in local time.
///
/// Offset-carrying timestamps are converted to the local zone; naive ones
/// are taken as already local. Anything unparseable is shown as received.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format(TIMESTAMP_FORMAT).to_string();
    }
    raw.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
