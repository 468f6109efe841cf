//! HTML surface for the embedded web dashboard.
//!
//! Keeps the current HTML fragment of every slot. The web server stitches
//! the fragments into the page shell on each `GET /`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};

use super::view::{ComparisonView, EdaImageView, ModelDetailsView, PredictionView};
use super::{FeatureField, HistoryRow, Slot, SlotView, Surface};

/// In-memory slot store rendering views to HTML.
#[derive(Debug, Default)]
pub struct HtmlSurface {
    fragments: Mutex<BTreeMap<Slot, String>>,
}

impl HtmlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current HTML of `slot`; empty while the slot is idle.
    pub fn fragment(&self, slot: Slot) -> String {
        self.lock().get(&slot).cloned().unwrap_or_default()
    }

    /// Current HTML of every slot, keyed by element id.
    pub fn snapshot(&self) -> BTreeMap<&'static str, String> {
        let fragments = self.lock();
        Slot::ALL
            .iter()
            .map(|slot| {
                (
                    slot.element_id(),
                    fragments.get(slot).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Slot, String>> {
        self.fragments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Surface for HtmlSurface {
    fn render_slot(&self, slot: Slot, view: &SlotView) {
        let html = render(slot, view);
        self.lock().insert(slot, html);
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a view as the inner HTML of `slot`.
pub fn render(slot: Slot, view: &SlotView) -> String {
    match view {
        SlotView::Loading => loading(slot),
        SlotView::Error { message } => error_panel(slot, message),
        SlotView::ModelDetails(details) => model_details(details),
        SlotView::FeatureForm { fields } => feature_form(fields),
        SlotView::Prediction(result) => prediction(result),
        SlotView::History { rows } => history_table(rows),
        SlotView::HistoryEmpty => {
            r#"<p class="muted">No classification history available.</p>"#.to_string()
        }
        SlotView::EdaImage(image) => eda_image(image),
        SlotView::Comparison(comparison) => comparison_table(comparison),
    }
}

fn loading(slot: Slot) -> String {
    let tone = if slot == Slot::ClassificationHistory {
        "secondary"
    } else {
        "primary"
    };
    format!(
        r#"<div class="center"><div class="spinner {tone}" role="status"><span class="visually-hidden">Loading...</span></div></div>"#
    )
}

fn error_panel(slot: Slot, message: &str) -> String {
    let icon = if slot == Slot::ClassificationHistory {
        "!"
    } else {
        "&#9888;"
    };
    format!(
        r#"<div class="alert danger"><span class="icon">{icon}</span> {}</div>"#,
        escape(message)
    )
}

fn model_details(details: &ModelDetailsView) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="row"><div class="col"><h5 class="accent">Best Model: {}</h5><h6 class="muted">Hyperparameters:</h6><pre>{}</pre>"#,
        escape(&details.model_name),
        escape(&details.best_params),
    );
    if !details.classes.is_empty() {
        let classes: Vec<String> = details.classes.iter().map(|c| escape(c)).collect();
        let _ = write!(
            html,
            r#"<h6 class="muted">Classes:</h6><p>{}</p>"#,
            classes.join(", ")
        );
    }
    let _ = write!(
        html,
        r#"</div><div class="col"><h6 class="muted">Classification Report:</h6><pre>{}</pre></div></div>"#,
        escape(&details.classification_report),
    );
    html
}

fn feature_form(fields: &[FeatureField]) -> String {
    fields
        .iter()
        .map(|field| {
            let name = escape(&field.name);
            format!(
                r#"<div class="field"><label for="{name}">{}</label><input type="number" id="{name}" name="{name}" step="any" required></div>"#,
                escape(&field.label)
            )
        })
        .collect()
}

fn prediction(result: &PredictionView) -> String {
    let probabilities: String = result
        .probabilities
        .iter()
        .map(|(label, pct)| format!("<li><strong>{}</strong>: {}</li>", escape(label), pct))
        .collect();

    format!(
        concat!(
            r#"<div class="alert success"><h5>&#10004; Classification Result</h5>"#,
            "<p><strong>Predicted Class:</strong> {}</p>",
            "<p><strong>Confidence:</strong> {}</p>",
            "<p><strong>Model Used:</strong> {}</p>",
            "<p><strong>Prediction Probabilities:</strong></p>",
            "<ul>{}</ul></div>"
        ),
        escape(&result.predicted_class),
        result.confidence,
        escape(&result.model_used),
        probabilities,
    )
}

fn history_table(rows: &[HistoryRow]) -> String {
    let body: String = rows
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                r.id,
                escape(&r.predicted_class),
                r.confidence,
                escape(&r.model_used),
                escape(&r.timestamp),
            )
        })
        .collect();

    format!(
        concat!(
            r#"<table class="table"><thead><tr>"#,
            "<th>ID</th><th>Predicted Class</th><th>Confidence</th><th>Model Used</th><th>Timestamp</th>",
            "</tr></thead><tbody>{}</tbody></table>"
        ),
        body
    )
}

fn eda_image(image: &EdaImageView) -> String {
    format!(
        r#"<div class="center"><h5>{}</h5><img src="{}" alt="{}" class="eda" onerror="this.onerror=null;this.src='{}';"></div>"#,
        escape(&image.title),
        escape(&image.src),
        escape(&image.name),
        escape(&image.fallback_src),
    )
}

fn comparison_table(view: &ComparisonView) -> String {
    let body: String = view
        .rows
        .iter()
        .map(|r| {
            let class = if r.is_best { r#" class="best""# } else { "" };
            format!(
                "<tr{class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&r.model_name),
                r.accuracy,
                r.precision,
                r.recall,
                r.f1_score,
                r.roc_auc,
            )
        })
        .collect();

    format!(
        concat!(
            r#"<p class="muted">Best model by {}: <strong>{}</strong></p>"#,
            r#"<table class="table"><thead><tr>"#,
            "<th>Model</th><th>Accuracy</th><th>Precision</th><th>Recall</th><th>F1</th><th>ROC AUC</th>",
            "</tr></thead><tbody>{}</tbody></table>"
        ),
        escape(&view.best_metric),
        escape(&view.best_model),
        body
    )
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
