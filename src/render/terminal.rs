/// Terminal surface for the CLI.
///
/// Each slot write is printed as a titled block. Loading states are only
/// logged at debug level: a terminal cannot replace what it already printed,
/// so showing them would leave stale spinners in the scrollback.
use std::io::Write;
use std::sync::{Mutex, PoisonError};

use colored::Colorize;
use tracing::debug;

use super::{Slot, SlotView, Surface};

pub struct TerminalSurface {
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalSurface {
    /// Surface printing to standard output.
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl Surface for TerminalSurface {
    fn render_slot(&self, slot: Slot, view: &SlotView) {
        if matches!(view, SlotView::Loading) {
            debug!(%slot, "loading");
            return;
        }

        let text = render_text(slot, view);
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Best-effort: a closed stdout must not take the dashboard down.
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// Heading printed above each slot.
fn heading(slot: Slot) -> &'static str {
    match slot {
        Slot::FeatureInputs => "Feature Inputs",
        Slot::ClassificationResult => "Classification Result",
        Slot::ModelDetails => "Model Details",
        Slot::EdaContent => "Exploratory Data Analysis",
        Slot::ClassificationHistory => "Classification History",
        Slot::ModelComparison => "Model Comparison",
    }
}

/// Render a view as colored terminal text, ending with a blank line.
pub fn render_text(slot: Slot, view: &SlotView) -> String {
    let mut lines = vec![heading(slot).bold().cyan().to_string(), "=".repeat(60)];

    match view {
        SlotView::Loading => lines.push("Loading...".dimmed().to_string()),
        SlotView::Error { message } => lines.push(format!("{}", message.red())),
        SlotView::ModelDetails(details) => {
            lines.push(format!(
                "  {} {}",
                "Best model:".bold(),
                details.model_name.green()
            ));
            if !details.classes.is_empty() {
                lines.push(format!(
                    "  {} {}",
                    "Classes:   ".bold(),
                    details.classes.join(", ")
                ));
            }
            lines.push(format!("  {}", "Hyperparameters:".bold()));
            lines.extend(details.best_params.lines().map(|l| format!("    {l}")));
            if !details.classification_report.is_empty() {
                lines.push(format!("  {}", "Classification report:".bold()));
                lines.extend(
                    details
                        .classification_report
                        .lines()
                        .map(|l| format!("    {l}")),
                );
            }
        }
        SlotView::FeatureForm { fields } => {
            lines.push(format!("  {:<28} Field", "Label"));
            lines.push(format!("  {}", "-".repeat(58)));
            for field in fields {
                lines.push(format!("  {:<28} {}", field.label, field.name.dimmed()));
            }
        }
        SlotView::Prediction(result) => {
            lines.push(format!(
                "  {} {}",
                "Predicted class:".bold(),
                result.predicted_class.green().bold()
            ));
            lines.push(format!("  {} {}", "Confidence:     ".bold(), result.confidence));
            lines.push(format!("  {} {}", "Model used:     ".bold(), result.model_used));
            lines.push(format!("  {}", "Prediction probabilities:".bold()));
            for (label, pct) in &result.probabilities {
                lines.push(format!("    {label:<20} {pct:>8}"));
            }
        }
        SlotView::History { rows } => {
            lines.push(format!(
                "  {:>6} {:<20} {:>10} {:<16} Timestamp",
                "ID", "Predicted Class", "Confidence", "Model Used"
            ));
            lines.push(format!("  {}", "-".repeat(76)));
            for (i, r) in rows.iter().enumerate() {
                let line = format!(
                    "  {:>6} {:<20} {:>10} {:<16} {}",
                    r.id, r.predicted_class, r.confidence, r.model_used, r.timestamp
                );
                if i % 2 == 0 {
                    lines.push(line);
                } else {
                    lines.push(line.dimmed().to_string());
                }
            }
        }
        SlotView::HistoryEmpty => lines.push(
            "No classification history available."
                .yellow()
                .to_string(),
        ),
        SlotView::EdaImage(image) => {
            lines.push(format!("  {}", image.title.bold()));
            lines.push(format!("  {} {}", "Image:   ".bold(), image.src));
            lines.push(format!("  {} {}", "Fallback:".bold(), image.fallback_src));
        }
        SlotView::Comparison(view) => {
            lines.push(format!(
                "  Best model by {}: {}",
                view.best_metric,
                view.best_model.green().bold()
            ));
            lines.push(format!(
                "  {:<24} {:>9} {:>9} {:>9} {:>9} {:>9}",
                "Model", "Accuracy", "Precision", "Recall", "F1", "ROC AUC"
            ));
            lines.push(format!("  {}", "-".repeat(74)));
            for r in &view.rows {
                let line = format!(
                    "  {:<24} {:>9} {:>9} {:>9} {:>9} {:>9}",
                    r.model_name, r.accuracy, r.precision, r.recall, r.f1_score, r.roc_auc
                );
                if r.is_best {
                    lines.push(line.green().to_string());
                } else {
                    lines.push(line);
                }
            }
        }
    }

    lines.push(String::new());
    lines.push(String::new());
    lines.join("\n")
}
