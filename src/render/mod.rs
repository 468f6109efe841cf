//! Presentation slots and the surfaces that draw them.
//!
//! A [`Slot`] is a named region of the dashboard. Every write to a slot is
//! a complete [`SlotView`]; there is no partial update. A [`Surface`] owns
//! the slots and decides how a view is drawn:
//!
//! - [`html::HtmlSurface`] keeps an HTML fragment per slot for the web page
//! - [`terminal::TerminalSurface`] prints colored text for the CLI
//!
//! The view builders in [`view`] turn wire data into view models, so the
//! formatting rules (percentages, titles, timestamps) are shared by every
//! surface.

pub mod html;
pub mod terminal;
pub mod view;

use std::sync::Arc;

pub use view::{
    ComparisonRow, ComparisonView, EdaImageView, FeatureField, HistoryRow, ModelDetailsView,
    PredictionView, SlotView,
};

/// Named regions of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    FeatureInputs,
    ClassificationResult,
    ModelDetails,
    EdaContent,
    ClassificationHistory,
    ModelComparison,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::FeatureInputs,
        Slot::ClassificationResult,
        Slot::ModelDetails,
        Slot::EdaContent,
        Slot::ClassificationHistory,
        Slot::ModelComparison,
    ];

    /// Element id of the slot in the dashboard page.
    pub fn element_id(self) -> &'static str {
        match self {
            Self::FeatureInputs => "feature-inputs",
            Self::ClassificationResult => "classification-result",
            Self::ModelDetails => "model-details",
            Self::EdaContent => "eda-content",
            Self::ClassificationHistory => "classification-history-content",
            Self::ModelComparison => "model-comparison-content",
        }
    }

    /// Dense index, used for per-slot bookkeeping arrays.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.element_id())
    }
}

/// Something that can draw slot views.
///
/// `render_slot` replaces the whole content of `slot`. Callers serialize
/// writes per slot; implementations only need interior mutability.
pub trait Surface: Send + Sync {
    fn render_slot(&self, slot: Slot, view: &SlotView);
}

impl<S: Surface + ?Sized> Surface for &S {
    fn render_slot(&self, slot: Slot, view: &SlotView) {
        (**self).render_slot(slot, view)
    }
}

impl<S: Surface + ?Sized> Surface for Arc<S> {
    fn render_slot(&self, slot: Slot, view: &SlotView) {
        (**self).render_slot(slot, view)
    }
}
