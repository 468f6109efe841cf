//! The dashboard controller.
//!
//! [`Dashboard`] ties a [`Transport`] to a [`Surface`]: it fetches model
//! metadata, builds the feature form, submits classifications and keeps the
//! history table fresh. It holds exactly one piece of cached state, the last
//! successfully loaded [`ModelInfo`].
//!
//! # Failure model
//!
//! No operation returns an error. Transport and decode failures are logged
//! and turned into an error panel in the slot the operation was drawing;
//! the previous model metadata stays cached.
//!
//! # Ordering
//!
//! Operations take `&self` and may overlap across threads. Each slot write
//! goes through a [`SlotSequencer`] ticket, so when two requests for the
//! same slot race, the one issued last wins no matter which response
//! arrives first. See [`sequence`] for the exact rule.

pub mod form;
pub mod sequence;

use std::sync::{Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::api::{self, ModelInfo, Transport};
use crate::config::schema::DashboardConfig;
use crate::render::{Slot, SlotView, Surface, view};

pub use form::FormSubmission;
pub use sequence::{SlotSequencer, Ticket};

pub const MODEL_INFO_ERROR: &str = "Failed to load model information.";
pub const PREDICTION_ERROR: &str = "Error making prediction.";
pub const HISTORY_ERROR: &str = "Could not load classification history.";
pub const COMPARISON_ERROR: &str = "Could not load model comparison.";

/// Controller for one dashboard instance.
pub struct Dashboard<T, S> {
    transport: T,
    surface: S,
    options: DashboardConfig,
    model_info: Mutex<Option<ModelInfo>>,
    sequencer: SlotSequencer,
}

impl<T: Transport, S: Surface> Dashboard<T, S> {
    pub fn new(transport: T, surface: S, options: DashboardConfig) -> Self {
        Self {
            transport,
            surface,
            options,
            model_info: Mutex::new(None),
            sequencer: SlotSequencer::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn options(&self) -> &DashboardConfig {
        &self.options
    }

    /// The cached model metadata, if any load has succeeded.
    pub fn model_info(&self) -> Option<ModelInfo> {
        self.model_info
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Startup sequence: metadata, then the form built from it, then history.
    pub fn init(&self) {
        info!("initializing dashboard");
        self.load_model_info();
        self.build_prediction_form();
        self.load_history(self.options.history_limit);
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Fetch model metadata, cache it and show it.
    ///
    /// On failure the cache keeps its previous value and an error panel is
    /// shown in the classification result slot.
    pub fn load_model_info(&self) {
        let ticket = self.sequencer.issue(Slot::ModelDetails);

        match api::fetch_model_info(&self.transport) {
            Ok(info) => {
                let applied = self.sequencer.apply(ticket, || {
                    self.surface
                        .render_slot(Slot::ModelDetails, &view::model_details(&info));
                    *self.model_info.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(info);
                });
                if applied.is_none() {
                    debug!(seq = ticket.seq, "discarding superseded model info");
                }
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "error loading model info");
                self.sequencer.apply(ticket, || {
                    self.render_now(Slot::ClassificationResult, &view::error(MODEL_INFO_ERROR));
                });
            }
        }
    }

    /// Replace the feature inputs with one numeric field per model feature.
    ///
    /// Does nothing until metadata with `feature_names` has been loaded.
    pub fn build_prediction_form(&self) {
        let Some(names) = self.model_info().and_then(|info| info.feature_names) else {
            debug!("no feature names cached, skipping form");
            return;
        };
        self.render_now(Slot::FeatureInputs, &view::feature_form(&names));
    }

    /// Submit a filled-in form for classification.
    ///
    /// Values are read with browser `parseFloat` rules and sent as they
    /// parse, NaN included (it reaches the backend as `null`), unless
    /// `reject_non_numeric` is set. A successful prediction refreshes the
    /// history table.
    pub fn submit_prediction(&self, form: &FormSubmission) {
        let bad = form.non_numeric_fields();
        if !bad.is_empty() {
            if self.options.reject_non_numeric {
                warn!(fields = ?bad, "rejecting non-numeric input");
                let message = format!("Please enter numeric values for: {}", bad.join(", "));
                self.render_now(Slot::ClassificationResult, &view::error(message));
                return;
            }
            warn!(fields = ?bad, "sending non-numeric input as NaN");
        }

        let features = form.to_feature_vector();
        let ticket = self.sequencer.issue(Slot::ClassificationResult);
        self.apply(ticket, &SlotView::Loading);

        match api::classify(&self.transport, &features) {
            Ok(result) => {
                info!(
                    predicted_class = %result.predicted_class,
                    confidence = result.confidence,
                    model = %result.model_used,
                    "classification received"
                );
                self.apply(ticket, &view::prediction(&result));
                self.load_history(self.options.history_limit);
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "prediction error");
                self.apply(ticket, &view::error(PREDICTION_ERROR));
            }
        }
    }

    /// Fetch the latest `limit` history records and redraw the table.
    pub fn load_history(&self, limit: u32) {
        let ticket = self.sequencer.issue(Slot::ClassificationHistory);
        self.apply(ticket, &SlotView::Loading);

        match api::fetch_history(&self.transport, limit) {
            Ok(records) => {
                debug!(count = records.len(), limit, "history loaded");
                self.apply(ticket, &view::history(&records));
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "history load error");
                self.apply(ticket, &view::error(HISTORY_ERROR));
            }
        }
    }

    /// Fetch the per-model evaluation table.
    pub fn load_model_comparison(&self) {
        let ticket = self.sequencer.issue(Slot::ModelComparison);
        self.apply(ticket, &SlotView::Loading);

        match api::fetch_model_comparison(&self.transport) {
            Ok(comparison) => self.apply(ticket, &view::comparison(&comparison)),
            Err(e) => {
                error!(error = %format!("{e:#}"), "model comparison load error");
                self.apply(ticket, &view::error(COMPARISON_ERROR));
            }
        }
    }

    /// Chart names the backend offers, or the configured list when the
    /// catalog cannot be fetched or is empty.
    pub fn eda_charts(&self) -> Vec<String> {
        match api::fetch_eda_catalog(&self.transport) {
            Ok(catalog) if !catalog.charts_available.is_empty() => catalog.charts_available,
            Ok(_) => self.options.eda_images.clone(),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "EDA catalog unavailable, using configured charts");
                self.options.eda_images.clone()
            }
        }
    }

    /// Show the EDA image `name`, served at `<eda_prefix>/<name>.png`.
    pub fn show_image(&self, name: &str) {
        let prefix = self.options.eda_prefix.trim_end_matches('/');
        let src = self.transport.resource_url(&format!("{prefix}/{name}.png"));
        let fallback = self.transport.resource_url(&self.options.fallback_image);
        self.render_now(Slot::EdaContent, &view::eda_image(name, src, fallback));
    }

    /// Put an error panel into `slot`.
    pub fn render_error(&self, slot: Slot, message: &str) {
        self.render_now(slot, &view::error(message));
    }

    // -----------------------------------------------------------------------
    // Slot writes
    // -----------------------------------------------------------------------

    fn apply(&self, ticket: Ticket, view: &SlotView) {
        let applied = self
            .sequencer
            .apply(ticket, || self.surface.render_slot(ticket.slot, view));
        if applied.is_none() {
            debug!(slot = %ticket.slot, seq = ticket.seq, "discarding superseded view");
        }
    }

    /// Write `view` under a fresh ticket.
    fn render_now(&self, slot: Slot, view: &SlotView) {
        let ticket = self.sequencer.issue(slot);
        self.apply(ticket, view);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
