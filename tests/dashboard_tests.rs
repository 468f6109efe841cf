/// Controller behaviour tests.
///
/// Exercise the dashboard end to end against a scripted in-memory transport
/// and a surface that records every slot write, covering form generation,
/// submission bodies, result and history rendering, failure handling and
/// the per-slot ordering of overlapping requests.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use anyhow::Result;
use mldash::api::Transport;
use mldash::config::schema::DashboardConfig;
use mldash::dashboard::{self, Dashboard, FormSubmission};
use mldash::render::{Slot, SlotView, Surface};
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get(String),
    Post(String, Value),
}

/// Transport with canned responses per path. Paths without a response fail.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    fn respond(self, path: &str, value: Value) -> Self {
        self.set(path, value);
        self
    }

    fn set(&self, path: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), value);
    }

    fn unset(&self, path: &str) {
        self.responses.lock().unwrap().remove(path);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn lookup(&self, path: &str) -> Result<Value> {
        self.responses
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("connection refused: {path}"))
    }
}

impl Transport for ScriptedTransport {
    fn get_json(&self, path: &str) -> Result<Value> {
        self.calls.lock().unwrap().push(Call::Get(path.to_string()));
        self.lookup(path)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Post(path.to_string(), body.clone()));
        self.lookup(path)
    }
}

/// Surface remembering every write in order.
#[derive(Default)]
struct RecordingSurface {
    writes: Mutex<Vec<(Slot, SlotView)>>,
}

impl RecordingSurface {
    fn writes_to(&self, slot: Slot) -> Vec<SlotView> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn current(&self, slot: Slot) -> Option<SlotView> {
        self.writes_to(slot).pop()
    }
}

impl Surface for RecordingSurface {
    fn render_slot(&self, slot: Slot, view: &SlotView) {
        self.writes.lock().unwrap().push((slot, view.clone()));
    }
}

type TestDashboard = Dashboard<Arc<ScriptedTransport>, Arc<RecordingSurface>>;

fn dashboard(transport: ScriptedTransport) -> (TestDashboard, Arc<ScriptedTransport>, Arc<RecordingSurface>) {
    dashboard_with(transport, DashboardConfig::default())
}

fn dashboard_with(
    transport: ScriptedTransport,
    options: DashboardConfig,
) -> (TestDashboard, Arc<ScriptedTransport>, Arc<RecordingSurface>) {
    let transport = Arc::new(transport);
    let surface = Arc::new(RecordingSurface::default());
    let dash = Dashboard::new(transport.clone(), surface.clone(), options);
    (dash, transport, surface)
}

fn model_info(names: &[&str]) -> Value {
    json!({
        "model_name": "RandomForestClassifier",
        "best_params": {"n_estimators": 200, "max_depth": 8},
        "classification_report": "              precision    recall\n           A       0.90      0.88",
        "feature_names": names,
        "classes": ["A", "B"]
    })
}

fn prediction() -> Value {
    json!({
        "predicted_class": "A",
        "confidence": 0.87,
        "model_used": "rf",
        "prediction_probabilities": {"A": 0.87, "B": 0.13}
    })
}

fn history(ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| {
                json!({
                    "id": id,
                    "predicted_class": "A",
                    "confidence": 0.5,
                    "model_used": "rf",
                    "timestamp": "2024-05-01T10:00:00"
                })
            })
            .collect(),
    )
}

fn form_field_names(view: &SlotView) -> Vec<String> {
    match view {
        SlotView::FeatureForm { fields } => fields.iter().map(|f| f.name.clone()).collect(),
        other => panic!("expected a feature form, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Metadata and form
// ---------------------------------------------------------------------------

#[test]
fn form_has_one_input_per_feature_in_order() {
    let names = ["sepal-length", "sepal-width", "petal-length", "petal-width"];
    let (dash, _, surface) =
        dashboard(ScriptedTransport::default().respond("/model-info", model_info(&names)));

    dash.load_model_info();
    dash.build_prediction_form();

    let form = surface.current(Slot::FeatureInputs).unwrap();
    assert_eq!(form_field_names(&form), names);

    let SlotView::FeatureForm { fields } = form else {
        unreachable!()
    };
    assert_eq!(fields[0].label, "Sepal Length");
}

#[test]
fn rebuilding_form_replaces_fields() {
    let (dash, transport, surface) =
        dashboard(ScriptedTransport::default().respond("/model-info", model_info(&["a", "b"])));

    dash.load_model_info();
    dash.build_prediction_form();
    dash.build_prediction_form();
    assert_eq!(form_field_names(&surface.current(Slot::FeatureInputs).unwrap()), ["a", "b"]);

    transport.set("/model-info", model_info(&["c"]));
    dash.load_model_info();
    dash.build_prediction_form();
    assert_eq!(form_field_names(&surface.current(Slot::FeatureInputs).unwrap()), ["c"]);
}

#[test]
fn model_details_render_on_success() {
    let (dash, _, surface) =
        dashboard(ScriptedTransport::default().respond("/model-info", model_info(&["a"])));

    dash.load_model_info();

    let Some(SlotView::ModelDetails(details)) = surface.current(Slot::ModelDetails) else {
        panic!("model details not rendered");
    };
    assert_eq!(details.model_name, "RandomForestClassifier");
    assert!(details.best_params.contains("\"n_estimators\": 200"));
    assert!(details.classification_report.contains("precision"));
    assert_eq!(dash.model_info().unwrap().classes, vec!["A", "B"]);
}

#[test]
fn first_metadata_failure_leaves_cache_empty_and_shows_error() {
    let (dash, _, surface) = dashboard(ScriptedTransport::default());

    dash.load_model_info();

    assert!(dash.model_info().is_none());
    assert_eq!(
        surface.current(Slot::ClassificationResult),
        Some(SlotView::Error {
            message: dashboard::MODEL_INFO_ERROR.to_string()
        })
    );

    // Building the form afterwards is a quiet no-op.
    dash.build_prediction_form();
    assert!(surface.writes_to(Slot::FeatureInputs).is_empty());
}

#[test]
fn later_metadata_failure_keeps_previous_cache() {
    let (dash, transport, surface) =
        dashboard(ScriptedTransport::default().respond("/model-info", model_info(&["a"])));

    dash.load_model_info();
    transport.unset("/model-info");
    dash.load_model_info();

    let cached = dash.model_info().unwrap();
    assert_eq!(cached.feature_names, Some(vec!["a".to_string()]));
    assert!(matches!(
        surface.current(Slot::ClassificationResult),
        Some(SlotView::Error { .. })
    ));
    assert!(matches!(
        surface.current(Slot::ModelDetails),
        Some(SlotView::ModelDetails(_))
    ));
}

#[test]
fn malformed_metadata_counts_as_failure() {
    let (dash, _, surface) = dashboard(
        ScriptedTransport::default().respond("/model-info", json!({"feature_names": "oops"})),
    );

    dash.load_model_info();

    assert!(dash.model_info().is_none());
    assert!(matches!(
        surface.current(Slot::ClassificationResult),
        Some(SlotView::Error { .. })
    ));
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[test]
fn submission_posts_features_and_refreshes_history() {
    let (dash, transport, _) = dashboard(
        ScriptedTransport::default()
            .respond("/classify", prediction())
            .respond("/classification-history?limit=50", history(&[1])),
    );

    dash.submit_prediction(&FormSubmission::new().field("f1", "1.5").field("f2", "-2"));

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    let Call::Post(path, body) = &calls[0] else {
        panic!("expected POST first, got {:?}", calls[0]);
    };
    assert_eq!(path, "/classify");
    assert_eq!(body["features"]["f1"].as_f64(), Some(1.5));
    assert_eq!(body["features"]["f2"].as_f64(), Some(-2.0));
    assert_eq!(body["features"].as_object().unwrap().len(), 2);
    assert_eq!(body.as_object().unwrap().len(), 1);
    assert_eq!(calls[1], Call::Get("/classification-history?limit=50".to_string()));
}

#[test]
fn submission_renders_loading_then_result() {
    let (dash, _, surface) = dashboard(
        ScriptedTransport::default()
            .respond("/classify", prediction())
            .respond("/classification-history?limit=50", history(&[])),
    );

    dash.submit_prediction(&FormSubmission::new().field("f1", "1"));

    let writes = surface.writes_to(Slot::ClassificationResult);
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], SlotView::Loading);
    let SlotView::Prediction(result) = &writes[1] else {
        panic!("expected prediction, got {:?}", writes[1]);
    };
    assert_eq!(result.predicted_class, "A");
    assert_eq!(result.confidence, "87.00%");
    assert_eq!(result.model_used, "rf");
    assert_eq!(
        result.probabilities,
        vec![
            ("A".to_string(), "87.00%".to_string()),
            ("B".to_string(), "13.00%".to_string()),
        ]
    );
}

#[test]
fn failed_submission_shows_error_and_skips_history() {
    let (dash, transport, surface) = dashboard(
        ScriptedTransport::default().respond("/classification-history?limit=50", history(&[1])),
    );

    dash.submit_prediction(&FormSubmission::new().field("f1", "1"));

    assert_eq!(
        surface.current(Slot::ClassificationResult),
        Some(SlotView::Error {
            message: dashboard::PREDICTION_ERROR.to_string()
        })
    );
    assert_eq!(transport.calls().len(), 1);
    assert!(surface.writes_to(Slot::ClassificationHistory).is_empty());
}

#[test]
fn unexpected_prediction_shape_is_a_failure() {
    let (dash, _, surface) = dashboard(
        ScriptedTransport::default().respond("/classify", json!({"detail": "model exploded"})),
    );

    dash.submit_prediction(&FormSubmission::new().field("f1", "1"));

    assert!(matches!(
        surface.current(Slot::ClassificationResult),
        Some(SlotView::Error { .. })
    ));
}

#[test]
fn non_numeric_input_is_sent_as_null_by_default() {
    let (dash, transport, _) = dashboard(
        ScriptedTransport::default()
            .respond("/classify", prediction())
            .respond("/classification-history?limit=50", history(&[])),
    );

    dash.submit_prediction(&FormSubmission::new().field("f1", "abc").field("f2", ""));

    let Call::Post(_, body) = &transport.calls()[0] else {
        panic!("expected a POST");
    };
    assert_eq!(body, &json!({"features": {"f1": null, "f2": null}}));
}

#[test]
fn non_numeric_input_can_be_rejected() {
    let options = DashboardConfig {
        reject_non_numeric: true,
        ..DashboardConfig::default()
    };
    let (dash, transport, surface) = dashboard_with(
        ScriptedTransport::default().respond("/classify", prediction()),
        options,
    );

    dash.submit_prediction(&FormSubmission::new().field("f1", "1").field("f2", "x"));

    assert!(transport.calls().is_empty());
    let Some(SlotView::Error { message }) = surface.current(Slot::ClassificationResult) else {
        panic!("expected an error panel");
    };
    assert!(message.contains("f2"));
    assert!(!message.contains("f1"));
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn history_renders_rows_in_received_order() {
    let (dash, _, surface) = dashboard(
        ScriptedTransport::default().respond("/classification-history?limit=3", history(&[9, 4, 7])),
    );

    dash.load_history(3);

    let writes = surface.writes_to(Slot::ClassificationHistory);
    assert_eq!(writes[0], SlotView::Loading);
    let SlotView::History { rows } = &writes[1] else {
        panic!("expected history rows");
    };
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![9, 4, 7]);
    assert_eq!(rows[0].confidence, "50.00%");
    assert_eq!(rows[0].timestamp, "2024-05-01 10:00:00");
}

#[test]
fn empty_history_renders_message() {
    let (dash, _, surface) = dashboard(
        ScriptedTransport::default().respond("/classification-history?limit=50", history(&[])),
    );

    dash.load_history(50);

    assert_eq!(surface.current(Slot::ClassificationHistory), Some(SlotView::HistoryEmpty));
}

#[test]
fn history_failure_renders_error() {
    let (dash, _, surface) = dashboard(ScriptedTransport::default());

    dash.load_history(50);

    assert_eq!(
        surface.current(Slot::ClassificationHistory),
        Some(SlotView::Error {
            message: dashboard::HISTORY_ERROR.to_string()
        })
    );
}

#[test]
fn init_loads_metadata_form_and_history() {
    let (dash, transport, surface) = dashboard(
        ScriptedTransport::default()
            .respond("/model-info", model_info(&["x", "y"]))
            .respond("/classification-history?limit=50", history(&[1, 2])),
    );

    dash.init();

    assert_eq!(
        transport.calls(),
        vec![
            Call::Get("/model-info".to_string()),
            Call::Get("/classification-history?limit=50".to_string()),
        ]
    );
    assert_eq!(form_field_names(&surface.current(Slot::FeatureInputs).unwrap()), ["x", "y"]);
    assert!(matches!(
        surface.current(Slot::ClassificationHistory),
        Some(SlotView::History { .. })
    ));
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[test]
fn model_comparison_renders_table() {
    let (dash, _, surface) = dashboard(ScriptedTransport::default().respond(
        "/model-comparison",
        json!({
            "models": [{
                "model_name": "rf", "accuracy": 0.9, "precision": 0.91, "recall": 0.89,
                "f1_score": 0.9, "roc_auc": 0.95, "best_params": {}, "confusion_matrix": [[5, 1], [1, 5]]
            }],
            "best_model": "rf",
            "best_metric": "f1_score"
        }),
    ));

    dash.load_model_comparison();

    let Some(SlotView::Comparison(view)) = surface.current(Slot::ModelComparison) else {
        panic!("comparison not rendered");
    };
    assert_eq!(view.rows.len(), 1);
    assert!(view.rows[0].is_best);
}

// ---------------------------------------------------------------------------
// Overlapping requests
// ---------------------------------------------------------------------------

/// Metadata transport whose first call blocks until released.
struct RacingTransport {
    calls: AtomicUsize,
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Transport for RacingTransport {
    fn get_json(&self, _path: &str) -> Result<Value> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(json!({"model_name": "issued-first", "feature_names": ["old"]}))
        } else {
            Ok(json!({"model_name": "issued-second", "feature_names": ["new"]}))
        }
    }

    fn post_json(&self, _path: &str, _body: &Value) -> Result<Value> {
        anyhow::bail!("unused")
    }
}

#[test]
fn stale_metadata_response_is_discarded() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let transport = RacingTransport {
        calls: AtomicUsize::new(0),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let surface = Arc::new(RecordingSurface::default());
    let dash = Arc::new(Dashboard::new(
        transport,
        surface.clone(),
        DashboardConfig::default(),
    ));

    let first = {
        let dash = Arc::clone(&dash);
        thread::spawn(move || dash.load_model_info())
    };
    entered_rx.recv().unwrap();

    // Issued second, resolves first.
    dash.load_model_info();
    assert_eq!(dash.model_info().unwrap().model_name, "issued-second");

    // Issued first, resolves last: must not overwrite.
    release_tx.send(()).unwrap();
    first.join().unwrap();

    assert_eq!(dash.model_info().unwrap().model_name, "issued-second");
    let details = surface.writes_to(Slot::ModelDetails);
    assert_eq!(details.len(), 1);

    dash.build_prediction_form();
    assert_eq!(form_field_names(&surface.current(Slot::FeatureInputs).unwrap()), ["new"]);
}

#[test]
fn sequential_metadata_loads_keep_latest() {
    let (dash, transport, _) =
        dashboard(ScriptedTransport::default().respond("/model-info", model_info(&["a"])));

    dash.load_model_info();
    transport.set("/model-info", model_info(&["b"]));
    dash.load_model_info();

    assert_eq!(dash.model_info().unwrap().feature_names, Some(vec!["b".to_string()]));
}

#[test]
fn render_error_writes_only_its_slot() {
    let (dash, transport, surface) = dashboard(ScriptedTransport::default());
    dash.render_error(Slot::EdaContent, "x");

    assert_eq!(
        surface.writes_to(Slot::EdaContent),
        vec![SlotView::Error {
            message: "x".to_string()
        }]
    );
    for slot in Slot::ALL.into_iter().filter(|s| *s != Slot::EdaContent) {
        assert!(surface.writes_to(slot).is_empty(), "unexpected write to {slot}");
    }
    assert!(transport.calls().is_empty());
}

#[test]
fn render_error_supersedes_in_flight_load() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let transport = RacingTransport {
        calls: AtomicUsize::new(0),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let surface = Arc::new(RecordingSurface::default());
    let dash = Arc::new(Dashboard::new(
        transport,
        surface.clone(),
        DashboardConfig::default(),
    ));

    let load = {
        let dash = Arc::clone(&dash);
        thread::spawn(move || dash.load_model_info())
    };
    entered_rx.recv().unwrap();

    dash.render_error(Slot::ModelDetails, "backend restarting");
    release_tx.send(()).unwrap();
    load.join().unwrap();

    assert_eq!(
        surface.current(Slot::ModelDetails),
        Some(SlotView::Error {
            message: "backend restarting".to_string()
        })
    );
    assert!(dash.model_info().is_none());
}
