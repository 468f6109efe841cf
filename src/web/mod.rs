//! Embedded web dashboard for mldash.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves
//! the server-rendered dashboard page and the form endpoints driving the
//! controller:
//!
//! - `GET /`: the page, with every slot's current content
//! - `POST /classify`: submit the feature form
//! - `POST /history/refresh`, `POST /model-info/reload`,
//!   `POST /model-comparison/reload`: re-run a load
//! - `GET /eda/show?name=N`: show an EDA image
//! - `GET /api/slots`: current slot fragments as JSON
//!
//! Launched via `mldash serve` (default: `http://127.0.0.1:9750`).

mod frontend;

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{info, warn};

use crate::api::Transport;
use crate::api::http::HttpTransport;
use crate::config::DashConfig;
use crate::config::schema::DashboardConfig;
use crate::dashboard::{Dashboard, FormSubmission};
use crate::render::html::HtmlSurface;

pub use frontend::render_page;

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). Errors are handled per request without
/// stopping the server.
pub fn serve(config: &DashConfig) -> Result<()> {
    let addr = config.server.bind.as_str();
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let transport = HttpTransport::from_config(&config.api);
    info!(backend = transport.base_url(), "using prediction backend");

    let mut app = WebApp::new(transport, config.dashboard.clone());
    app.start();

    println!("mldash dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if config.server.open_browser {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            warn!(error = %e, "could not open browser");
        }
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let body = if matches!(method, Method::Post | Method::Put) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = app.dispatch(&method, &url, body.as_deref()).unwrap_or_else(|e| {
            warn!(error = %format!("{e:#}"), %url, "request failed");
            Reply::json(500, serde_json::json!({ "error": e.to_string() }).to_string())
        });

        info!(%method, %url, status = reply.status, "request");
        let _ = request.respond(reply.into_response());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// The dashboard controller wired to an HTML surface.
pub struct WebApp<T> {
    dashboard: Dashboard<T, Arc<HtmlSurface>>,
    surface: Arc<HtmlSurface>,
    charts: Vec<String>,
}

impl<T: Transport> WebApp<T> {
    pub fn new(transport: T, options: DashboardConfig) -> Self {
        let surface = Arc::new(HtmlSurface::new());
        let charts = options.eda_images.clone();
        Self {
            dashboard: Dashboard::new(transport, Arc::clone(&surface), options),
            surface,
            charts,
        }
    }

    /// Initial load: metadata, form, history, comparison and chart list.
    pub fn start(&mut self) {
        self.dashboard.init();
        self.dashboard.load_model_comparison();
        self.charts = self.dashboard.eda_charts();
    }

    pub fn dashboard(&self) -> &Dashboard<T, Arc<HtmlSurface>> {
        &self.dashboard
    }

    /// The full page as currently rendered.
    pub fn page(&self) -> String {
        render_page(&self.surface.snapshot(), &self.charts)
    }

    /// Route a request to the controller.
    pub fn dispatch(&self, method: &Method, url: &str, body: Option<&str>) -> Result<Reply> {
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(Reply::html(self.page())),

            (&Method::Get, "/api/slots") => {
                let body = serde_json::to_string(&self.surface.snapshot())
                    .context("failed to serialize slots")?;
                Ok(Reply::json(200, body))
            }

            (&Method::Post, "/classify") => {
                let form = FormSubmission::from_urlencoded(body.unwrap_or(""));
                self.dashboard.submit_prediction(&form);
                Ok(Reply::redirect("/#classification-result"))
            }

            (&Method::Post, "/history/refresh") => {
                self.dashboard.load_history(self.dashboard.options().history_limit);
                Ok(Reply::redirect("/#classification-history-content"))
            }

            (&Method::Post, "/model-info/reload") => {
                self.dashboard.load_model_info();
                self.dashboard.build_prediction_form();
                Ok(Reply::redirect("/"))
            }

            (&Method::Post, "/model-comparison/reload") => {
                self.dashboard.load_model_comparison();
                Ok(Reply::redirect("/#model-comparison-content"))
            }

            (&Method::Get, "/eda/show") => {
                let name = query_param(url, "name").context("missing ?name= parameter")?;
                if name.is_empty() {
                    anyhow::bail!("empty chart name");
                }
                self.dashboard.show_image(&name);
                Ok(Reply::redirect("/#eda"))
            }

            _ => Ok(Reply::json(404, r#"{"error": "not found"}"#.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A response before it is handed to `tiny_http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub location: Option<String>,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            location: None,
            body,
        }
    }

    fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            location: None,
            body,
        }
    }

    /// `303 See Other`, so a reload after a form post doesn't resubmit.
    fn redirect(location: &str) -> Self {
        Self {
            status: 303,
            content_type: "text/plain; charset=utf-8",
            location: Some(location.to_string()),
            body: String::new(),
        }
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let mut resp = Response::from_data(self.body.into_bytes())
            .with_status_code(StatusCode(self.status));
        if let Ok(header) = Header::from_bytes("Content-Type", self.content_type) {
            resp = resp.with_header(header);
        }
        if let Some(location) = self.location
            && let Ok(header) = Header::from_bytes("Location", location.as_bytes())
        {
            resp = resp.with_header(header);
        }
        resp
    }
}

/// Value of query parameter `key`, percent-decoded.
fn query_param(url: &str, key: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    FormSubmission::from_urlencoded(query)
        .fields()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
