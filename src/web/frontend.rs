//! Page shell for the mldash web dashboard.
//!
//! The page is rendered on the server: every slot's current HTML fragment
//! is dropped into its container, and the forms post back to the server,
//! which runs the controller and redirects to `/`. No external assets, no
//! build tools, no CDN dependencies.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::render::html::escape;
use crate::render::view::format_title;

/// Stylesheet shared by all pages.
const STYLE: &str = r#"
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }

.app { max-width: 1200px; margin: 0 auto; padding: 24px; }

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header .subtitle { color: var(--text-muted); font-size: 13px; }

.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }
.card-head { display: flex; justify-content: space-between; align-items: center; }

.row { display: flex; gap: 16px; flex-wrap: wrap; }
.col { flex: 1; min-width: 280px; }
pre { background: var(--bg); padding: 8px; border-radius: 6px; font-family: var(--mono); font-size: 12px; overflow-x: auto; }
h5 { font-size: 15px; margin-bottom: 8px; }
h6 { font-size: 13px; margin: 8px 0 4px; }
.accent { color: var(--accent); }
.muted { color: var(--text-muted); }
.center { text-align: center; margin: 12px 0; }

#feature-inputs { display: grid; grid-template-columns: repeat(auto-fill, minmax(220px, 1fr)); gap: 12px; margin-bottom: 16px; }
.field label { display: block; font-size: 12px; color: var(--text-muted); margin-bottom: 4px; }
.field input {
  width: 100%;
  padding: 6px 10px;
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: 6px;
  color: var(--text);
  font-family: var(--mono);
}

button {
  padding: 8px 16px;
  border: 1px solid var(--border);
  border-radius: 6px;
  background: var(--accent);
  color: #fff;
  font-weight: 500;
  cursor: pointer;
}
button.secondary { background: transparent; color: var(--text-muted); }
.eda-buttons { display: flex; gap: 8px; flex-wrap: wrap; margin-bottom: 12px; }
.eda-buttons a {
  padding: 4px 10px;
  border: 1px solid var(--border);
  border-radius: 12px;
  color: var(--accent);
  text-decoration: none;
  font-size: 12px;
}
img.eda { max-width: 100%; border-radius: var(--radius); }

.alert { padding: 12px 16px; border-radius: var(--radius); border: 1px solid; margin: 8px 0; }
.alert.success { border-color: var(--green); }
.alert.success h5 { color: var(--green); }
.alert.danger { border-color: var(--red); color: var(--red); }
.alert ul { margin-left: 20px; }

table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; font-size: 12px; text-transform: uppercase; letter-spacing: 0.5px; }
tr.best td { color: var(--green); }

.spinner {
  display: inline-block;
  width: 28px;
  height: 28px;
  border: 3px solid var(--border);
  border-top-color: var(--accent);
  border-radius: 50%;
  animation: spin 0.8s linear infinite;
}
.spinner.secondary { border-top-color: var(--text-muted); }
.visually-hidden { position: absolute; width: 1px; height: 1px; overflow: hidden; clip: rect(0 0 0 0); }
@keyframes spin { to { transform: rotate(360deg); } }
"#;

/// Render the full dashboard page.
///
/// `slots` maps element ids to their current HTML; `charts` are the EDA
/// chart names offered as buttons.
pub fn render_page(slots: &BTreeMap<&'static str, String>, charts: &[String]) -> String {
    let slot = |id: &str| slots.get(id).map(String::as_str).unwrap_or_default();

    let mut html = String::with_capacity(16 * 1024);
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>ML Classification Dashboard</title>
<style>{STYLE}</style>
</head>
<body>
<div class="app">
  <header>
    <div>
      <h1>ML Classification Dashboard</h1>
      <div class="subtitle">Model details, live classification and history</div>
    </div>
    <form method="post" action="/model-info/reload"><button class="secondary" type="submit">Reload model</button></form>
  </header>
"#
    );

    let _ = write!(
        html,
        r#"
  <div class="card">
    <h2>Model Details</h2>
    <div id="model-details">{}</div>
  </div>

  <div class="card">
    <h2>Classify</h2>
    <form method="post" action="/classify" id="classificationForm">
      <div id="feature-inputs">{}</div>
      <button type="submit">Classify</button>
    </form>
    <div id="classification-result">{}</div>
  </div>
"#,
        slot("model-details"),
        slot("feature-inputs"),
        slot("classification-result"),
    );

    let _ = write!(
        html,
        r#"
  <div class="card">
    <div class="card-head">
      <h2>Classification History</h2>
      <form method="post" action="/history/refresh"><button class="secondary" type="submit">Refresh</button></form>
    </div>
    <div id="classification-history-content">{}</div>
  </div>

  <div class="card">
    <div class="card-head">
      <h2>Model Comparison</h2>
      <form method="post" action="/model-comparison/reload"><button class="secondary" type="submit">Reload</button></form>
    </div>
    <div id="model-comparison-content">{}</div>
  </div>
"#,
        slot("classification-history-content"),
        slot("model-comparison-content"),
    );

    let buttons: String = charts
        .iter()
        .map(|name| {
            format!(
                r#"<a href="/eda/show?name={}">{}</a>"#,
                escape(&encode_component(name)),
                escape(&format_title(name))
            )
        })
        .collect();

    let _ = write!(
        html,
        r#"
  <div class="card" id="eda">
    <h2>Exploratory Data Analysis</h2>
    <div class="eda-buttons">{buttons}</div>
    <div id="eda-content">{}</div>
  </div>
</div>
</body>
</html>
"#,
        slot("eda-content"),
    );

    html
}

/// Percent-encode a query parameter value.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}
