//! Self-contained HTML page for a built tree.
//!
//! The page embeds the tree JSON and the renderer settings and loads d3 v7
//! from `render.d3_src`. Its script follows the same rules as
//! [`crate::domain::Renderer`]: collapse threshold, spacing, duration,
//! hover text and the open-resource rule for leaves.

use serde_json::json;

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::RenderSettings;
use crate::domain::Node;

const TEMPLATE: &str = include_str!("../../assets/tree.html");

pub fn render_document(tree: &Node, render: &RenderSettings) -> ApplicationResult<String> {
    let tree_json = serde_json::to_string_pretty(tree).map_err(json_err)?;
    let config = json!({
        "width": render.width,
        "siblingSpacing": render.sibling_spacing,
        "levelSpacing": render.level_spacing,
        "durationMs": render.duration_ms,
        "collapseDepth": render.collapse_depth,
        "resetZoomOnToggle": render.reset_zoom_on_toggle,
        "minZoom": render.min_zoom,
        "maxZoom": render.max_zoom,
        "tooltipOffset": render.tooltip_offset,
    });
    let config_json = serde_json::to_string(&config).map_err(json_err)?;

    let title = html_escape(&render.title);
    let d3_src = html_escape(&render.d3_src);
    let tree_json = script_escape(&tree_json);
    let config_json = script_escape(&config_json);

    fill(TEMPLATE, |key| match key {
        "TITLE" => Some(title.as_str()),
        "D3_SRC" => Some(d3_src.as_str()),
        "TREE_JSON" => Some(tree_json.as_str()),
        "CONFIG_JSON" => Some(config_json.as_str()),
        _ => None,
    })
}

/// Single pass over `{{KEY}}` placeholders so substituted text is never
/// scanned again.
fn fill<'v>(
    template: &str,
    lookup: impl Fn(&str) -> Option<&'v str>,
) -> ApplicationResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            ApplicationError::config("unterminated placeholder in page template")
        })?;
        let key = &after[..end];
        let value = lookup(key).ok_or_else(|| {
            ApplicationError::config(format!("unknown placeholder in page template: {key}"))
        })?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON placed inside a `<script>` element. `<`, `>` and `&` only occur in
/// JSON strings, where the unicode escapes are equivalent.
fn script_escape(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn json_err(e: serde_json::Error) -> ApplicationError {
    ApplicationError::OperationFailed {
        context: "serialize page data".to_string(),
        source: Box::new(e),
    }
}
