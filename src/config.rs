//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/csvtree/csvtree.toml`
//! 3. Local config: `--config <file>` or `./.csvtree.toml`
//! 4. Environment variables: `CSVTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::render::{RenderConfig, Spacing};
use crate::domain::{BuilderOptions, NameCase, SentinelSet, DEFAULT_ROOT_NAME, DEFAULT_SENTINELS};

pub const ENV_PREFIX: &str = "CSVTREE";
pub const DEFAULT_D3_SRC: &str = "https://d3js.org/d3.v7.min.js";
pub const DEFAULT_TITLE: &str = "Resource Tree";

/// Settings of the HTML document and the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    /// Page title
    pub title: String,
    /// Where the page loads d3 v7 from
    pub d3_src: String,
    pub width: f64,
    /// Breadth distance between neighbouring leaves
    pub sibling_spacing: f64,
    /// Depth distance between levels
    pub level_spacing: f64,
    pub duration_ms: u64,
    pub collapse_depth: usize,
    pub reset_zoom_on_toggle: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub tooltip_offset: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        let render = RenderConfig::default();
        Self {
            title: DEFAULT_TITLE.to_string(),
            d3_src: DEFAULT_D3_SRC.to_string(),
            width: render.width,
            sibling_spacing: render.spacing.sibling,
            level_spacing: render.spacing.level,
            duration_ms: u64::try_from(render.duration.as_millis()).unwrap_or(250),
            collapse_depth: render.collapse_depth,
            reset_zoom_on_toggle: render.reset_zoom_on_toggle,
            min_zoom: render.min_zoom,
            max_zoom: render.max_zoom,
            tooltip_offset: render.tooltip_offset,
        }
    }
}

/// Raw render settings for intermediate parsing (every field optional).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawRenderSettings {
    pub title: Option<String>,
    pub d3_src: Option<String>,
    pub width: Option<f64>,
    pub sibling_spacing: Option<f64>,
    pub level_spacing: Option<f64>,
    pub duration_ms: Option<u64>,
    pub collapse_depth: Option<usize>,
    pub reset_zoom_on_toggle: Option<bool>,
    pub min_zoom: Option<f64>,
    pub max_zoom: Option<f64>,
    pub tooltip_offset: Option<f64>,
}

impl RenderSettings {
    /// Overlay wins field by field; there are no arrays here, so global and
    /// local layers merge the same way.
    pub fn merge(&self, overlay: &RawRenderSettings) -> Self {
        Self {
            title: overlay.title.clone().unwrap_or_else(|| self.title.clone()),
            d3_src: overlay.d3_src.clone().unwrap_or_else(|| self.d3_src.clone()),
            width: overlay.width.unwrap_or(self.width),
            sibling_spacing: overlay.sibling_spacing.unwrap_or(self.sibling_spacing),
            level_spacing: overlay.level_spacing.unwrap_or(self.level_spacing),
            duration_ms: overlay.duration_ms.unwrap_or(self.duration_ms),
            collapse_depth: overlay.collapse_depth.unwrap_or(self.collapse_depth),
            reset_zoom_on_toggle: overlay
                .reset_zoom_on_toggle
                .unwrap_or(self.reset_zoom_on_toggle),
            min_zoom: overlay.min_zoom.unwrap_or(self.min_zoom),
            max_zoom: overlay.max_zoom.unwrap_or(self.max_zoom),
            tooltip_offset: overlay.tooltip_offset.unwrap_or(self.tooltip_offset),
        }
    }

    pub fn to_render_config(&self) -> RenderConfig {
        RenderConfig {
            width: self.width,
            spacing: Spacing {
                sibling: self.sibling_spacing,
                level: self.level_spacing,
            },
            duration: Duration::from_millis(self.duration_ms),
            collapse_depth: self.collapse_depth,
            reset_zoom_on_toggle: self.reset_zoom_on_toggle,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            tooltip_offset: self.tooltip_offset,
        }
    }
}

/// Raw settings for intermediate parsing.
///
/// `None` means "not specified, inherit"; `Some(vec![])` is an explicit
/// empty list.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub root_name: Option<String>,
    pub name_case: Option<NameCase>,
    pub skip_redundant_subchild: Option<bool>,
    pub sentinels: Option<Vec<String>>,
    pub output_dir: Option<PathBuf>,
    pub render: RawRenderSettings,
}

/// Unified configuration for csvtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Name of the synthetic root node
    pub root_name: String,
    pub name_case: NameCase,
    pub skip_redundant_subchild: bool,
    /// Values treated as "no value" in hierarchy, tooltip and url cells
    pub sentinels: Vec<String>,
    /// Where artifacts go by default (next to the input when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    pub render: RenderSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            name_case: NameCase::default(),
            skip_redundant_subchild: true,
            sentinels: DEFAULT_SENTINELS.iter().map(|s| s.to_string()).collect(),
            output_dir: None,
            render: RenderSettings::default(),
        }
    }
}

/// Get the XDG config directory for csvtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "csvtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("csvtree.toml"))
}

/// Local config picked up from the working directory when no `--config` is given.
pub fn local_config_path() -> PathBuf {
    PathBuf::from(".csvtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ApplicationError::config(format!("read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| ApplicationError::config(format!("parse {}: {}", path.display(), e)))
}

impl Settings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// Items prefixed with `!` remove the corresponding item. The result is
    /// de-duplicated and sorted.
    ///
    /// ```ignore
    /// merge_array(&["a", "b"], &["c"])       // -> ["a", "b", "c"]
    /// merge_array(&["a", "b"], &["!a", "c"]) // -> ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Apply global config onto defaults. Arrays given by the global file
    /// REPLACE the defaults.
    pub fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            sentinels: global
                .sentinels
                .clone()
                .unwrap_or_else(|| self.sentinels.clone()),
            ..self.overlay_scalars(global)
        }
    }

    /// Merge a local config onto self. Arrays UNION with `!item` negation.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            sentinels: overlay
                .sentinels
                .as_ref()
                .map(|o| Self::merge_array(&self.sentinels, o))
                .unwrap_or_else(|| self.sentinels.clone()),
            ..self.overlay_scalars(overlay)
        }
    }

    fn overlay_scalars(&self, overlay: &RawSettings) -> Self {
        Self {
            root_name: overlay
                .root_name
                .clone()
                .unwrap_or_else(|| self.root_name.clone()),
            name_case: overlay.name_case.unwrap_or(self.name_case),
            skip_redundant_subchild: overlay
                .skip_redundant_subchild
                .unwrap_or(self.skip_redundant_subchild),
            sentinels: self.sentinels.clone(),
            output_dir: overlay
                .output_dir
                .clone()
                .or_else(|| self.output_dir.clone()),
            render: self.render.merge(&overlay.render),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// `local` is an explicit config file and must exist. Without it
    /// `./.csvtree.toml` is used when present.
    ///
    /// # Array Merge Semantics
    /// - Defaults -> Global: REPLACE
    /// - Global -> Local: UNION with negation support
    /// - Any -> Env vars: REPLACE
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.apply_global(&load_raw_settings(&global_path)?);
            }
        }

        let local_path = match local {
            Some(path) if !path.exists() => {
                return Err(ApplicationError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Some(path.to_path_buf()),
            None => Some(local_config_path()).filter(|p| p.exists()),
        };
        if let Some(path) = local_path {
            debug!("local config: {}", path.display());
            current = current.merge_with(&load_raw_settings(&path)?);
        }

        current = current.apply_env_overrides(env_source())?;
        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply `CSVTREE_*` variables as explicit overrides.
    ///
    /// Nested keys use `__`: `CSVTREE_RENDER__DURATION_MS=400`. The sentinel
    /// list is comma separated.
    pub fn apply_env_overrides(mut self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Some(v) = env_value(&config, "root_name")? {
            self.root_name = v;
        }
        if let Some(v) = env_value(&config, "name_case")? {
            self.name_case = v;
        }
        if let Some(v) = env_value(&config, "skip_redundant_subchild")? {
            self.skip_redundant_subchild = v;
        }
        if let Some(v) = env_value(&config, "sentinels")? {
            self.sentinels = v;
        }
        if let Some(v) = env_value::<String>(&config, "output_dir")? {
            self.output_dir = Some(PathBuf::from(v));
        }

        let r = &mut self.render;
        if let Some(v) = env_value(&config, "render.title")? {
            r.title = v;
        }
        if let Some(v) = env_value(&config, "render.d3_src")? {
            r.d3_src = v;
        }
        if let Some(v) = env_value(&config, "render.width")? {
            r.width = v;
        }
        if let Some(v) = env_value(&config, "render.sibling_spacing")? {
            r.sibling_spacing = v;
        }
        if let Some(v) = env_value(&config, "render.level_spacing")? {
            r.level_spacing = v;
        }
        if let Some(v) = env_value(&config, "render.duration_ms")? {
            r.duration_ms = v;
        }
        if let Some(v) = env_value(&config, "render.collapse_depth")? {
            r.collapse_depth = v;
        }
        if let Some(v) = env_value(&config, "render.reset_zoom_on_toggle")? {
            r.reset_zoom_on_toggle = v;
        }
        if let Some(v) = env_value(&config, "render.min_zoom")? {
            r.min_zoom = v;
        }
        if let Some(v) = env_value(&config, "render.max_zoom")? {
            r.max_zoom = v;
        }
        if let Some(v) = env_value(&config, "render.tooltip_offset")? {
            r.tooltip_offset = v;
        }

        Ok(self)
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields. Unknown variables
    /// leave the path untouched.
    pub fn expand_paths(&mut self) {
        if let Some(dir) = &self.output_dir {
            let raw = dir.to_string_lossy();
            if let Ok(expanded) = shellexpand::full(raw.as_ref()) {
                self.output_dir = Some(PathBuf::from(expanded.as_ref()));
            }
        }
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        let r = &self.render;
        if self.root_name.trim().is_empty() {
            return Err(ApplicationError::config("root_name must not be blank"));
        }
        if !(r.width > 0.0 && r.sibling_spacing > 0.0 && r.level_spacing > 0.0) {
            return Err(ApplicationError::config(
                "render.width, render.sibling_spacing and render.level_spacing must be positive",
            ));
        }
        if !(r.min_zoom > 0.0 && r.min_zoom <= r.max_zoom) {
            return Err(ApplicationError::config(format!(
                "render zoom range invalid: min_zoom={} max_zoom={}",
                r.min_zoom, r.max_zoom
            )));
        }
        Ok(())
    }

    pub fn to_builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            root_name: self.root_name.clone(),
            sentinels: SentinelSet::new(&self.sentinels),
            name_case: self.name_case,
            skip_redundant_subchild: self.skip_redundant_subchild,
        }
    }

    pub fn to_render_config(&self) -> RenderConfig {
        self.render.to_render_config()
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApplicationError::config(format!("serialize config: {e}")))
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# csvtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/csvtree/csvtree.toml  (defines your baseline)
#   Local:  --config <file> or ./.csvtree.toml
#   Env:    CSVTREE_* environment variables, e.g. CSVTREE_RENDER__WIDTH=1200
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!item" in local config to REMOVE an inherited item:
#     sentinels = ["tbd", "!none"]  # adds tbd, stops treating "none" as empty

# Name of the synthetic root node
# root_name = "Start Here"

# "preserve" keeps the first-seen casing of category names, "lower" lower-cases them
# name_case = "preserve"

# Do not create a subchild level named like the resource it would hold
# skip_redundant_subchild = true

# Cell values treated as "no value" (compared trimmed, case-insensitively)
# sentinels = ["unknown", "n/a", "", "null", "none", "nan"]

# Default directory for generated artifacts (next to the input when unset)
# output_dir = "~/trees"

[render]
# title = "Resource Tree"
# d3_src = "https://d3js.org/d3.v7.min.js"
# width = 960.0
# sibling_spacing = 30.0
# level_spacing = 240.0
# duration_ms = 250
# Nodes at this depth or deeper start collapsed
# collapse_depth = 1
# reset_zoom_on_toggle = true
# min_zoom = 0.1
# max_zoom = 8.0
# tooltip_offset = 10.0
"#
        .to_string()
    }
}

/// `CSVTREE_*` variables of the running process.
pub fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("sentinels")
}

fn env_value<T: DeserializeOwned>(config: &Config, key: &str) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(v) => Ok(Some(v)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::config(format!("{key}: {e}"))),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_defaults_when_converting_then_matches_domain_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.to_render_config(), RenderConfig::default());
        let options = settings.to_builder_options();
        assert_eq!(options.root_name, DEFAULT_ROOT_NAME);
        assert!(options.skip_redundant_subchild);
        assert_eq!(options.sentinels, SentinelSet::default());
    }

    #[test]
    fn given_tilde_in_output_dir_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            output_dir: Some(PathBuf::from("~/trees")),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let dir = settings.output_dir.expect("output_dir kept");
        assert!(dir.to_string_lossy().starts_with(&home), "{}", dir.display());
    }

    #[test]
    fn test_merge_array_union() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["c"]));
        assert_eq!(result, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_merge_array_negation() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["!a", "c"]));
        assert_eq!(result, strings(&["b", "c"]));
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["!x"]));
        assert_eq!(result, strings(&["a", "b"]));
    }

    #[test]
    fn test_merge_array_duplicates() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["a", "c"]));
        assert_eq!(result, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_apply_global_replaces_sentinels() {
        let global = RawSettings {
            sentinels: Some(strings(&["tbd"])),
            root_name: Some("Index".into()),
            ..RawSettings::default()
        };

        let result = Settings::default().apply_global(&global);

        assert_eq!(result.sentinels, strings(&["tbd"]));
        assert_eq!(result.root_name, "Index");
        assert!(result.skip_redundant_subchild);
    }

    #[test]
    fn test_merge_with_unions_sentinels() {
        let local = RawSettings {
            sentinels: Some(strings(&["tbd", "!nan"])),
            name_case: Some(NameCase::Lower),
            ..RawSettings::default()
        };

        let result = Settings::default().merge_with(&local);

        assert!(result.sentinels.contains(&"tbd".to_string()));
        assert!(!result.sentinels.contains(&"nan".to_string()));
        assert!(result.sentinels.contains(&"unknown".to_string()));
        assert_eq!(result.name_case, NameCase::Lower);
    }

    #[test]
    fn given_partial_render_table_when_merging_then_keeps_other_fields() {
        let local: RawSettings = toml::from_str("[render]\nduration_ms = 500\n").unwrap();

        let result = Settings::default().merge_with(&local);

        assert_eq!(result.render.duration_ms, 500);
        assert_eq!(result.render.width, 960.0);
        assert_eq!(
            result.to_render_config().duration,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn given_env_vars_when_applying_overrides_then_replace_values() {
        let result = Settings::default()
            .apply_env_overrides(env(&[
                ("CSVTREE_ROOT_NAME", "Catalog"),
                ("CSVTREE_NAME_CASE", "lower"),
                ("CSVTREE_SENTINELS", "tbd,none"),
                ("CSVTREE_RENDER__DURATION_MS", "400"),
                ("CSVTREE_RENDER__RESET_ZOOM_ON_TOGGLE", "false"),
            ]))
            .unwrap();

        assert_eq!(result.root_name, "Catalog");
        assert_eq!(result.name_case, NameCase::Lower);
        assert_eq!(result.sentinels, strings(&["tbd", "none"]));
        assert_eq!(result.render.duration_ms, 400);
        assert!(!result.render.reset_zoom_on_toggle);
    }

    #[test]
    fn given_bad_env_value_when_applying_overrides_then_config_error() {
        let result = Settings::default()
            .apply_env_overrides(env(&[("CSVTREE_RENDER__WIDTH", "wide")]));

        assert!(matches!(result, Err(ApplicationError::Config { .. })));
    }

    #[test]
    fn given_inverted_zoom_range_when_validating_then_rejects() {
        let mut settings = Settings::default();
        settings.render.min_zoom = 4.0;
        settings.render.max_zoom = 2.0;

        assert!(settings.validate().is_err());
    }

    #[test]
    fn given_settings_when_serializing_then_toml_parses_back() {
        let toml = Settings::default().to_toml().unwrap();

        let raw: RawSettings = toml::from_str(&toml).unwrap();

        assert_eq!(raw.root_name.as_deref(), Some(DEFAULT_ROOT_NAME));
        assert_eq!(raw.render.collapse_depth, Some(1));
    }

    #[test]
    fn given_template_when_parsing_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.root_name.is_none());
    }
}
