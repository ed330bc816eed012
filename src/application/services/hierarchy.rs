//! Hierarchy service
//!
//! Loads rows, runs the builder, gathers diagnostics and writes the JSON and
//! HTML artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::document::render_document;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    contains_placeholder, find_dangling_references, find_name_collisions, summarize_levels,
    BuildWarning, DanglingReferences, HierarchyBuilder, LevelSummary, NameCollision, Node, Row,
};
use crate::infrastructure::traits::{FileSystem, RowSource};

/// Outcome of a successful build with its advisory findings.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub tree: Node,
    /// 1-based numbers of rows dropped for lack of a parent
    pub skipped_rows: Vec<usize>,
    pub dangling: DanglingReferences,
    pub placeholder_leak: bool,
    pub collisions: Vec<NameCollision>,
    /// Number of input rows
    pub rows: usize,
}

impl BuildReport {
    pub fn warnings(&self) -> Vec<BuildWarning> {
        let mut warnings: Vec<BuildWarning> = self
            .skipped_rows
            .iter()
            .map(|&row| BuildWarning::SkippedRow { row })
            .collect();
        warnings.extend(self.dangling.warnings());
        if self.placeholder_leak {
            warnings.push(BuildWarning::PlaceholderName);
        }
        warnings.extend(self.collisions.iter().map(BuildWarning::from));
        warnings
    }

    pub fn is_clean(&self) -> bool {
        self.skipped_rows.is_empty()
            && self.dangling.is_empty()
            && !self.placeholder_leak
            && self.collisions.is_empty()
    }
}

/// Paths of the artifacts a build wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub json: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

pub struct HierarchyService {
    fs: Arc<dyn FileSystem>,
    rows: Arc<dyn RowSource>,
    settings: Arc<Settings>,
    builder: HierarchyBuilder,
}

impl HierarchyService {
    pub fn new(fs: Arc<dyn FileSystem>, rows: Arc<dyn RowSource>, settings: Arc<Settings>) -> Self {
        let builder = HierarchyBuilder::new(settings.to_builder_options());
        Self {
            fs,
            rows,
            settings,
            builder,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn load_rows(&self, input: &Path) -> ApplicationResult<Vec<Row>> {
        if !self.fs.exists(input) {
            return Err(ApplicationError::OperationFailed {
                context: format!("input not found: {}", input.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        let rows = self.rows.read_rows(input).with_path_context("read rows", input)?;
        debug!("load_rows: {} rows from {}", rows.len(), input.display());
        Ok(rows)
    }

    /// Build the tree from in-memory rows and collect diagnostics. Each
    /// warning is also logged.
    pub fn analyze(&self, rows: &[Row]) -> ApplicationResult<BuildReport> {
        let built = self.builder.build(rows)?;
        let dangling = find_dangling_references(rows, self.builder.normalizer());
        let placeholder_leak = contains_placeholder(&built.root);
        let collisions = find_name_collisions(&built.root);

        let report = BuildReport {
            tree: built.root,
            skipped_rows: built.skipped_rows,
            dangling,
            placeholder_leak,
            collisions,
            rows: rows.len(),
        };
        for warning in report.warnings() {
            warn!("{warning}");
        }
        Ok(report)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn build(&self, input: &Path) -> ApplicationResult<BuildReport> {
        let rows = self.load_rows(input)?;
        self.analyze(&rows)
    }

    pub fn summarize(&self, rows: &[Row]) -> LevelSummary {
        summarize_levels(rows, self.builder.normalizer())
    }

    pub fn to_json(&self, tree: &Node) -> ApplicationResult<String> {
        serde_json::to_string_pretty(tree).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize tree".to_string(),
            source: Box::new(e),
        })
    }

    pub fn to_html(&self, tree: &Node) -> ApplicationResult<String> {
        render_document(tree, &self.settings.render)
    }

    pub fn write_json(&self, tree: &Node, path: &Path) -> ApplicationResult<()> {
        let json = self.to_json(tree)?;
        self.fs
            .write_atomic(path, &json)
            .with_path_context("write tree json", path)?;
        info!("wrote {}", path.display());
        Ok(())
    }

    pub fn write_html(&self, tree: &Node, path: &Path) -> ApplicationResult<()> {
        let html = self.to_html(tree)?;
        self.fs
            .write_atomic(path, &html)
            .with_path_context("write tree html", path)?;
        info!("wrote {}", path.display());
        Ok(())
    }

    /// `<stem>_tree.<ext>` in `output_dir`, or next to the input.
    pub fn default_output_path(&self, input: &Path, extension: &str) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tree".to_string());
        let file = format!("{stem}_tree.{extension}");
        match &self.settings.output_dir {
            Some(dir) => dir.join(file),
            None => input.with_file_name(file),
        }
    }

    pub fn write_artifacts(
        &self,
        tree: &Node,
        json: Option<&Path>,
        html: Option<&Path>,
    ) -> ApplicationResult<Artifacts> {
        if let Some(path) = json {
            self.write_json(tree, path)?;
        }
        if let Some(path) = html {
            self.write_html(tree, path)?;
        }
        Ok(Artifacts {
            json: json.map(Path::to_path_buf),
            html: html.map(Path::to_path_buf),
        })
    }
}
