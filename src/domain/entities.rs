//! Domain entities: core data structures

use std::fmt;

use serde::{Deserialize, Serialize};

/// One flat input record.
///
/// Every field is optional at this boundary; the builder decides what a
/// missing value means (skip the row, fail the build, or drop a level).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Row {
    pub parent: Option<String>,
    pub child: Option<String>,
    pub subchild: Option<String>,
    pub resource_name: Option<String>,
    pub tooltip: Option<String>,
    pub url: Option<String>,
}

impl Row {
    /// Convenience constructor used by tests and callers assembling rows by hand.
    pub fn new(parent: &str, resource_name: &str) -> Self {
        Self {
            parent: Some(parent.to_string()),
            resource_name: Some(resource_name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: &str) -> Self {
        self.child = Some(child.to_string());
        self
    }

    pub fn with_subchild(mut self, subchild: &str) -> Self {
        self.subchild = Some(subchild.to_string());
        self
    }

    pub fn with_tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = Some(tooltip.to_string());
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }
}

/// Label for a resource link: the network location of the URL, or a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceUrl {
    /// `host` or `host:port`
    Domain(String),
    Unavailable,
}

impl ResourceUrl {
    pub const UNAVAILABLE: &'static str = "Unavailable";

    pub fn domain(&self) -> Option<&str> {
        match self {
            ResourceUrl::Domain(d) => Some(d),
            ResourceUrl::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ResourceUrl::Domain(_))
    }
}

impl From<String> for ResourceUrl {
    fn from(value: String) -> Self {
        if value == Self::UNAVAILABLE || value.trim().is_empty() {
            ResourceUrl::Unavailable
        } else {
            ResourceUrl::Domain(value)
        }
    }
}

impl From<ResourceUrl> for String {
    fn from(value: ResourceUrl) -> Self {
        match value {
            ResourceUrl::Domain(d) => d,
            ResourceUrl::Unavailable => ResourceUrl::UNAVAILABLE.to_string(),
        }
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceUrl::Domain(d) => write!(f, "{d}"),
            ResourceUrl::Unavailable => write!(f, "{}", Self::UNAVAILABLE),
        }
    }
}

/// Element of the built tree: a category or a resource leaf.
///
/// Resource leaves always carry `url` and never carry children. Categories
/// carry neither `url` nor `tooltip`. Empty child lists are omitted when
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<ResourceUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tooltip: None,
            url: None,
            children: Vec::new(),
        }
    }

    pub fn resource(name: impl Into<String>, tooltip: Option<String>, url: ResourceUrl) -> Self {
        Self {
            name: name.into(),
            tooltip,
            url: Some(url),
            children: Vec::new(),
        }
    }

    pub fn is_resource(&self) -> bool {
        self.url.is_some()
    }

    /// Direct child by exact name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Walk down a sequence of child names.
    pub fn find_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, name| node.child(name.as_ref()))
    }

    /// Number of levels, counting this node.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(Node::depth)
            .max()
            .unwrap_or(0)
    }

    /// Resource leaves in depth-first order.
    pub fn resources(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_resources(&mut out);
        out
    }

    fn collect_resources<'a>(&'a self, out: &mut Vec<&'a Node>) {
        if self.is_resource() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_resources(out);
        }
    }

    /// Text shown when hovering: the tooltip, falling back to the name.
    pub fn hover_text(&self) -> &str {
        self.tooltip.as_deref().unwrap_or(&self.name)
    }
}

/// How category names are stored once their comparison key has been computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameCase {
    /// Keep the casing of the first row that introduced the name.
    #[default]
    Preserve,
    /// Store the lower-cased name.
    Lower,
}

/// Advisory findings that accompany a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildWarning {
    /// Row had no placeable parent and was dropped (1-based row number).
    SkippedRow { row: usize },
    DanglingChild { name: String },
    DanglingSubchild { name: String },
    /// A node is still named like a placeholder after normalization.
    PlaceholderName,
    /// A category and a resource share a name under the same parent.
    NameCollision { path: String, name: String },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::SkippedRow { row } => {
                write!(f, "row {row} skipped: no parent value")
            }
            BuildWarning::DanglingChild { name } => {
                write!(f, "dangling 'child' value without valid parent: {name}")
            }
            BuildWarning::DanglingSubchild { name } => {
                write!(f, "dangling 'subchild' value without valid child: {name}")
            }
            BuildWarning::PlaceholderName => {
                write!(f, "placeholder name 'unknown' still present in tree")
            }
            BuildWarning::NameCollision { path, name } => {
                write!(f, "'{path}' has both a category and a resource named '{name}'")
            }
        }
    }
}
