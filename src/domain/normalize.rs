//! Sentinel handling and field normalization at the row boundary.
//!
//! Everything the builder compares goes through [`lookup_key`]; everything it
//! stores goes through [`Normalizer::display_name`].

use std::collections::HashSet;

use url::Url;

use crate::domain::entities::{NameCase, ResourceUrl, Row};

/// Placeholder values treated as "absent" unless configured otherwise.
pub const DEFAULT_SENTINELS: &[&str] = &["unknown", "n/a", "", "null", "none", "nan"];

/// Case-insensitive set of placeholder strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelSet {
    values: HashSet<String>,
}

impl Default for SentinelSet {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINELS.iter().copied())
    }
}

impl SentinelSet {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            values: values.into_iter().map(|v| lookup_key(v.as_ref())).collect(),
        }
    }

    /// Blank strings are always sentinels, whatever the configured set holds.
    pub fn matches(&self, value: &str) -> bool {
        let key = lookup_key(value);
        key.is_empty() || self.values.contains(&key)
    }
}

/// Comparison key: trimmed and lower-cased.
pub fn lookup_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Reduce a raw URL to its network location.
///
/// The label is the authority as written, so host casing and explicit
/// ports survive (`https://X.org:443/` gives `X.org:443`). User info is
/// dropped. Returns [`ResourceUrl::Unavailable`] for missing, blank, or
/// sentinel input, for strings that do not parse as absolute URLs, and for
/// URLs without a host.
pub fn sanitize_url(raw: Option<&str>, sentinels: &SentinelSet) -> ResourceUrl {
    let Some(raw) = raw else {
        return ResourceUrl::Unavailable;
    };
    if sentinels.matches(raw) {
        return ResourceUrl::Unavailable;
    }
    let raw = raw.trim();
    let Ok(parsed) = Url::parse(raw) else {
        return ResourceUrl::Unavailable;
    };
    if parsed.host_str().map_or(true, str::is_empty) {
        return ResourceUrl::Unavailable;
    }
    let Some((_, rest)) = raw.split_once("://") else {
        return ResourceUrl::Unavailable;
    };
    let end = rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..end];
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    if host_port.is_empty() {
        return ResourceUrl::Unavailable;
    }
    ResourceUrl::Domain(host_port.to_string())
}

/// Applies sentinel mapping and name casing to rows.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    sentinels: SentinelSet,
    name_case: NameCase,
}

impl Normalizer {
    pub fn new(sentinels: SentinelSet, name_case: NameCase) -> Self {
        Self {
            sentinels,
            name_case,
        }
    }

    pub fn sentinels(&self) -> &SentinelSet {
        &self.sentinels
    }

    pub fn name_case(&self) -> NameCase {
        self.name_case
    }

    /// Trim a value and map sentinels to `None`.
    pub fn clean(&self, value: Option<&str>) -> Option<String> {
        let value = value?;
        if self.sentinels.matches(value) {
            None
        } else {
            Some(value.trim().to_string())
        }
    }

    /// Stored text for a category name that is already cleaned.
    pub fn display_name(&self, value: &str) -> String {
        match self.name_case {
            NameCase::Preserve => value.to_string(),
            NameCase::Lower => value.to_lowercase(),
        }
    }

    fn hierarchy_field(&self, value: Option<&str>) -> Option<String> {
        self.clean(value).map(|v| self.display_name(&v))
    }

    /// Return a normalized copy of `rows`.
    ///
    /// Parent, child and subchild are trimmed, sentinel-mapped and cased;
    /// the tooltip is trimmed and sentinel-mapped. The resource name is only
    /// trimmed, and the URL is left raw for [`sanitize_url`].
    pub fn normalize_hierarchy_fields(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter()
            .map(|row| Row {
                parent: self.hierarchy_field(row.parent.as_deref()),
                child: self.hierarchy_field(row.child.as_deref()),
                subchild: self.hierarchy_field(row.subchild.as_deref()),
                resource_name: row.resource_name.as_ref().map(|r| r.trim().to_string()),
                tooltip: self.clean(row.tooltip.as_deref()),
                url: row.url.clone(),
            })
            .collect()
    }

    pub fn sanitize_url(&self, raw: Option<&str>) -> ResourceUrl {
        sanitize_url(raw, &self.sentinels)
    }
}
