use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::nodes::is_internal_url;

const DEFAULT_MAX_UNDO: usize = 200;
const DEFAULT_MAX_NORMALIZE_ITERATIONS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalLink {
    pub title: String,
    pub slug: String,
}

impl InternalLink {
    /// Site-relative url for the entry, always with one leading `/`.
    pub fn url(&self) -> String {
        format!("/{}", self.slug.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizeConfig {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Default for FontSizeConfig {
    fn default() -> Self {
        Self {
            min: 8,
            max: 72,
            default: 15,
        }
    }
}

/// Host-provided settings. Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Enabled toolbar items. `None` enables everything.
    pub toolbar: Option<Vec<String>>,
    pub internal_links: Vec<InternalLink>,
    pub site_base_url: Option<String>,
    pub colors: Vec<String>,
    pub font_families: Vec<String>,
    pub font_size: FontSizeConfig,
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            toolbar: None,
            internal_links: Vec::new(),
            site_base_url: None,
            colors: [
                "#000000", "#434343", "#666666", "#999999", "#cccccc", "#ffffff", "#e03131",
                "#f08c00", "#fcc419", "#2f9e44", "#1971c2", "#6741d9",
            ]
            .map(String::from)
            .to_vec(),
            font_families: [
                "Arial",
                "Courier New",
                "Georgia",
                "Times New Roman",
                "Trebuchet MS",
                "Verdana",
            ]
            .map(String::from)
            .to_vec(),
            font_size: FontSizeConfig::default(),
            max_undo: DEFAULT_MAX_UNDO,
            max_normalize_iterations: DEFAULT_MAX_NORMALIZE_ITERATIONS,
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        Ok(config.with_defaults())
    }

    pub(crate) fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = DEFAULT_MAX_UNDO;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = DEFAULT_MAX_NORMALIZE_ITERATIONS;
        }
        let FontSizeConfig { min, max, default } = self.font_size;
        if min == 0 || min > max {
            self.font_size = FontSizeConfig::default();
        } else {
            self.font_size.default = default.clamp(min, max);
        }
        self
    }

    pub fn is_toolbar_item_enabled(&self, item: &str) -> bool {
        match &self.toolbar {
            None => true,
            Some(items) => items.iter().any(|enabled| enabled == item),
        }
    }

    pub fn internal_link(&self, slug: &str) -> Option<&InternalLink> {
        let slug = slug.trim_start_matches('/');
        self.internal_links
            .iter()
            .find(|link| link.slug.trim_start_matches('/') == slug)
    }

    /// Absolute url for previewing a link. Internal links are joined with the site base url.
    pub fn resolve_link_url(&self, url: &str) -> String {
        match &self.site_base_url {
            Some(base) if is_internal_url(url) => {
                format!("{}{}", base.trim_end_matches('/'), url)
            }
            _ => url.to_string(),
        }
    }

    pub fn clamp_font_size(&self, size: i64) -> u32 {
        let FontSizeConfig { min, max, .. } = self.font_size;
        size.clamp(i64::from(min), i64::from(max)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EditorConfig::from_json(r#"{"toolbar": ["bold", "nope"], "maxUndo": 0}"#)
            .unwrap();
        assert_eq!(config.max_undo, 200);
        assert_eq!(config.font_size, FontSizeConfig::default());
        assert!(config.is_toolbar_item_enabled("bold"));
        assert!(!config.is_toolbar_item_enabled("italic"));
    }

    #[test]
    fn internal_urls_resolve_against_base() {
        let config = EditorConfig {
            site_base_url: Some("https://example.com/".to_string()),
            ..EditorConfig::default()
        };
        assert_eq!(config.resolve_link_url("/about"), "https://example.com/about");
        assert_eq!(config.resolve_link_url("https://a.io"), "https://a.io");
    }
}
