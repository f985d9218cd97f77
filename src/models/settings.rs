use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Site-wide settings stored as Key/Value rows in a dedicated database.
///
/// Every known key has a documented default, so the settings lookup can
/// always return a usable value even when the remote source is missing or
/// unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub brand_name: String,
    pub homepage_title: String,
    pub homepage_description: String,
    pub twitter_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    /// Remote keys the adapter does not interpret, retained verbatim.
    #[serde(default)]
    pub extra: HashMap<String, String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            brand_name: "Muse".to_string(),
            homepage_title: "Welcome to Muse".to_string(),
            homepage_description: "Thoughts on design, creativity, and technology.".to_string(),
            twitter_url: None,
            github_url: None,
            linkedin_url: None,
            extra: HashMap::new(),
        }
    }
}

impl SiteSettings {
    /// Fold remote Key/Value rows over the defaults. Keys use the remote
    /// source's camelCase names; empty values are ignored.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut settings = Self::default();
        for (key, value) in rows {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "brandName" => settings.brand_name = value,
                "homepageTitle" => settings.homepage_title = value,
                "homepageDescription" => settings.homepage_description = value,
                "twitterUrl" => settings.twitter_url = Some(value),
                "githubUrl" => settings.github_url = Some(value),
                "linkedinUrl" => settings.linkedin_url = Some(value),
                _ => {
                    settings.extra.insert(key, value);
                }
            }
        }
        settings
    }
}
