use url::Url;

/// Credentials for one Notion document source.
///
/// The application talks to three logically separate sources (content,
/// site settings, subscribers), each with its own integration token and
/// database id.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub api_key: String,
    pub database_id: String,
}

/// Environment-backed configuration for the content layer.
///
/// A missing source is a degradation, never an error: the affected
/// operations return empty or default results and log a warning.
#[derive(Debug, Clone, Default)]
pub struct ContentConfig {
    /// Posts and pages database (`NOTION_API_KEY` / `NOTION_DATABASE_ID`).
    pub content: Option<SourceConfig>,
    /// Site settings database (`NOTION_SITE_SETTINGS_API_KEY` /
    /// `NOTION_SITE_SETTINGS_DATABASE_ID`).
    pub settings: Option<SourceConfig>,
    /// Subscribers database (`NOTION_SUBSCRIBERS_API_KEY` /
    /// `NOTION_SUBSCRIBERS_DATABASE_ID`).
    pub subscribers: Option<SourceConfig>,
    /// Public site URL, used for canonical links (`NEXT_PUBLIC_SITE_URL`).
    pub site_url: Option<Url>,
}

impl ContentConfig {
    pub fn from_env() -> Self {
        let site_url = std::env::var("NEXT_PUBLIC_SITE_URL")
            .ok()
            .and_then(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring invalid NEXT_PUBLIC_SITE_URL ({raw}): {e}");
                    None
                }
            });

        Self {
            content: source_from_pair(
                std::env::var("NOTION_API_KEY").ok(),
                std::env::var("NOTION_DATABASE_ID").ok(),
            ),
            settings: source_from_pair(
                std::env::var("NOTION_SITE_SETTINGS_API_KEY").ok(),
                std::env::var("NOTION_SITE_SETTINGS_DATABASE_ID").ok(),
            ),
            subscribers: source_from_pair(
                std::env::var("NOTION_SUBSCRIBERS_API_KEY").ok(),
                std::env::var("NOTION_SUBSCRIBERS_DATABASE_ID").ok(),
            ),
            site_url,
        }
    }
}

/// A source is configured only when both the token and the database id are
/// present; a half-configured pair is treated as absent.
fn source_from_pair(api_key: Option<String>, database_id: Option<String>) -> Option<SourceConfig> {
    match (api_key, database_id) {
        (Some(api_key), Some(database_id)) if !api_key.is_empty() && !database_id.is_empty() => {
            Some(SourceConfig {
                api_key,
                database_id,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_requires_both_values() {
        assert!(source_from_pair(Some("secret".into()), Some("db".into())).is_some());
        assert!(source_from_pair(Some("secret".into()), None).is_none());
        assert!(source_from_pair(None, Some("db".into())).is_none());
        assert!(source_from_pair(None, None).is_none());
    }

    #[test]
    fn test_empty_values_treated_as_absent() {
        assert!(source_from_pair(Some("".into()), Some("db".into())).is_none());
        assert!(source_from_pair(Some("secret".into()), Some("".into())).is_none());
    }
}
