#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use muse_content::cache::ManualClock;
use muse_content::error::ContentError;
use muse_content::notion::client::{NotionApi, Source};
use muse_content::notion::types::{
    Filter, Page, PropertyValue, QueryRequest, QueryResponse, RecordMap, SortDirection,
    TextCondition,
};
use muse_content::repository::{ContentRepository, RepositoryTuning};

/// In-memory stand-in for the Notion API.
///
/// Unlike a canned-response mock, this interprets the filter tree, sorts and
/// cursors over seeded pages, so the adapter's query construction is
/// exercised end to end. Schema drift is simulated by rejecting any query
/// that references a configured property name, the same way the real API
/// rejects filters on renamed properties.
pub struct FakeNotion {
    pages: Mutex<Vec<Page>>,
    record_maps: Mutex<HashMap<String, RecordMap>>,
    created: Mutex<Vec<(String, serde_json::Value)>>,
    rejected_property: Mutex<Option<String>>,
    offline: Mutex<bool>,
    query_count: Mutex<usize>,
}

impl FakeNotion {
    pub fn new() -> Self {
        Self {
            pages: Mutex::new(Vec::new()),
            record_maps: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            rejected_property: Mutex::new(None),
            offline: Mutex::new(false),
            query_count: Mutex::new(0),
        }
    }

    pub fn seed(&self, page: Page) {
        self.pages.lock().unwrap().push(page);
    }

    pub fn seed_record_map(&self, page_id: &str, record_map: RecordMap) {
        self.record_maps
            .lock()
            .unwrap()
            .insert(page_id.to_string(), record_map);
    }

    /// Simulate schema drift: queries whose filter or sorts reference this
    /// property fail with a validation error.
    pub fn reject_property(&self, property: &str) {
        *self.rejected_property.lock().unwrap() = Some(property.to_string());
    }

    /// Simulate a full outage: every call fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn query_count(&self) -> usize {
        *self.query_count.lock().unwrap()
    }

    pub fn created_pages(&self) -> Vec<(String, serde_json::Value)> {
        self.created.lock().unwrap().clone()
    }

    fn rejects(&self, request: &QueryRequest) -> Option<String> {
        let rejected = self.rejected_property.lock().unwrap();
        let property = rejected.as_deref()?;
        let in_filter = request
            .filter
            .as_ref()
            .is_some_and(|f| f.referenced_properties().contains(&property));
        let in_sorts = request.sorts.iter().any(|s| s.property == property);
        (in_filter || in_sorts).then(|| property.to_string())
    }
}

#[async_trait]
impl NotionApi for FakeNotion {
    async fn query_database(
        &self,
        _database_id: &str,
        request: QueryRequest,
    ) -> Result<QueryResponse, ContentError> {
        *self.query_count.lock().unwrap() += 1;

        if *self.offline.lock().unwrap() {
            return Err(ContentError::Network("fake backend offline".to_string()));
        }
        if let Some(property) = self.rejects(&request) {
            return Err(ContentError::SchemaValidation(format!(
                "Could not find property with name or id: {property}"
            )));
        }

        let mut matched: Vec<Page> = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|page| {
                request
                    .filter
                    .as_ref()
                    .map_or(true, |f| page_matches(page, f))
            })
            .cloned()
            .collect();

        for sort in request.sorts.iter().rev() {
            matched.sort_by(|a, b| {
                let ord = sort_key(a, &sort.property).cmp(&sort_key(b, &sort.property));
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        let start: usize = request
            .start_cursor
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0);
        let size = request.page_size.unwrap_or(100) as usize;
        let total = matched.len();
        let results: Vec<Page> = matched.into_iter().skip(start).take(size).collect();
        let consumed = start + results.len();
        let has_more = consumed < total;

        Ok(QueryResponse {
            results,
            next_cursor: has_more.then(|| consumed.to_string()),
            has_more,
        })
    }

    async fn fetch_record_map(&self, page_id: &str) -> Result<RecordMap, ContentError> {
        if *self.offline.lock().unwrap() {
            return Err(ContentError::Network("fake backend offline".to_string()));
        }
        Ok(self
            .record_maps
            .lock()
            .unwrap()
            .get(page_id)
            .cloned()
            .unwrap_or_else(|| RecordMap(serde_json::json!({ "results": [] }))))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: serde_json::Value,
    ) -> Result<(), ContentError> {
        if *self.offline.lock().unwrap() {
            return Err(ContentError::Network("fake backend offline".to_string()));
        }
        self.created
            .lock()
            .unwrap()
            .push((database_id.to_string(), properties));
        Ok(())
    }
}

fn page_matches(page: &Page, filter: &Filter) -> bool {
    match filter {
        Filter::And { and } => and.iter().all(|f| page_matches(page, f)),
        Filter::Or { or } => or.iter().any(|f| page_matches(page, f)),
        Filter::Select { property, select } => {
            page.select_name(property) == Some(select.equals.as_str())
        }
        Filter::MultiSelect {
            property,
            multi_select,
        } => page
            .multi_select_names(property)
            .iter()
            .any(|tag| tag == &multi_select.contains),
        Filter::Checkbox { property, checkbox } => page.checkbox(property) == Some(checkbox.equals),
        Filter::Title { property, title } => text_matches(page.title_text(property), title),
        Filter::RichText {
            property,
            rich_text,
        } => text_matches(page.rich_text_text(property), rich_text),
    }
}

fn text_matches(value: Option<String>, condition: &TextCondition) -> bool {
    let Some(value) = value else {
        return false;
    };
    match condition {
        TextCondition::Equals { equals } => value == *equals,
        TextCondition::Contains { contains } => {
            value.to_lowercase().contains(&contains.to_lowercase())
        }
    }
}

fn sort_key(page: &Page, property: &str) -> String {
    page.date_start(property)
        .or_else(|| page.rich_text_text(property))
        .or_else(|| page.title_text(property))
        .unwrap_or_default()
}

/// Repository wired to fake backends with a manually advanced clock.
pub struct TestEnv {
    pub content: Arc<FakeNotion>,
    pub settings: Arc<FakeNotion>,
    pub clock: Arc<ManualClock>,
    pub repo: ContentRepository,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_tuning(RepositoryTuning::default())
    }

    pub fn with_tuning(tuning: RepositoryTuning) -> Self {
        let content = Arc::new(FakeNotion::new());
        let settings = Arc::new(FakeNotion::new());
        let clock = Arc::new(ManualClock::new());

        let repo = ContentRepository::with_clock(
            Some(Source {
                api: content.clone(),
                database_id: "content-db".to_string(),
            }),
            Some(Source {
                api: settings.clone(),
                database_id: "settings-db".to_string(),
            }),
            tuning,
            clock.clone(),
        );

        Self {
            content,
            settings,
            clock,
            repo,
        }
    }
}

pub fn make_page(id: &str, properties: Vec<(&str, PropertyValue)>) -> Page {
    let mut page: Page = serde_json::from_value(serde_json::json!({
        "id": id,
        "created_time": "2024-01-01T00:00:00Z",
        "properties": {}
    }))
    .expect("static page JSON is valid");
    page.properties = properties
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    page
}

/// A published blog post with the standard property set.
pub fn published_post(id: &str, slug: &str, title: &str, tags: &[&str], date: &str) -> Page {
    make_page(
        id,
        vec![
            ("Title", PropertyValue::title(title)),
            ("Slug", PropertyValue::rich_text(slug)),
            ("Author", PropertyValue::rich_text("Elena Reyes")),
            ("Excerpt", PropertyValue::rich_text(format!("About {title}"))),
            ("Tags", PropertyValue::multi_select(tags.iter().copied())),
            ("PublishedDate", PropertyValue::date(date)),
            ("Type", PropertyValue::select("post")),
            ("Status", PropertyValue::select("Published")),
            ("Featured", PropertyValue::checkbox(false)),
        ],
    )
}

pub fn draft_post(id: &str, slug: &str, title: &str, date: &str) -> Page {
    let mut page = published_post(id, slug, title, &[], date);
    page.properties
        .insert("Status".to_string(), PropertyValue::select("Draft"));
    page
}

pub fn featured_post(id: &str, slug: &str, title: &str, date: &str) -> Page {
    let mut page = published_post(id, slug, title, &[], date);
    page.properties
        .insert("Featured".to_string(), PropertyValue::checkbox(true));
    page
}

/// A published standalone page, optionally categorized.
pub fn site_page(id: &str, slug: &str, title: &str, category: Option<&str>) -> Page {
    let mut properties = vec![
        ("Title", PropertyValue::title(title)),
        ("Slug", PropertyValue::rich_text(slug)),
        ("Type", PropertyValue::select("page")),
        ("Status", PropertyValue::select("Published")),
        ("PublishedDate", PropertyValue::date("2024-01-10")),
    ];
    if let Some(category) = category {
        properties.push(("PageCategory", PropertyValue::select(category)));
    }
    make_page(id, properties)
}

/// A Key/Value row for the settings database.
pub fn settings_row(id: &str, key: &str, value: &str) -> Page {
    make_page(
        id,
        vec![
            ("Key", PropertyValue::title(key)),
            ("Value", PropertyValue::rich_text(value)),
        ],
    )
}
