use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{Clock, SystemClock, TtlCache};
use crate::config::ContentConfig;
use crate::error::ContentError;
use crate::models::post::{
    PageCategory, PaginatedPosts, Post, PostType, QueryFidelity, SlugLookup,
};
use crate::models::settings::SiteSettings;
use crate::notion::client::Source;
use crate::notion::types::{Filter, Page, QueryRequest, Sort};

/// Notion caps a single query response at 100 results.
const MAX_REMOTE_PAGE_SIZE: usize = 100;

/// Adapter tunables with the production defaults.
#[derive(Debug, Clone)]
pub struct RepositoryTuning {
    /// Upper bound on documents fetched per query. The remote source has no
    /// offset pagination, so the adapter fetches up to this many matches and
    /// slices in memory; pages beyond the cap are incomplete rather than
    /// failing outright.
    pub fetch_cap: usize,
    pub default_page_size: usize,
    pub related_limit: usize,
    pub featured_limit: usize,
    pub list_ttl: Duration,
    pub settings_ttl: Duration,
}

impl Default for RepositoryTuning {
    fn default() -> Self {
        Self {
            fetch_cap: 100,
            default_page_size: 6,
            related_limit: 2,
            featured_limit: 5,
            list_ttl: Duration::from_secs(60),
            settings_ttl: Duration::from_secs(3600),
        }
    }
}

/// Filter for `list_posts`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostFilter {
    pub tag: Option<String>,
    pub search: Option<String>,
    /// 1-based page number; defaults to 1.
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// Filter for `list_pages`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageFilter {
    pub category: Option<PageCategory>,
}

/// The content repository adapter.
///
/// Translates list/lookup requests into document database queries and
/// normalizes the results into the stable `Post` model. All operations
/// swallow remote failures into empty or default results: this is a
/// presentation-layer boundary where availability wins over correctness,
/// never a source of truth.
pub struct ContentRepository {
    posts: Option<Source>,
    settings: Option<Source>,
    tuning: RepositoryTuning,
    list_cache: TtlCache,
    settings_cache: TtlCache,
}

impl ContentRepository {
    pub fn new(posts: Option<Source>, settings: Option<Source>) -> Self {
        Self::with_tuning(posts, settings, RepositoryTuning::default())
    }

    pub fn with_tuning(
        posts: Option<Source>,
        settings: Option<Source>,
        tuning: RepositoryTuning,
    ) -> Self {
        Self::with_clock(posts, settings, tuning, Arc::new(SystemClock))
    }

    /// Full constructor with an injected clock, for deterministic cache
    /// expiry in tests.
    pub fn with_clock(
        posts: Option<Source>,
        settings: Option<Source>,
        tuning: RepositoryTuning,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let list_cache = TtlCache::with_clock(tuning.list_ttl, clock.clone());
        let settings_cache = TtlCache::with_clock(tuning.settings_ttl, clock);
        Self {
            posts,
            settings,
            tuning,
            list_cache,
            settings_cache,
        }
    }

    /// Wire up real HTTP sources from configuration. Unconfigured sources
    /// stay absent and degrade to empty/default results.
    pub fn from_config(config: &ContentConfig) -> Result<Self, ContentError> {
        let posts = config.content.as_ref().map(Source::from_config).transpose()?;
        let settings = config
            .settings
            .as_ref()
            .map(Source::from_config)
            .transpose()?;
        Ok(Self::new(posts, settings))
    }

    /// List published posts, optionally filtered by tag and/or a search
    /// query over title and excerpt, paginated in memory.
    pub async fn list_posts(&self, filter: &PostFilter) -> PaginatedPosts {
        let Some(source) = &self.posts else {
            tracing::warn!("Content database is not configured; returning no posts");
            return PaginatedPosts::empty();
        };

        let key = TtlCache::key("list_posts", filter);
        if let Some(hit) = self.list_cache.get::<PaginatedPosts>(&key) {
            return hit;
        }

        let mut clauses = vec![
            Filter::select_equals("Type", "post"),
            Filter::select_equals("Status", "Published"),
        ];
        if let Some(tag) = &filter.tag {
            clauses.push(Filter::multi_select_contains("Tags", tag));
        }
        if let Some(query) = &filter.search {
            clauses.push(Filter::or(vec![
                Filter::title_contains("Title", query),
                Filter::rich_text_contains("Excerpt", query),
            ]));
        }
        let request = QueryRequest::new()
            .with_filter(Filter::and(clauses))
            .with_sort(Sort::descending("PublishedDate"));

        let (mut pages, fidelity) = self.query_with_fallback(source, request, "list_posts").await;
        if fidelity == QueryFidelity::Degraded {
            pages.retain(|page| page_passes_post_filter(page, filter));
        }

        let mut posts: Vec<Post> = pages.iter().map(Post::from_page).collect();
        sort_by_date_descending(&mut posts);

        let total_posts = posts.len();
        let page_size = filter
            .page_size
            .unwrap_or(self.tuning.default_page_size)
            .max(1);
        let current_page = filter.page.unwrap_or(1).max(1);
        let start = (current_page - 1).saturating_mul(page_size);
        let posts: Vec<Post> = posts.into_iter().skip(start).take(page_size).collect();

        let result = PaginatedPosts {
            posts,
            total_posts,
            current_page,
            fidelity,
        };
        self.list_cache.put(&key, &result);
        result
    }

    /// List published standalone pages, optionally restricted to a category.
    pub async fn list_pages(&self, filter: &PageFilter) -> PaginatedPosts {
        let Some(source) = &self.posts else {
            tracing::warn!("Content database is not configured; returning no pages");
            return PaginatedPosts::empty();
        };

        let key = TtlCache::key("list_pages", filter);
        if let Some(hit) = self.list_cache.get::<PaginatedPosts>(&key) {
            return hit;
        }

        let mut clauses = vec![
            Filter::select_equals("Type", "page"),
            Filter::select_equals("Status", "Published"),
        ];
        if let Some(category) = filter.category {
            clauses.push(Filter::select_equals("PageCategory", category.as_str()));
        }
        let request = QueryRequest::new()
            .with_filter(Filter::and(clauses))
            .with_sort(Sort::descending("PublishedDate"));

        let (mut pages, fidelity) = self.query_with_fallback(source, request, "list_pages").await;
        if fidelity == QueryFidelity::Degraded {
            pages.retain(|page| page_passes_page_filter(page, filter.category));
        }

        let mut posts: Vec<Post> = pages.iter().map(Post::from_page).collect();
        sort_by_date_descending(&mut posts);

        let result = PaginatedPosts {
            total_posts: posts.len(),
            posts,
            current_page: 1,
            fidelity,
        };
        self.list_cache.put(&key, &result);
        result
    }

    /// Look up a single published document by slug, attach its structured
    /// body, and compute related posts. An unknown slug is an absent post,
    /// not an error.
    pub async fn get_by_slug(&self, slug: &str) -> SlugLookup {
        let Some(source) = &self.posts else {
            tracing::warn!("Content database is not configured; slug lookup returns nothing");
            return SlugLookup::not_found();
        };

        let key = TtlCache::key("get_by_slug", &slug);
        if let Some(hit) = self.list_cache.get::<SlugLookup>(&key) {
            return hit;
        }

        let request = QueryRequest::new().with_filter(Filter::and(vec![
            Filter::rich_text_equals("Slug", slug),
            Filter::select_equals("Status", "Published"),
        ]));

        let (pages, _) = self.query_with_fallback(source, request, "get_by_slug").await;
        // Re-check the slug client-side: in degraded mode the result set is
        // an unfiltered superset.
        let page = pages
            .into_iter()
            .find(|page| page.rich_text_text("Slug").as_deref() == Some(slug));

        let Some(page) = page else {
            let miss = SlugLookup::not_found();
            self.list_cache.put(&key, &miss);
            return miss;
        };

        let mut post = Post::from_page(&page);
        match source.api.fetch_record_map(&post.id).await {
            Ok(record_map) => post.record_map = Some(record_map),
            Err(e) => {
                tracing::warn!("get_by_slug: failed to fetch document body for {slug}: {e}");
            }
        }

        let related_posts = self.related_posts(source, &post).await;
        let result = SlugLookup {
            post: Some(post),
            related_posts,
        };
        self.list_cache.put(&key, &result);
        result
    }

    /// All tags across published posts, deduplicated and lexicographically
    /// sorted. Bounded by the same fetch cap as list queries.
    pub async fn list_tags(&self) -> Vec<String> {
        let Some(source) = &self.posts else {
            tracing::warn!("Content database is not configured; returning no tags");
            return Vec::new();
        };

        let key = "list_tags";
        if let Some(hit) = self.list_cache.get::<Vec<String>>(key) {
            return hit;
        }

        let request = QueryRequest::new().with_filter(Filter::and(vec![
            Filter::select_equals("Type", "post"),
            Filter::select_equals("Status", "Published"),
        ]));

        let (mut pages, fidelity) = self.query_with_fallback(source, request, "list_tags").await;
        if fidelity == QueryFidelity::Degraded {
            pages.retain(|page| page_passes_post_filter(page, &PostFilter::default()));
        }

        let tags: BTreeSet<String> = pages
            .iter()
            .flat_map(|page| page.multi_select_names("Tags"))
            .collect();
        let tags: Vec<String> = tags.into_iter().collect();

        self.list_cache.put(key, &tags);
        tags
    }

    /// Published posts flagged as featured, newest first, capped.
    pub async fn featured_posts(&self) -> Vec<Post> {
        let Some(source) = &self.posts else {
            tracing::warn!("Content database is not configured; returning no featured posts");
            return Vec::new();
        };

        let key = "featured_posts";
        if let Some(hit) = self.list_cache.get::<Vec<Post>>(key) {
            return hit;
        }

        let request = QueryRequest::new()
            .with_filter(Filter::and(vec![
                Filter::select_equals("Type", "post"),
                Filter::select_equals("Status", "Published"),
                Filter::checkbox_equals("Featured", true),
            ]))
            .with_sort(Sort::descending("PublishedDate"));

        let (mut pages, fidelity) = self
            .query_with_fallback(source, request, "featured_posts")
            .await;
        if fidelity == QueryFidelity::Degraded {
            pages.retain(|page| {
                page_passes_post_filter(page, &PostFilter::default())
                    && page.checkbox("Featured") == Some(true)
            });
        }

        let mut posts: Vec<Post> = pages.iter().map(Post::from_page).collect();
        sort_by_date_descending(&mut posts);
        posts.truncate(self.tuning.featured_limit);

        self.list_cache.put(key, &posts);
        posts
    }

    /// Site settings from the dedicated settings database. Never fails:
    /// missing configuration or any remote error yields the documented
    /// defaults.
    pub async fn site_settings(&self) -> SiteSettings {
        let Some(source) = &self.settings else {
            tracing::warn!("Site settings database is not configured; using default values");
            return SiteSettings::default();
        };

        let key = "site_settings";
        if let Some(hit) = self.settings_cache.get::<SiteSettings>(key) {
            return hit;
        }

        let settings = match self.fetch_capped(source, &QueryRequest::new()).await {
            Ok(pages) => {
                let rows = pages.iter().filter_map(|page| {
                    let row_key = page.title_text("Key")?;
                    let row_value = page.rich_text_text("Value")?;
                    if row_key.is_empty() {
                        None
                    } else {
                        Some((row_key, row_value))
                    }
                });
                SiteSettings::from_rows(rows)
            }
            Err(e) => {
                tracing::error!("Failed to fetch site settings: {e}");
                return SiteSettings::default();
            }
        };

        self.settings_cache.put(key, &settings);
        settings
    }

    async fn related_posts(&self, source: &Source, post: &Post) -> Vec<Post> {
        let Some(first_tag) = post.tags.first() else {
            return Vec::new();
        };

        let request = QueryRequest::new()
            .with_filter(Filter::and(vec![
                Filter::select_equals("Type", "post"),
                Filter::select_equals("Status", "Published"),
                Filter::multi_select_contains("Tags", first_tag),
            ]))
            .with_sort(Sort::descending("PublishedDate"));

        let (pages, fidelity) = self
            .query_with_fallback(source, request, "related_posts")
            .await;

        let mut related: Vec<Post> = pages.iter().map(Post::from_page).collect();
        if fidelity == QueryFidelity::Degraded {
            related.retain(|p| p.post_type == PostType::Post && p.tags.contains(first_tag));
        }
        related.retain(|p| p.slug != post.slug);
        sort_by_date_descending(&mut related);
        related.truncate(self.tuning.related_limit);
        related
    }

    /// Attempt the exact query; on a schema validation rejection retry once
    /// with filter and sorts stripped. Any other failure, or a failed retry,
    /// yields an empty set.
    async fn query_with_fallback(
        &self,
        source: &Source,
        request: QueryRequest,
        operation: &str,
    ) -> (Vec<Page>, QueryFidelity) {
        match self.fetch_capped(source, &request).await {
            Ok(pages) => (pages, QueryFidelity::Exact),
            Err(e) if e.is_schema_validation() => {
                tracing::warn!("{operation}: {e}; retrying without filters and sorts");
                match self.fetch_capped(source, &request.degraded()).await {
                    Ok(pages) => (pages, QueryFidelity::Degraded),
                    Err(retry_err) => {
                        tracing::error!("{operation}: degraded retry failed: {retry_err}");
                        (Vec::new(), QueryFidelity::Degraded)
                    }
                }
            }
            Err(e) => {
                tracing::error!("{operation}: query failed: {e}");
                (Vec::new(), QueryFidelity::Exact)
            }
        }
    }

    /// Walk continuation cursors until the fetch cap is reached or the
    /// remote source is exhausted.
    async fn fetch_capped(
        &self,
        source: &Source,
        request: &QueryRequest,
    ) -> Result<Vec<Page>, ContentError> {
        let cap = self.tuning.fetch_cap;
        let mut pages: Vec<Page> = Vec::new();
        let mut cursor: Option<String> = None;

        while pages.len() < cap {
            let remaining = cap - pages.len();
            let mut step = request.clone();
            step.page_size = Some(remaining.min(MAX_REMOTE_PAGE_SIZE) as u32);
            step.start_cursor = cursor;

            let response = source.api.query_database(&source.database_id, step).await?;
            if response.results.is_empty() {
                break;
            }
            pages.extend(response.results);

            match (response.has_more, response.next_cursor) {
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        pages.truncate(cap);
        Ok(pages)
    }
}

/// Client-side re-application of the post list filter, used on degraded
/// result sets. A property that has drifted away cannot be re-checked; such
/// documents pass through, which is the documented degradation.
fn page_passes_post_filter(page: &Page, filter: &PostFilter) -> bool {
    if matches!(page.select_name("Type"), Some(t) if !t.eq_ignore_ascii_case("post")) {
        return false;
    }
    if matches!(page.select_name("Status"), Some(s) if s != "Published") {
        return false;
    }
    if let Some(tag) = &filter.tag {
        if !page.multi_select_names("Tags").iter().any(|t| t == tag) {
            return false;
        }
    }
    if let Some(query) = &filter.search {
        let query = query.to_lowercase();
        let title = page.title_text("Title").unwrap_or_default().to_lowercase();
        let excerpt = page
            .rich_text_text("Excerpt")
            .unwrap_or_default()
            .to_lowercase();
        if !title.contains(&query) && !excerpt.contains(&query) {
            return false;
        }
    }
    true
}

fn page_passes_page_filter(page: &Page, category: Option<PageCategory>) -> bool {
    if matches!(page.select_name("Type"), Some(t) if !t.eq_ignore_ascii_case("page")) {
        return false;
    }
    if matches!(page.select_name("Status"), Some(s) if s != "Published") {
        return false;
    }
    if let Some(category) = category {
        if page.select_name("PageCategory") != Some(category.as_str()) {
            return false;
        }
    }
    true
}

/// ISO dates compare chronologically as strings.
fn sort_by_date_descending(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.published_date.cmp(&a.published_date));
}
