use serde::{Deserialize, Serialize};

use crate::notion::types::{Page, RecordMap};

/// Placeholder cover used when a document has no cover image.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/1200x630.png";
pub const PLACEHOLDER_IMAGE_HINT: &str = "abstract background";

const DEFAULT_AUTHOR: &str = "Anonymous";
const DEFAULT_TITLE: &str = "Untitled";

/// Whether a document is a blog post or a standalone page.
///
/// Derived from the `Type` select; unrecognized values fall back to `Post`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Post,
    Page,
}

/// Grouping for standalone pages (footer navigation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageCategory {
    Core,
    Legal,
}

impl PageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageCategory::Core => "Core",
            PageCategory::Legal => "Legal",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "Core" => Some(PageCategory::Core),
            "Legal" => Some(PageCategory::Legal),
            _ => None,
        }
    }
}

/// The stable document model the adapter exposes.
///
/// Every field is defaulted at construction; a `Post` is never mutated
/// afterwards, except for the lazily attached `record_map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Notion page id.
    pub id: String,
    /// URL-safe lookup key. Uniqueness is assumed, not enforced.
    pub slug: String,
    pub title: String,
    pub author: String,
    pub excerpt: String,
    /// Insertion order as stored upstream; deduplicated only when
    /// aggregated across posts.
    pub tags: Vec<String>,
    /// ISO date; falls back to the page creation time when unset.
    pub published_date: String,
    pub featured_image: String,
    pub featured_image_hint: String,
    pub post_type: PostType,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub page_category: Option<PageCategory>,
    /// Structured body, populated only by single-document lookups.
    #[serde(default)]
    pub record_map: Option<RecordMap>,
}

impl Post {
    /// Normalize a remote page into the stable model, defaulting every
    /// property that is missing or has drifted to an unexpected shape.
    pub fn from_page(page: &Page) -> Self {
        let title = page
            .title_text("Title")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let author = page
            .rich_text_text("Author")
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let published_date = page
            .date_start("PublishedDate")
            .unwrap_or_else(|| page.created_time.format("%Y-%m-%d").to_string());

        let post_type = match page.select_name("Type") {
            Some(t) if t.eq_ignore_ascii_case("page") => PostType::Page,
            _ => PostType::Post,
        };

        let (featured_image, featured_image_hint) = match page.cover_url() {
            Some(url) => (
                url.to_string(),
                page.rich_text_text("FeaturedImageHint")
                    .filter(|h| !h.is_empty())
                    .unwrap_or_else(|| PLACEHOLDER_IMAGE_HINT.to_string()),
            ),
            None => (
                PLACEHOLDER_IMAGE.to_string(),
                PLACEHOLDER_IMAGE_HINT.to_string(),
            ),
        };

        Self {
            id: page.id.clone(),
            slug: page.rich_text_text("Slug").unwrap_or_default(),
            title,
            author,
            excerpt: page.rich_text_text("Excerpt").unwrap_or_default(),
            tags: page.multi_select_names("Tags"),
            published_date,
            featured_image,
            featured_image_hint,
            post_type,
            featured: page.checkbox("Featured").unwrap_or(false),
            page_category: page
                .select_name("PageCategory")
                .and_then(PageCategory::parse),
            record_map: None,
        }
    }
}

/// Whether a list result came from the exact query or from the degraded
/// fallback issued after a schema validation rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryFidelity {
    Exact,
    Degraded,
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedPosts {
    pub posts: Vec<Post>,
    /// Matching documents within the fetch cap, before slicing.
    pub total_posts: usize,
    pub current_page: usize,
    pub fidelity: QueryFidelity,
}

impl PaginatedPosts {
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            total_posts: 0,
            current_page: 1,
            fidelity: QueryFidelity::Exact,
        }
    }
}

/// Result of a single-document lookup. An unknown slug is an absent post,
/// not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlugLookup {
    pub post: Option<Post>,
    pub related_posts: Vec<Post>,
}

impl SlugLookup {
    pub fn not_found() -> Self {
        Self {
            post: None,
            related_posts: Vec::new(),
        }
    }
}
