use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A rich text segment. Only the plain text rendering is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// A select / multi-select option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

/// A date property payload. Only the start is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
}

/// A typed Notion property value.
///
/// Property shapes the adapter does not consume deserialize into `Unknown`
/// rather than failing the whole page, so upstream schema additions are
/// tolerated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Select { select: Option<SelectOption> },
    MultiSelect { multi_select: Vec<SelectOption> },
    Checkbox { checkbox: bool },
    Date { date: Option<DateValue> },
    #[serde(other)]
    Unknown,
}

impl PropertyValue {
    pub fn title(text: impl Into<String>) -> Self {
        PropertyValue::Title {
            title: vec![RichText {
                plain_text: text.into(),
            }],
        }
    }

    pub fn rich_text(text: impl Into<String>) -> Self {
        PropertyValue::RichText {
            rich_text: vec![RichText {
                plain_text: text.into(),
            }],
        }
    }

    pub fn select(name: impl Into<String>) -> Self {
        PropertyValue::Select {
            select: Some(SelectOption { name: name.into() }),
        }
    }

    pub fn multi_select<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyValue::MultiSelect {
            multi_select: names
                .into_iter()
                .map(|name| SelectOption { name: name.into() })
                .collect(),
        }
    }

    pub fn checkbox(checked: bool) -> Self {
        PropertyValue::Checkbox { checkbox: checked }
    }

    pub fn date(start: impl Into<String>) -> Self {
        PropertyValue::Date {
            date: Some(DateValue {
                start: start.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUrl {
    pub url: String,
}

/// A page cover image, either hosted externally or uploaded to Notion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cover {
    External { external: FileUrl },
    File { file: FileUrl },
}

impl Cover {
    pub fn url(&self) -> &str {
        match self {
            Cover::External { external } => &external.url,
            Cover::File { file } => &file.url,
        }
    }
}

/// An opaque document returned by a database query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub cover: Option<Cover>,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl Page {
    fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Concatenated plain text of a title property.
    pub fn title_text(&self, name: &str) -> Option<String> {
        match self.property(name)? {
            PropertyValue::Title { title } => Some(join_plain_text(title)),
            _ => None,
        }
    }

    /// Concatenated plain text of a rich text property.
    pub fn rich_text_text(&self, name: &str) -> Option<String> {
        match self.property(name)? {
            PropertyValue::RichText { rich_text } => Some(join_plain_text(rich_text)),
            _ => None,
        }
    }

    pub fn select_name(&self, name: &str) -> Option<&str> {
        match self.property(name)? {
            PropertyValue::Select { select } => select.as_ref().map(|o| o.name.as_str()),
            _ => None,
        }
    }

    pub fn multi_select_names(&self, name: &str) -> Vec<String> {
        match self.property(name) {
            Some(PropertyValue::MultiSelect { multi_select }) => {
                multi_select.iter().map(|o| o.name.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn checkbox(&self, name: &str) -> Option<bool> {
        match self.property(name)? {
            PropertyValue::Checkbox { checkbox } => Some(*checkbox),
            _ => None,
        }
    }

    pub fn date_start(&self, name: &str) -> Option<String> {
        match self.property(name)? {
            PropertyValue::Date { date } => date.as_ref().map(|d| d.start.clone()),
            _ => None,
        }
    }

    pub fn cover_url(&self) -> Option<&str> {
        self.cover.as_ref().map(|c| c.url())
    }
}

fn join_plain_text(segments: &[RichText]) -> String {
    segments
        .iter()
        .map(|s| s.plain_text.as_str())
        .collect::<Vec<_>>()
        .join("")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectCondition {
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainsCondition {
    pub contains: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckboxCondition {
    pub equals: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TextCondition {
    Equals { equals: String },
    Contains { contains: String },
}

/// A conjunctive/disjunctive filter tree in Notion's JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Filter {
    And {
        and: Vec<Filter>,
    },
    Or {
        or: Vec<Filter>,
    },
    Select {
        property: String,
        select: SelectCondition,
    },
    MultiSelect {
        property: String,
        multi_select: ContainsCondition,
    },
    Checkbox {
        property: String,
        checkbox: CheckboxCondition,
    },
    Title {
        property: String,
        title: TextCondition,
    },
    RichText {
        property: String,
        rich_text: TextCondition,
    },
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { and: filters }
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { or: filters }
    }

    pub fn select_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Select {
            property: property.into(),
            select: SelectCondition {
                equals: value.into(),
            },
        }
    }

    pub fn multi_select_contains(property: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::MultiSelect {
            property: property.into(),
            multi_select: ContainsCondition {
                contains: value.into(),
            },
        }
    }

    pub fn checkbox_equals(property: impl Into<String>, value: bool) -> Self {
        Filter::Checkbox {
            property: property.into(),
            checkbox: CheckboxCondition { equals: value },
        }
    }

    pub fn title_contains(property: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Title {
            property: property.into(),
            title: TextCondition::Contains {
                contains: value.into(),
            },
        }
    }

    pub fn rich_text_contains(property: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::RichText {
            property: property.into(),
            rich_text: TextCondition::Contains {
                contains: value.into(),
            },
        }
    }

    pub fn rich_text_equals(property: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::RichText {
            property: property.into(),
            rich_text: TextCondition::Equals {
                equals: value.into(),
            },
        }
    }

    /// Property names referenced anywhere in the tree.
    pub fn referenced_properties(&self) -> Vec<&str> {
        match self {
            Filter::And { and } => and.iter().flat_map(|f| f.referenced_properties()).collect(),
            Filter::Or { or } => or.iter().flat_map(|f| f.referenced_properties()).collect(),
            Filter::Select { property, .. }
            | Filter::MultiSelect { property, .. }
            | Filter::Checkbox { property, .. }
            | Filter::Title { property, .. }
            | Filter::RichText { property, .. } => vec![property.as_str()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sort {
    pub property: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// A database query request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub sorts: Vec<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// The degraded form of this request: filter and sorts stripped, trading
    /// correctness for availability after a schema validation rejection.
    pub fn degraded(&self) -> Self {
        Self {
            filter: None,
            sorts: Vec::new(),
            page_size: self.page_size,
            start_cursor: None,
        }
    }
}

/// A page of database query results plus the continuation cursor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub results: Vec<Page>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// The structured body of a single document, as returned by the block
/// children endpoint. Consumers treat it as an opaque render tree; the
/// adapter only fetches it lazily for single-document views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordMap(pub serde_json::Value);
