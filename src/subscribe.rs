use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::notion::client::Source;

lazy_static! {
    /// Syntactic check only; deliverability is the mailing list's problem.
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub name: String,
    pub email: String,
}

/// Per-field validation messages, mirrored to the signup form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl FieldErrors {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SubscribeOutcome {
    Subscribed,
    /// Input rejected before any network call.
    Invalid(FieldErrors),
    /// Configuration or remote failure; the message is user-presentable.
    Failed(String),
}

/// Creates subscriber records in the dedicated subscribers database.
pub struct SubscriberGateway {
    source: Option<Source>,
}

impl SubscriberGateway {
    pub fn new(source: Option<Source>) -> Self {
        Self { source }
    }

    /// Validate and record a signup. Input is checked first; an unconfigured
    /// database or a remote failure surfaces as a form-level error message
    /// without blocking the rest of the page.
    pub async fn subscribe(&self, request: &SubscribeRequest) -> SubscribeOutcome {
        let errors = validate(request);
        if !errors.is_empty() {
            return SubscribeOutcome::Invalid(errors);
        }

        let Some(source) = &self.source else {
            tracing::warn!("Subscriber database is not configured; rejecting signup");
            return SubscribeOutcome::Failed(
                "Subscriber database is not configured.".to_string(),
            );
        };

        let properties = serde_json::json!({
            "Name": {
                "title": [ { "text": { "content": request.name.trim() } } ]
            },
            "Email": {
                "email": request.email.trim()
            },
            "SubscribedAt": {
                "date": { "start": Utc::now().to_rfc3339() }
            }
        });

        match source.api.create_page(&source.database_id, properties).await {
            Ok(()) => SubscribeOutcome::Subscribed,
            Err(e) => {
                tracing::error!("Failed to add subscriber: {e}");
                SubscribeOutcome::Failed("Something went wrong. Please try again later.".to_string())
            }
        }
    }
}

fn validate(request: &SubscribeRequest) -> FieldErrors {
    let mut errors = FieldErrors::default();
    if request.name.trim().chars().count() < MIN_NAME_LEN {
        errors.name = Some("Name must be at least 2 characters.".to_string());
    }
    if !EMAIL_RE.is_match(request.email.trim()) {
        errors.email = Some("Please enter a valid email.".to_string());
    }
    errors
}
