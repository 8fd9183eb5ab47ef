//! API request/response models for flashcards.

use crate::db::models::flashcards::{
    FlashcardCreateDBRequest, FlashcardDBResponse, FlashcardFilter, FlashcardUpdateDBRequest, SortOrder, SourceType,
};
use crate::types::FlashcardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Default number of cards per page.
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum number of cards that can be requested per page.
pub const MAX_LIMIT: i64 = 100;

// Flashcard request models. Text fields are optional at the decode layer so that a missing field
// is reported as a validation problem rather than a malformed body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FlashcardCreate {
    pub front: Option<String>,
    pub back: Option<String>,
    /// `manual` (default) or `ai`
    pub source_type: Option<String>,
}

impl FlashcardCreate {
    pub fn validate(self) -> Result<FlashcardCreateDBRequest, Vec<String>> {
        let mut problems = Vec::new();
        let front = required_text(self.front, "front", &mut problems);
        let back = required_text(self.back, "back", &mut problems);
        let source_type = match self.source_type.as_deref() {
            None => SourceType::default(),
            Some(value) => SourceType::parse(value).unwrap_or_else(|| {
                problems.push("source_type must be one of: manual, ai".to_string());
                SourceType::default()
            }),
        };

        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(FlashcardCreateDBRequest {
            front,
            back,
            source_type,
            source_generation_card_id: None,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FlashcardUpdate {
    pub front: Option<String>,
    pub back: Option<String>,
}

impl FlashcardUpdate {
    pub fn validate(self) -> Result<FlashcardUpdateDBRequest, Vec<String>> {
        let mut problems = Vec::new();
        let front = required_text(self.front, "front", &mut problems);
        let back = required_text(self.back, "back", &mut problems);

        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(FlashcardUpdateDBRequest { front, back })
    }
}

fn required_text(value: Option<String>, field: &str, problems: &mut Vec<String>) -> String {
    let value = value.map(|v| v.trim().to_string()).unwrap_or_default();
    if value.is_empty() {
        problems.push(format!("{field} is required"));
    }
    value
}

// Flashcard response models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FlashcardResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FlashcardId,
    pub front: String,
    pub back: String,
    pub source_type: SourceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<FlashcardDBResponse> for FlashcardResponse {
    fn from(db: FlashcardDBResponse) -> Self {
        Self {
            id: db.id,
            front: db.front,
            back: db.back,
            source_type: db.source_type,
            created_at: db.created_at,
            updated_at: db.updated_at,
            deleted_at: db.deleted_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FlashcardUpdateResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FlashcardId,
    pub front: String,
    pub back: String,
    pub updated_at: DateTime<Utc>,
}

impl From<FlashcardDBResponse> for FlashcardUpdateResponse {
    fn from(db: FlashcardDBResponse) -> Self {
        Self {
            id: db.id,
            front: db.front,
            back: db.back,
            updated_at: db.updated_at,
        }
    }
}

/// One page of flashcards. Pass `next_cursor` back as `cursor` to continue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FlashcardListResponse {
    pub data: Vec<FlashcardResponse>,
    pub next_cursor: Option<DateTime<Utc>>,
}

impl FlashcardListResponse {
    /// A full page means there may be more rows after the last one
    pub fn from_page(rows: Vec<FlashcardDBResponse>, limit: i64) -> Self {
        let next_cursor = match rows.last() {
            Some(last) if rows.len() as i64 == limit => Some(last.created_at),
            _ => None,
        };
        Self {
            data: rows.into_iter().map(FlashcardResponse::from).collect(),
            next_cursor,
        }
    }
}

/// Generic `{message}` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters for listing flashcards. Values arrive as raw strings and are checked by
/// [`ListFlashcardsQuery::into_filter`] so every problem is reported at once.
#[derive(Debug, Default, Clone, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct ListFlashcardsQuery {
    /// Page size (default: 20, max: 100)
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<String>,

    /// RFC 3339 timestamp from a previous page's `next_cursor`
    pub cursor: Option<String>,

    /// Sort key; only `created_at` is supported
    pub sort: Option<String>,

    /// `asc` or `desc` (default)
    pub order: Option<String>,

    /// Only cards with this origin: `manual` or `ai`
    pub source_type: Option<String>,

    /// `true` to include soft-deleted cards
    pub include_deleted: Option<String>,

    /// Case-insensitive text matched against front and back
    pub search: Option<String>,
}

impl ListFlashcardsQuery {
    /// Empty values are treated as absent
    pub fn into_filter(self) -> Result<FlashcardFilter, Vec<String>> {
        let mut problems = Vec::new();
        let mut filter = FlashcardFilter::default();
        let present = |value: Option<String>| value.filter(|v| !v.is_empty());

        if let Some(limit) = present(self.limit) {
            match limit.trim().parse::<i64>() {
                Ok(n) if (1..=MAX_LIMIT).contains(&n) => filter.limit = n,
                _ => problems.push(format!("limit must be an integer between 1 and {MAX_LIMIT}")),
            }
        }

        if let Some(cursor) = present(self.cursor) {
            match DateTime::parse_from_rfc3339(cursor.trim()) {
                Ok(ts) => filter.cursor = Some(ts.with_timezone(&Utc)),
                Err(_) => problems.push("cursor must be an RFC 3339 timestamp".to_string()),
            }
        }

        if let Some(sort) = present(self.sort)
            && sort != "created_at"
        {
            problems.push("sort must be created_at".to_string());
        }

        if let Some(order) = present(self.order) {
            match order.as_str() {
                "asc" => filter.order = SortOrder::Asc,
                "desc" => filter.order = SortOrder::Desc,
                _ => problems.push("order must be one of: asc, desc".to_string()),
            }
        }

        if let Some(source_type) = present(self.source_type) {
            match SourceType::parse(&source_type) {
                Some(parsed) => filter.source_type = Some(parsed),
                None => problems.push("source_type must be one of: manual, ai".to_string()),
            }
        }

        filter.include_deleted = self.include_deleted.is_some_and(|v| v.eq_ignore_ascii_case("true"));

        if let Some(search) = present(self.search) {
            let search = search.trim();
            if search.is_empty() {
                problems.push("search must not be empty".to_string());
            } else {
                filter.search = Some(search.to_string());
            }
        }

        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(filter)
    }
}
