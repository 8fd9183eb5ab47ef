use crate::types::{FlashcardId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// How a flashcard came to exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Manual,
    Ai,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Manual => "manual",
            SourceType::Ai => "ai",
        }
    }

    /// Parse a user-supplied value; only the exact lowercase names are accepted
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(SourceType::Manual),
            "ai" => Some(SourceType::Ai),
            _ => None,
        }
    }

    /// Interpret a stored column value. Anything other than `ai` reads as manual.
    pub fn from_stored(value: &str) -> Self {
        if value == "ai" { SourceType::Ai } else { SourceType::Manual }
    }
}

/// Direction of the `created_at` ordering used by list queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Database request for creating a new flashcard. The owner comes from the repository scope.
#[derive(Debug, Clone)]
pub struct FlashcardCreateDBRequest {
    pub front: String,
    pub back: String,
    pub source_type: SourceType,
    pub source_generation_card_id: Option<Uuid>,
}

/// Database request for updating a flashcard's text
#[derive(Debug, Clone)]
pub struct FlashcardUpdateDBRequest {
    pub front: String,
    pub back: String,
}

/// Database response for a flashcard
#[derive(Debug, Clone, PartialEq)]
pub struct FlashcardDBResponse {
    pub id: FlashcardId,
    pub user_id: UserId,
    pub front: String,
    pub back: String,
    pub source_type: SourceType,
    pub source_generation_card_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Filter for listing a user's flashcards with cursor pagination
#[derive(Debug, Clone)]
pub struct FlashcardFilter {
    pub limit: i64,
    /// Exclusive `created_at` bound; rows after it in `order` direction are returned
    pub cursor: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub source_type: Option<SourceType>,
    pub include_deleted: bool,
    /// Case-insensitive substring matched against front or back
    pub search: Option<String>,
}

impl Default for FlashcardFilter {
    fn default() -> Self {
        Self {
            limit: 20,
            cursor: None,
            order: SortOrder::Desc,
            source_type: None,
            include_deleted: false,
            search: None,
        }
    }
}

impl FlashcardFilter {
    /// Whether a row passes every predicate except the limit
    pub fn matches(&self, card: &FlashcardDBResponse) -> bool {
        if !self.include_deleted && card.deleted_at.is_some() {
            return false;
        }
        if let Some(source_type) = self.source_type
            && card.source_type != source_type
        {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !card.front.to_lowercase().contains(&needle) && !card.back.to_lowercase().contains(&needle) {
                return false;
            }
        }
        match (self.cursor, self.order) {
            (Some(cursor), SortOrder::Desc) => card.created_at < cursor,
            (Some(cursor), SortOrder::Asc) => card.created_at > cursor,
            (None, _) => true,
        }
    }
}
