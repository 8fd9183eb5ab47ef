//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection, provides strongly-typed operations, and returns
//! models from [`crate::db::models`].
//!
//! - [`Flashcards`]: a user's flashcards, scoped to that user at construction
//!
//! ```ignore
//! use flashdeck::db::handlers::{Flashcards, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! let mut repo = Flashcards::new(&mut conn, user_id);
//! let page = repo.list(&FlashcardFilter::default()).await?;
//! ```

pub mod flashcards;
pub mod repository;

pub use flashcards::Flashcards;
pub use repository::Repository;
