//! Database layer for flashcard persistence.
//!
//! This module implements the data access layer using SQLx with PostgreSQL.
//! It follows the Repository pattern to provide clean abstractions over database operations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (API request handlers)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │    Store    │  (db::store - owner-scoped FlashcardStore trait)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries over a single connection)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations for CRUD operations
//! - [`models`]: Database record structures and filters
//! - [`store`]: The [`store::FlashcardStore`] trait with Postgres and in-memory backends
//! - [`errors`]: Database-specific error types
//!
//! ## Example Usage
//!
//! ```ignore
//! use flashdeck::db::handlers::{Flashcards, Repository};
//!
//! async fn example(pool: &sqlx::PgPool, owner: UserId) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = pool.acquire().await?;
//!     let mut repo = Flashcards::new(&mut conn, owner);
//!
//!     let card = repo.create(&create_request).await?;
//!     assert!(repo.get_by_id(card.id).await?.is_some());
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;
