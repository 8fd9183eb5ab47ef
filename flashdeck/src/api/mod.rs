//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//!
//! # API Structure
//!
//! - **Authentication** (`/auth/*`): sign-up and login
//! - **Flashcards** (`/api/flashcards/*`): per-user CRUD, listing and generation
//! - **Smart** (`/api/smart`): chat completion proxy
//!
//! Endpoints are annotated with `utoipa`; the document is served at `/api-docs/openapi.json`
//! and rendered at `/docs`.

pub mod handlers;
pub mod models;
