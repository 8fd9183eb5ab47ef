//! HTTP request handlers for all API endpoints.
//!
//! Each handler validates and deserializes its request, authenticates through the
//! [`CurrentUser`](crate::auth::CurrentUser) extractor where required, calls storage or an
//! outbound client, and shapes the JSON response.
//!
//! # Handler Modules
//!
//! - [`auth`]: sign-up and password login against the auth provider
//! - [`flashcards`]: flashcard CRUD and cursor-paginated listing
//! - [`generation`]: notes-to-flashcards generation saved for the caller
//! - [`smart`]: validated chat completion proxy
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to a status code and a
//! `{message, details?}` JSON body.

pub mod auth;
pub mod flashcards;
pub mod generation;
pub mod smart;
