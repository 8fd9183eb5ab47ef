//! API request and response data models.
//!
//! API models are distinct from database models so the API contract and the storage
//! representation can evolve independently. Request fields are optional at the decode layer and
//! checked by `validate` methods, so every problem with a body is reported in one response.
//!
//! - [`auth`]: sign-up and login payloads
//! - [`flashcards`]: flashcard requests, responses and list query
//! - [`generation`]: notes submitted for generation
//! - [`smart`]: chat completion proxy request

pub mod auth;
pub mod flashcards;
pub mod generation;
pub mod smart;
