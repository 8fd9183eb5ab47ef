//! Database record models matching table schemas.
//!
//! Database models are kept distinct from API models so the storage and API representations can
//! evolve independently.
//!
//! - [`flashcards`]: flashcard rows, create/update requests and list filters

pub mod flashcards;
