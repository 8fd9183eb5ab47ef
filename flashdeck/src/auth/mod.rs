//! Authentication against a hosted identity provider.
//!
//! Accounts, passwords and token issuance live in the provider (GoTrue / Supabase Auth). This
//! service only forwards sign-up and sign-in, and resolves bearer tokens to a [`CurrentUser`].
//!
//! # Modules
//!
//! - [`provider`]: The [`AuthProvider`] trait and its types
//! - [`gotrue`]: HTTP implementation against a GoTrue-compatible API
//! - [`session`]: Local HS256 verification of access tokens when `auth.jwt_secret` is set
//! - [`current_user`]: The bearer-token extractor used by protected handlers
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use flashdeck::auth::current_user::CurrentUser;
//!
//! async fn protected_handler(current_user: CurrentUser) -> String {
//!     format!("Hello, {}!", current_user.id)
//! }
//! ```

pub mod current_user;
pub mod gotrue;
pub mod provider;
pub mod session;

pub use current_user::CurrentUser;
pub use gotrue::GoTrueAuthProvider;
pub use provider::{AuthProvider, AuthProviderError, AuthSession, AuthUser};
