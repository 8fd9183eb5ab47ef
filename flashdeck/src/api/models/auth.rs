//! API request/response models for sign-up and sign-in.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Email/password pair accepted by both `/auth/signup` and `/auth/login`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Credentials that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCredentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Email is trimmed and must look like an address. The password is taken as-is.
    pub fn validate(self) -> Result<ValidCredentials, Vec<String>> {
        let mut problems = Vec::new();

        let email = self.email.map(|e| e.trim().to_string()).unwrap_or_default();
        if !is_plausible_email(&email) {
            problems.push("email must be valid".to_string());
        }

        let password = self.password.unwrap_or_default();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            problems.push(format!("password must be at least {MIN_PASSWORD_LENGTH} characters"));
        }

        if !problems.is_empty() {
            return Err(problems);
        }
        Ok(ValidCredentials { email, password })
    }
}

/// `local@domain.tld` with no whitespace; the provider does the real check
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SignupUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub user: SignupUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: LoginUser,
}
