use std::sync::OnceLock;

use regex::Regex;

use super::ValidationErrors;
use crate::models::RegisterRequest;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const BIO_MAX: usize = 200;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"\S+@\S+\.\S+")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub bio: String,
}

impl RegisterForm {
    /// Check every field and build the request the backend expects.
    ///
    /// All failures are reported at once, one message per field.
    pub fn validate(&self) -> Result<RegisterRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username_len = self.username.chars().count();
        if self.username.trim().is_empty() {
            errors.add("username", "Username is required");
        } else if !(USERNAME_MIN..=USERNAME_MAX).contains(&username_len) {
            errors.add(
                "username",
                format!("Username must be between {}-{} characters", USERNAME_MIN, USERNAME_MAX),
            );
        } else if !username_regex().is_match(&self.username) {
            errors.add(
                "username",
                "Username can only contain letters, numbers and underscores",
            );
        }

        if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
        } else if !email_regex().is_match(&self.email) {
            errors.add("email", "Please enter a valid email address");
        }

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < PASSWORD_MIN {
            errors.add(
                "password",
                format!("Password must be at least {} characters", PASSWORD_MIN),
            );
        }

        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        if self.bio.chars().count() > BIO_MAX {
            errors.add("bio", format!("Bio cannot exceed {} characters", BIO_MAX));
        }

        errors.into_result(RegisterRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            bio: Some(self.bio.clone()).filter(|b| !b.is_empty()),
        })
    }
}
