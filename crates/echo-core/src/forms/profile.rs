use super::register::{BIO_MAX, PASSWORD_MIN};
use super::ValidationErrors;
use crate::models::{ProfileUpdate, UserRecord};

pub const NICKNAME_MAX: usize = 50;

/// Profile edit form. Blank fields mean "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub nickname: String,
    pub password: String,
    pub bio: String,
}

impl ProfileForm {
    /// Prefill from the current user. The password always starts blank.
    pub fn from_user(user: &UserRecord) -> Self {
        Self {
            nickname: user.nickname.clone().unwrap_or_default(),
            password: String::new(),
            bio: user.bio.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ProfileUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.nickname.chars().count() > NICKNAME_MAX {
            errors.add(
                "nickname",
                format!("Nickname cannot exceed {} characters", NICKNAME_MAX),
            );
        }
        if !self.password.is_empty() && self.password.chars().count() < PASSWORD_MIN {
            errors.add(
                "password",
                format!("Password must be at least {} characters", PASSWORD_MIN),
            );
        }
        if self.bio.chars().count() > BIO_MAX {
            errors.add("bio", format!("Bio cannot exceed {} characters", BIO_MAX));
        }

        errors.into_result(self.to_update())
    }

    /// Only the non-empty fields
    pub fn to_update(&self) -> ProfileUpdate {
        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        ProfileUpdate {
            nickname: non_empty(&self.nickname),
            password: non_empty(&self.password),
            bio: non_empty(&self.bio),
        }
    }
}
