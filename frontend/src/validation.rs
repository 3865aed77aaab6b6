//! Form checks run before anything is sent; a failing form never reaches the
//! network.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationErrors;
use crate::models::{BlogForm, LoginRequest, RegisterRequest};

pub const MIN_LOGIN_PASSWORD: usize = 6;
pub const MIN_REGISTER_PASSWORD: usize = 8;
pub const MIN_NAME: usize = 2;
pub const MIN_DESCRIPTION: usize = 20;

const SPECIAL_CHARS: &'static str = "!@#$%^&*(),.?\":{}|<>";

/// Something, an `@`, and a dotted domain, with no whitespace anywhere.
static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").ok());

pub fn is_email(value: &str) -> bool {
    EMAIL.as_ref().map_or(false, |pattern| pattern.is_match(value))
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn validate_login(request: &LoginRequest) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if request.email.trim().is_empty() {
        errors.add("email", "is required");
    } else if !is_email(request.email.trim()) {
        errors.add("email", "is not a valid address");
    }
    if char_len(&request.password) < MIN_LOGIN_PASSWORD {
        errors.add(
            "password",
            format!("must be at least {} characters", MIN_LOGIN_PASSWORD),
        );
    }
    errors.into_result()
}

/// Everything the sign-up form collects; only part of it goes to the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_terms: bool,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [("firstName", &self.first_name), ("lastName", &self.last_name)] {
            if char_len(value.trim()) < MIN_NAME {
                errors.add(field, format!("must be at least {} characters", MIN_NAME));
            }
        }
        if !is_email(self.email.trim()) {
            errors.add("email", "is not a valid address");
        }
        if char_len(&self.password) < MIN_REGISTER_PASSWORD {
            errors.add(
                "password",
                format!("must be at least {} characters", MIN_REGISTER_PASSWORD),
            );
        }
        if self.confirm_password.is_empty() {
            errors.add("confirmPassword", "is required");
        } else if self.password != self.confirm_password {
            errors.add("confirmPassword", "does not match the password");
        }
        if !self.agree_terms {
            errors.add("agreeTerms", "must be accepted");
        }

        errors.into_result()?;
        Ok(RegisterRequest {
            full_name: format!("{} {}", self.first_name.trim(), self.last_name.trim()),
            email: self.email.trim().to_owned(),
            password: self.password.clone(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PasswordStrength {
    pub min_length: bool,
    pub has_upper_case: bool,
    pub has_lower_case: bool,
    pub has_number: bool,
    pub has_special_char: bool,
}

impl PasswordStrength {
    pub fn of(password: &str) -> Self {
        PasswordStrength {
            min_length: char_len(password) >= MIN_REGISTER_PASSWORD,
            has_upper_case: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lower_case: password.chars().any(|c| c.is_ascii_lowercase()),
            has_number: password.chars().any(|c| c.is_ascii_digit()),
            has_special_char: password.chars().any(|c| SPECIAL_CHARS.contains(c)),
        }
    }

    pub fn percentage(&self) -> u32 {
        let met = [
            self.min_length,
            self.has_upper_case,
            self.has_lower_case,
            self.has_number,
            self.has_special_char,
        ]
        .iter()
        .filter(|met| **met)
        .count() as u32;
        met * 100 / 5
    }

    pub fn label(&self) -> &'static str {
        match self.percentage() {
            p if p < 40 => "Weak",
            p if p < 60 => "Fair",
            p if p < 80 => "Good",
            _ => "Strong",
        }
    }
}

pub fn validate_blog(form: &BlogForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if form.title.trim().is_empty() {
        errors.add("title", "is required");
    }
    if char_len(&form.description) < MIN_DESCRIPTION {
        errors.add(
            "description",
            format!("must be at least {} characters", MIN_DESCRIPTION),
        );
    }
    if form.category_id <= 0 {
        errors.add("categoryId", "is required");
    }
    if form.blog_visibility.is_none() {
        errors.add("visibility", "is required");
    }
    errors.into_result()
}
