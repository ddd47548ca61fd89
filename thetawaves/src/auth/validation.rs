//! Input shape checks applied before anything reaches the store or hasher.

use super::{
    errors::{AuthError, AuthResult},
    models::{NewUser, PasswordField, SigninRequest, SignupRequest},
};
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

const SIGNUP_MISSING: &str = "Missing required fields";
const SIGNIN_MISSING: &str = "Missing username or password";

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern is valid"));

/// Signin credentials after presence checks
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

/// Normalize and check an email: trimmed, lowercased, `x@y.z` shaped.
pub fn normalize_email(email: &str) -> AuthResult<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_SHAPE.is_match(&email) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

/// Normalize and check a username: trimmed, at least 3 characters.
pub fn normalize_username(username: &str) -> AuthResult<String> {
    let username = username.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::InvalidUsername(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters long"
        )));
    }
    Ok(username.to_string())
}

/// Check password length. The password itself is not trimmed.
pub fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Turn a raw signup body into a user ready for hashing and persistence.
///
/// # Errors
///
/// * `AuthError::MissingFields` - any of the three fields absent or blank
/// * `AuthError::InvalidEmail`, `InvalidUsername`, `WeakPassword` - shape checks
pub fn validate_signup(request: SignupRequest) -> AuthResult<NewUser> {
    let (Some(email), Some(username), Some(password)) = (
        present(request.email),
        present(request.username),
        present(request.password),
    ) else {
        return Err(AuthError::MissingFields(SIGNUP_MISSING));
    };

    let email = normalize_email(&email)?;
    let username = normalize_username(&username)?;
    validate_password(&password)?;

    Ok(NewUser {
        email,
        username,
        password: PasswordField::Plain(password),
    })
}

/// Presence check for signin. No length rules: a short password is simply wrong.
pub fn validate_signin(request: SigninRequest) -> AuthResult<Credentials> {
    let (Some(username), Some(password)) = (present(request.username), present(request.password))
    else {
        return Err(AuthError::MissingFields(SIGNIN_MISSING));
    };

    Ok(Credentials {
        username: username.trim().to_string(),
        password,
    })
}
