//! Input checks shared by the board operations.

use crate::error::{BoardError, BoardResult};

pub const MAX_TITLE_LEN: usize = 50;
pub const MAX_LABEL_LEN: usize = 20;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Trim `value` and check it is non-empty and at most `max` characters.
pub fn bounded_text(field: &str, value: &str, max: usize) -> BoardResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > max {
        return Err(BoardError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(trimmed.to_string())
}

pub fn title(value: &str) -> BoardResult<String> {
    bounded_text("title", value, MAX_TITLE_LEN)
}

/// Lowercase and sanity-check an email address.
pub fn email(value: &str) -> BoardResult<String> {
    let email = value.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(BoardError::validation(format!("invalid email address: {}", value.trim())))
    }
}

pub fn password(value: &str) -> BoardResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(BoardError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Accept `#abc`, `abc`, `#aabbcc` or `aabbcc`; return the lowercase form
/// with a leading `#`.
pub fn normalize_color(value: &str) -> BoardResult<String> {
    let hex = value.trim().trim_start_matches('#');
    if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(format!("#{}", hex.to_ascii_lowercase()))
    } else {
        Err(BoardError::validation(format!("invalid hex color: {}", value)))
    }
}
