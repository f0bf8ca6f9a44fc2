use thiserror::Error;

/// Maximum title length, in characters, for projects and tasks.
pub const TITLE_MAX_CHARS: usize = 200;

/// Maximum description length, in characters, for projects and tasks.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TextError {
    #[error("text cannot be empty")]
    Empty,

    #[error("text is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Trims a required title and checks its length.
pub(crate) fn normalize_title(raw: &str) -> Result<String, TextError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TextError::Empty);
    }
    check_len(trimmed, TITLE_MAX_CHARS)?;
    Ok(trimmed.to_owned())
}

/// Trims an optional description; blank input collapses to `None`.
pub(crate) fn normalize_description(raw: Option<String>) -> Result<Option<String>, TextError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    check_len(trimmed, DESCRIPTION_MAX_CHARS)?;
    Ok(Some(trimmed.to_owned()))
}

fn check_len(text: &str, max: usize) -> Result<(), TextError> {
    let len = text.chars().count();
    if len > max {
        return Err(TextError::TooLong { len, max });
    }
    Ok(())
}
