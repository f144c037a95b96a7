//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.
//! The service still rejects blank ids on its own.

/// Maximum length of a task id accepted on the command line
pub const MAX_TASK_ID_LENGTH: usize = 128;

/// Maximum length of a task title
pub const MAX_TITLE_LENGTH: usize = 200;

/// Validate a task id.
///
/// Ids are opaque to the engine, so the only rules are: not blank, no
/// whitespace or control characters, and at most [`MAX_TASK_ID_LENGTH`]
/// characters.
pub fn validate_task_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Task ID cannot be empty".to_string());
    }

    if s.chars().count() > MAX_TASK_ID_LENGTH {
        return Err(format!(
            "Task ID cannot exceed {MAX_TASK_ID_LENGTH} characters"
        ));
    }

    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(format!(
            "Invalid task ID '{s}': whitespace and control characters are not allowed"
        ));
    }

    Ok(s.to_string())
}

/// Validate a task title
pub fn validate_title(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Title cannot be empty".to_string());
    }

    if s.chars().count() > MAX_TITLE_LENGTH {
        return Err(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters"
        ));
    }

    Ok(s.to_string())
}
