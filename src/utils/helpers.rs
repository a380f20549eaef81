//! Helper functions and utilities

use uuid::Uuid;

/// Generate a new UUID v4
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Reject blank identifiers before they reach the store
pub fn require_id(kind: &str, value: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::LotteryError::InvalidInput(format!("{} must not be empty", kind)));
    }
    Ok(())
}
