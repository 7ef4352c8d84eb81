//! Input validation utilities

/// Whether `name` is a plain identifier usable as a function name in every
/// harness language (ASCII letter or underscore, then letters, digits, underscores)
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a problem slug (lowercase words separated by hyphens)
pub fn validate_slug(slug: &str) -> Result<(), &'static str> {
    if slug.is_empty() || slug.len() > 255 {
        return Err("Slug must be between 1 and 255 characters");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Slug can only contain lowercase letters, digits, and hyphens");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("twoSum"));
        assert!(is_identifier("_helper2"));
        assert!(!is_identifier("2sum"));
        assert!(!is_identifier("two sum"));
        assert!(!is_identifier("x); import os; ("));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("two-sum").is_ok());
        assert!(validate_slug("Two-Sum").is_err());
        assert!(validate_slug("").is_err());
    }
}
