use crate::error::{Error, Result};

/// Trims a required text field, rejecting values that are only whitespace.
pub fn required_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_field(field, "blank", format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}

/// [`required_text`] plus a length limit counted in characters after trimming.
pub fn bounded_text(field: &'static str, value: &str, max_chars: usize) -> Result<String> {
    let text = required_text(field, value)?;
    if text.chars().count() > max_chars {
        return Err(Error::invalid_field(
            field,
            "length",
            format!("{} must be at most {} characters", field, max_chars),
        ));
    }
    Ok(text)
}

pub fn optional_bounded_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>> {
    value.map(|v| bounded_text(field, v, max_chars)).transpose()
}

/// Wraps user input in `%` for a substring `ILIKE ... ESCAPE '\'` match,
/// escaping the wildcard characters it may contain.
pub fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Same as [`required_text`] for fields that may be absent in a partial update.
pub fn optional_required_text(field: &'static str, value: Option<&str>) -> Result<Option<String>> {
    value.map(|v| required_text(field, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_a_field_error() {
        let err = required_text("position_title", "   ").unwrap_err();
        match err {
            Error::Validation(errors) => assert!(errors.field_errors().contains_key("position_title")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(required_text("name", "  Acme ").unwrap(), "Acme");
        assert_eq!(optional_required_text("name", None).unwrap(), None);
    }

    #[test]
    fn length_limit_applies_to_trimmed_text() {
        let padded = format!("  {}  ", "a".repeat(200));
        assert_eq!(bounded_text("position_title", &padded, 200).unwrap().len(), 200);

        let err = bounded_text("position_title", &"é".repeat(201), 200).unwrap_err();
        assert!(matches!(err, Error::Validation(e) if e.field_errors().contains_key("position_title")));
        assert_eq!(optional_bounded_text("position_title", None, 200).unwrap(), None);
    }

    #[test]
    fn search_wildcards_are_escaped() {
        assert_eq!(contains_pattern("acme"), "%acme%");
        assert_eq!(contains_pattern("100%_off"), "%100\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
