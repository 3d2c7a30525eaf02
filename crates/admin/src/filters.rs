//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Title-cases a lowercase status word.
///
/// Usage in templates: `{{ order.delivery_status|label }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn label(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(capitalize(&value.to_string()))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("pending"), "Pending");
        assert_eq!(capitalize("paid"), "Paid");
        assert_eq!(capitalize(""), "");
    }
}
