//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Rounds a score or percentage for display, e.g. `71.4285` -> `71`.
///
/// Usage in templates: `{{ summary.performance_score|whole }}`
#[askama::filter_fn]
pub fn whole(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(text
        .parse::<f64>()
        .map_or(text, |n| format!("{:.0}", n.round())))
}

/// Turns a snake/kebab/camel-case key into a label, e.g. `boostClock` ->
/// `Boost clock`.
///
/// Usage in templates: `{{ key|humanize }}`
#[askama::filter_fn]
pub fn humanize(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(humanize_key(&value.to_string()))
}

fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, c) in key.chars().enumerate() {
        match c {
            '_' | '-' => out.push(' '),
            c if c.is_ascii_uppercase() && i > 0 => {
                out.push(' ');
                out.push(c.to_ascii_lowercase());
            }
            c if i == 0 => out.push(c.to_ascii_uppercase()),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("boostClock"), "Boost clock");
        assert_eq!(humanize_key("form_factor"), "Form factor");
        assert_eq!(humanize_key("socket"), "Socket");
    }
}
