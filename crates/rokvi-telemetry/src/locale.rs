//! Locale-aware number rendering for text output.

/// Language tags whose number formatting uses a decimal comma.
const DECIMAL_COMMA_LANGUAGES: &[&str] = &[
    "is", "da", "de", "es", "fi", "fr", "it", "nb", "nl", "pl", "pt", "ru", "sv",
];

/// Formatting culture used by the text renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
    decimal_separator: char,
}

impl Locale {
    /// Resolve a locale from a BCP 47 style tag such as `is-IS`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim();
        let language = tag
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        let decimal_separator = if DECIMAL_COMMA_LANGUAGES.contains(&language.as_str()) {
            ','
        } else {
            '.'
        };
        Self {
            tag: tag.to_string(),
            decimal_separator,
        }
    }

    /// Original tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Decimal separator for fractional numbers.
    #[must_use]
    pub const fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// Render a floating point value in this locale.
    #[must_use]
    pub fn format_f64(&self, value: f64) -> String {
        let rendered = value.to_string();
        if self.decimal_separator == '.' {
            rendered
        } else {
            rendered.replace('.', &self.decimal_separator.to_string())
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::from_tag(rokvi_config::defaults::DEFAULT_LOG_LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icelandic_uses_decimal_comma() {
        let locale = Locale::default();
        assert_eq!(locale.tag(), "is-IS");
        assert_eq!(locale.format_f64(1.5), "1,5");
    }

    #[test]
    fn english_uses_decimal_point() {
        let locale = Locale::from_tag("en-US");
        assert_eq!(locale.decimal_separator(), '.');
        assert_eq!(locale.format_f64(2.25), "2.25");
    }
}
