use time::{Date, format_description::FormatItem, macros::format_description};

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// Number of characters of the body shown in list views.
pub const TEASER_LENGTH: usize = 200;

/// Cut `text` down to its first `limit` characters.
///
/// Counts Unicode scalar values so multi-byte text is never split inside a
/// character.
pub fn teaser(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn teaser_keeps_short_text_intact() {
        assert_eq!(teaser("hello", TEASER_LENGTH), "hello");
        assert_eq!(teaser("", TEASER_LENGTH), "");
    }

    #[test]
    fn teaser_cuts_at_character_boundary() {
        let text = "привет мир";
        assert_eq!(teaser(text, 6), "привет");
        assert_eq!(teaser(text, 10), text);
    }

    #[test]
    fn teaser_limits_long_text_to_exactly_limit_chars() {
        let text = "a".repeat(TEASER_LENGTH + 50);
        assert_eq!(teaser(&text, TEASER_LENGTH).chars().count(), TEASER_LENGTH);
    }

    #[test]
    fn human_date_uses_long_month() {
        assert_eq!(format_human_date(date!(2024 - 03 - 07)), "March 7, 2024");
    }
}
