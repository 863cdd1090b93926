//! Formatting utilities for Telegram HTML text.

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Substitute `{key}` placeholders in a catalog template.
///
/// Values are user input, so they are HTML-escaped; the template is not.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), &escape_html(value));
    }
    out
}

/// Cut `text` to at most `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn fill_escapes_values_only() {
        assert_eq!(
            fill("Room <b>{name}</b> created.", &[("name", "<Trip>")]),
            "Room <b>&lt;Trip&gt;</b> created."
        );
        assert_eq!(fill("no vars", &[("name", "x")]), "no vars");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("короткий", 20), "короткий");
        assert_eq!(truncate_chars("комната", 4), "ком…");
    }
}
