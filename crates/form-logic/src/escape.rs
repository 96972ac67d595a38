/// HTML-escapes option values the way the server renders them.
///
/// Empty input has no escaped form and yields `None`.
pub fn escape_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    Some(escaped)
}
