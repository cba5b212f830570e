const TRUNCATED_MARKER: &str = "\n[... truncated]";
pub const MAX_PREVIEW_CONTENT: usize = 4_096;

/// Display preview of extracted text. The full text stays on the result for
/// copy and save.
pub fn prepare_preview_content(text: &str) -> String {
    let trimmed = text.trim_start_matches(['\n', '\r']).trim_end();
    if trimmed.len() <= MAX_PREVIEW_CONTENT {
        trimmed.to_string()
    } else {
        let mut end = MAX_PREVIEW_CONTENT;
        while end > 0 && !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        let truncated = &trimmed[..end];
        format!("{truncated}{TRUNCATED_MARKER}")
    }
}

#[cfg(test)]
mod tests {
    use super::{prepare_preview_content, MAX_PREVIEW_CONTENT, TRUNCATED_MARKER};

    #[test]
    fn short_content_kept_as_is() {
        let content = "short preview";
        assert_eq!(prepare_preview_content(content), content);
    }

    #[test]
    fn leading_blank_lines_are_dropped() {
        assert_eq!(prepare_preview_content("\n\r\nbody\n\n"), "body");
    }

    #[test]
    fn truncated_content_appends_marker() {
        let content: String = "a".repeat(MAX_PREVIEW_CONTENT + 128);
        let preview = prepare_preview_content(&content);
        assert!(preview.ends_with(TRUNCATED_MARKER));
        assert_eq!(preview.len(), MAX_PREVIEW_CONTENT + TRUNCATED_MARKER.len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let content: String = "ü".repeat(MAX_PREVIEW_CONTENT);
        let preview = prepare_preview_content(&content);
        assert!(preview.ends_with(TRUNCATED_MARKER));
        assert!(preview.len() <= MAX_PREVIEW_CONTENT + TRUNCATED_MARKER.len());
    }
}
