//! Conflict-marked file content.

/// opens the head side of a conflict
pub const HEAD_MARKER: &str = "<<<<<<< HEAD\n";

/// separates the head side from the given side
pub const SEPARATOR: &str = "=======\n";

/// closes a conflict
pub const END_MARKER: &str = ">>>>>>>\n";

/// Build the content written for a conflicted file.
///
/// A missing side contributes no bytes. Both sides are copied verbatim, so a
/// side without a trailing newline runs straight into the next marker.
pub fn conflict_content(head: Option<&[u8]>, given: Option<&[u8]>) -> Vec<u8> {
    let head = head.unwrap_or_default();
    let given = given.unwrap_or_default();

    let mut out = Vec::with_capacity(
        HEAD_MARKER.len() + head.len() + SEPARATOR.len() + given.len() + END_MARKER.len(),
    );
    out.extend_from_slice(HEAD_MARKER.as_bytes());
    out.extend_from_slice(head);
    out.extend_from_slice(SEPARATOR.as_bytes());
    out.extend_from_slice(given);
    out.extend_from_slice(END_MARKER.as_bytes());
    out
}

/// check if `content` looks like the output of [`conflict_content`]
pub fn has_conflict_markers(content: &[u8]) -> bool {
    content.starts_with(HEAD_MARKER.as_bytes())
        && content.ends_with(END_MARKER.as_bytes())
        && content
            .windows(SEPARATOR.len())
            .any(|w| w == SEPARATOR.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_sides() {
        let content = conflict_content(Some(b"ours\n"), Some(b"theirs\n"));
        assert_eq!(
            content,
            b"<<<<<<< HEAD\nours\n=======\ntheirs\n>>>>>>>\n".to_vec()
        );
        assert!(has_conflict_markers(&content));
    }

    #[test]
    fn test_missing_given_side() {
        let content = conflict_content(Some(b"ours\n"), None);
        assert_eq!(content, b"<<<<<<< HEAD\nours\n=======\n>>>>>>>\n".to_vec());
    }

    #[test]
    fn test_missing_head_side() {
        let content = conflict_content(None, Some(b"theirs\n"));
        assert_eq!(content, b"<<<<<<< HEAD\n=======\ntheirs\n>>>>>>>\n".to_vec());
    }

    #[test]
    fn test_plain_content() {
        assert!(!has_conflict_markers(b"just text\n"));
    }
}
