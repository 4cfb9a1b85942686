//! Header unfolding

/// Merge folded continuation lines into the logical header line they extend.
///
/// A continuation line starts with a space or a tab. Its content is appended
/// to the preceding line with a single space and its line break is dropped.
/// Line terminators of unfolded lines are kept as they were, so the result can
/// still be split on CRLF and unfolding the output again changes nothing.
pub fn unfold(header_block: &str) -> String {
    let mut lines: Vec<(String, &str)> = Vec::new();

    for raw in header_block.split_inclusive('\n') {
        let content = raw.trim_end_matches(['\r', '\n']);
        let terminator = &raw[content.len()..];
        let is_continuation = content.starts_with([' ', '\t']);

        match lines.last_mut() {
            Some((previous, previous_terminator)) if is_continuation && !previous.is_empty() => {
                let folded = content.trim();
                if !folded.is_empty() {
                    previous.truncate(previous.trim_end().len());
                    previous.push(' ');
                    previous.push_str(folded);
                }
                *previous_terminator = terminator;
            }
            _ => lines.push((content.to_string(), terminator)),
        }
    }

    lines
        .into_iter()
        .map(|(content, terminator)| content + terminator)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merges_continuation_with_single_space() {
        let unfolded = unfold("Subject: Hello\r\n World\r\n\r\n");
        assert_eq!(unfolded, "Subject: Hello World\r\n\r\n");
        assert_eq!(unfolded.split("\r\n").next(), Some("Subject: Hello World"));
    }

    #[test]
    fn test_tab_continuation_and_multiple_folds() {
        let block = "Content-Type: multipart/mixed;\r\n\tboundary=\"abc\"\r\nTo: a@example.com,\r\n  b@example.com,\r\n  c@example.com";
        assert_eq!(
            unfold(block),
            "Content-Type: multipart/mixed; boundary=\"abc\"\r\nTo: a@example.com, b@example.com, c@example.com"
        );
    }

    #[test]
    fn test_trailing_whitespace_is_not_doubled() {
        assert_eq!(unfold("Subject: Hello \r\n   World"), "Subject: Hello World");
    }

    #[test]
    fn test_bare_lf_lines() {
        assert_eq!(unfold("Subject: a\n b\nDate: x\n"), "Subject: a b\nDate: x\n");
    }

    #[test]
    fn test_unfolded_block_is_unchanged() {
        let block = "From: a@example.com\r\nSubject: Hi\r\n";
        assert_eq!(unfold(block), block);
    }

    #[test]
    fn test_leading_continuation_is_kept() {
        assert_eq!(unfold(" orphan\r\nSubject: x"), " orphan\r\nSubject: x");
    }

    #[test]
    fn test_whitespace_only_continuation_is_dropped() {
        assert_eq!(unfold("Subject: x\r\n   \r\nDate: y"), "Subject: x\r\nDate: y");
    }

    #[test]
    fn test_idempotent() {
        let blocks = [
            "Subject: Hello\r\n World\r\n\r\n",
            " orphan\r\n  more\r\nA: b\r\n\r\n c",
            "A: x \r\n\ty\n z\r\n",
            "",
            "\r\n\r\n",
            "NoColon\r\n continued",
        ];

        for block in blocks {
            let once = unfold(block);
            assert_eq!(unfold(&once), once, "unfolding {block:?} twice");
        }
    }
}
