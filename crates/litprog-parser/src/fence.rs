/// Opening code fence with its info string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FenceOpen {
    pub fence_char: char,
    pub fence_len: usize,
    pub indent: usize,
    pub info: String,
}

pub fn detect_fence_start(line: &str) -> Option<FenceOpen> {
    let (indent_width, rest) = split_indent(line);
    if indent_width > 3 {
        return None;
    }

    let mut chars = rest.chars();
    let first = chars.next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let mut count = 1usize;
    for ch in chars {
        if ch == first {
            count += 1;
        } else {
            break;
        }
    }

    if count < 3 {
        return None;
    }

    // Fence characters are single-byte, so `count` is also a byte offset.
    let info = rest[count..].trim();
    if first == '`' && info.contains('`') {
        return None;
    }

    Some(FenceOpen {
        fence_char: first,
        fence_len: count,
        indent: indent_width,
        info: info.to_string(),
    })
}

pub fn is_closing_fence(line: &str, fence: &FenceOpen) -> bool {
    let (indent_width, rest) = split_indent(line);
    if indent_width > 3 {
        return false;
    }

    let trimmed = rest.trim_end();
    if trimmed.is_empty() {
        return false;
    }

    let mut count = 0usize;
    for ch in trimmed.chars() {
        if ch == fence.fence_char {
            count += 1;
        } else {
            return false;
        }
    }

    count >= fence.fence_len
}

/// Remove up to `width` columns of leading spaces, as CommonMark does for
/// content inside an indented fence.
pub fn strip_indent(line: &str, width: usize) -> &str {
    let mut removed = 0usize;
    for (idx, ch) in line.char_indices() {
        if removed >= width || ch != ' ' {
            return &line[idx..];
        }
        removed += 1;
    }
    if removed >= width {
        ""
    } else {
        line.trim_start_matches(' ')
    }
}

fn split_indent(line: &str) -> (usize, &str) {
    let mut width = 0usize;
    let mut byte_index = 0usize;

    for (idx, ch) in line.char_indices() {
        match ch {
            ' ' => {
                width += 1;
                byte_index = idx + ch.len_utf8();
            }
            '\t' => {
                width += 4;
                byte_index = idx + ch.len_utf8();
            }
            _ => {
                byte_index = idx;
                break;
            }
        }
    }

    if byte_index == 0 {
        (width, line)
    } else {
        (width, &line[byte_index..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_backtick_and_tilde_fences() {
        let fence = detect_fence_start("```{litprog} rust").unwrap();
        assert_eq!(fence.fence_char, '`');
        assert_eq!(fence.fence_len, 3);
        assert_eq!(fence.info, "{litprog} rust");

        let fence = detect_fence_start("  ~~~~").unwrap();
        assert_eq!(fence.fence_char, '~');
        assert_eq!(fence.fence_len, 4);
        assert_eq!(fence.indent, 2);
        assert_eq!(fence.info, "");
    }

    #[test]
    fn rejects_short_indented_and_inline_fences() {
        assert!(detect_fence_start("``not a fence").is_none());
        assert!(detect_fence_start("    ```").is_none());
        assert!(detect_fence_start("``` a`b").is_none());
    }

    #[test]
    fn closing_fence_must_match_char_and_length() {
        let fence = detect_fence_start("````").unwrap();
        assert!(!is_closing_fence("```", &fence));
        assert!(!is_closing_fence("~~~~", &fence));
        assert!(!is_closing_fence("```` trailing", &fence));
        assert!(is_closing_fence("`````  ", &fence));
    }

    #[test]
    fn strip_indent_removes_at_most_width_spaces() {
        assert_eq!(strip_indent("    code", 2), "  code");
        assert_eq!(strip_indent(" code", 2), "code");
        assert_eq!(strip_indent("  ", 3), "");
        assert_eq!(strip_indent("code", 0), "code");
    }
}
