use std::borrow::Cow;

const BYTE_ORDER_MARK: &str = "\u{feff}";

/// Calculates the 1-based line and column number for a given byte position in the source text.
/// This function is designed to be called only when an error occurs, as it iterates through
/// the source text to determine the position. Columns count characters, not bytes,
/// and a leading byte order mark does not count.
pub fn get_line_and_column(source: &str, position: usize) -> (usize, usize) {
    let position = floor_char_boundary(source, position);
    let before = &source[..position];
    let line = before.bytes().filter(|&b| b == b'\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let mut line_before = &before[line_start..];
    if line_start == 0 {
        line_before = line_before.strip_prefix(BYTE_ORDER_MARK).unwrap_or(line_before);
    }
    let column = line_before.chars().count() + 1;
    (line, column)
}

/// Returns the full text of the line containing `position`, without its line terminator.
pub fn get_line_text(source: &str, position: usize) -> &str {
    let position = floor_char_boundary(source, position);
    let line_start = source[..position].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[position..]
        .find('\n')
        .map_or(source.len(), |i| position + i);
    let text = source[line_start..line_end].trim_end_matches('\r');
    match line_start {
        0 => text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text),
        _ => text,
    }
}

fn floor_char_boundary(source: &str, position: usize) -> usize {
    let mut position = position.min(source.len());
    while !source.is_char_boundary(position) {
        position -= 1;
    }
    position
}

/// ASCII-lowercases a name, borrowing when it is already lowercase.
pub fn fold_case(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

/// Length of the identifier at the start of `text`: an ASCII letter or `_`,
/// then letters, digits, `_`, `.` or non-ASCII bytes. Zero when `text` does not
/// start with an identifier.
pub fn identifier_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return 0,
    }
    bytes
        .iter()
        .position(|&b| !(b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || !b.is_ascii()))
        .unwrap_or(bytes.len())
}

pub fn is_identifier(text: &str) -> bool {
    !text.is_empty() && identifier_len(text) == text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column() {
        let source = "a = 1\nbb = 2\n\nccc";
        assert_eq!(get_line_and_column(source, 0), (1, 1));
        assert_eq!(get_line_and_column(source, 4), (1, 5));
        assert_eq!(get_line_and_column(source, 6), (2, 1));
        assert_eq!(get_line_and_column(source, 11), (2, 6));
        assert_eq!(get_line_and_column(source, 14), (4, 1));
        assert_eq!(get_line_and_column(source, source.len()), (4, 4));
    }

    #[test]
    fn test_column_counts_characters() {
        let source = "ä = ö x";
        assert_eq!(get_line_and_column(source, "ä = ö ".len()), (1, 7));
    }

    #[test]
    fn test_byte_order_mark_is_not_a_column() {
        let source = "\u{feff}[x\ny";
        assert_eq!(get_line_and_column(source, 0), (1, 1));
        assert_eq!(get_line_and_column(source, 3), (1, 1));
        assert_eq!(get_line_and_column(source, 4), (1, 2));
        assert_eq!(get_line_and_column(source, 7), (2, 1));
        assert_eq!(get_line_text(source, 4), "[x");
        assert_eq!(get_line_and_column("a\n\u{feff}b", 5), (2, 2));
    }

    #[test]
    fn test_line_text() {
        let source = "first\r\nsecond line\nthird";
        assert_eq!(get_line_text(source, 0), "first");
        assert_eq!(get_line_text(source, 9), "second line");
        assert_eq!(get_line_text(source, source.len()), "third");
        assert_eq!(get_line_text("", 0), "");
    }

    #[test]
    fn test_fold_case() {
        assert!(matches!(fold_case("already_lower"), Cow::Borrowed(_)));
        assert_eq!(fold_case("MixedCase.Key"), "mixedcase.key");
        assert_eq!(fold_case("ÄBC"), "Äbc");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("key"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("server.port_2"));
        assert!(is_identifier("größe"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier(".hidden"));
        assert!(!is_identifier("two words"));
        assert!(!is_identifier(""));
        assert_eq!(identifier_len("key rest"), 3);
        assert_eq!(identifier_len("$key"), 0);
    }
}
