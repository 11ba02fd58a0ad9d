//! Offset Normalization
//!
//! Some engine paths report byte offsets while others report character
//! offsets. Byte offsets are detectable when a span end exceeds the
//! text's character count; in that case every span of the row is
//! converted before any comparison, so a row is never scored with mixed
//! units.

use crate::score::TokenUnit;

/// Convert a byte index into `text` to a character index by counting the
/// complete UTF-8 characters in the byte prefix. Indices past the end
/// clamp to the character count; an index inside a multi-byte character
/// counts only the characters fully before it.
pub fn byte_to_char_index(text: &str, byte_index: usize) -> usize {
    if byte_index == 0 {
        return 0;
    }
    if byte_index >= text.len() {
        return text.chars().count();
    }
    text.char_indices()
        .take_while(|(start, ch)| start + ch.len_utf8() <= byte_index)
        .count()
}

/// Normalize one engine's spans for a row to character offsets.
///
/// Detection looks at every token and sentence end: if any exceeds the
/// text's character count the whole row is treated as byte-offset and
/// converted consistently. Rows already in character units pass through
/// untouched.
pub fn normalize_row_offsets(
    text: &str,
    tokens: &mut [TokenUnit],
    sentences: &mut [(usize, usize)],
) {
    let char_len = text.chars().count();
    let exceeds = tokens.iter().any(|t| t.end > char_len)
        || sentences.iter().any(|&(_, end)| end > char_len);
    if !exceeds {
        return;
    }
    for token in tokens.iter_mut() {
        token.start = byte_to_char_index(text, token.start);
        token.end = byte_to_char_index(text, token.end);
    }
    for sentence in sentences.iter_mut() {
        *sentence = (
            byte_to_char_index(text, sentence.0),
            byte_to_char_index(text, sentence.1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_is_identity() {
        let text = "hello";
        assert_eq!(byte_to_char_index(text, 0), 0);
        assert_eq!(byte_to_char_index(text, 3), 3);
        assert_eq!(byte_to_char_index(text, 99), 5);
    }

    #[test]
    fn multibyte_prefix_counts_characters() {
        // Each Hangul syllable is 3 bytes in UTF-8; the 3rd character
        // starts at byte 6.
        let text = "아버지가방";
        assert_eq!(byte_to_char_index(text, 6), 2);
        assert_eq!(byte_to_char_index(text, 9), 3);
        // Inside a multi-byte character: only complete characters count.
        assert_eq!(byte_to_char_index(text, 7), 2);
        assert_eq!(byte_to_char_index(text, text.len()), 5);
    }

    #[test]
    fn normalization_converts_whole_row() {
        let text = "아버지"; // 3 chars, 9 bytes
        let mut tokens = vec![TokenUnit {
            start: 0,
            end: 9,
            form: "아버지".to_string(),
            tag: "NNG".to_string(),
        }];
        let mut sentences = vec![(0, 9)];
        normalize_row_offsets(text, &mut tokens, &mut sentences);
        assert_eq!(tokens[0].end, 3);
        assert_eq!(sentences[0], (0, 3));
    }

    #[test]
    fn char_offsets_pass_through() {
        let text = "아버지";
        let mut tokens = vec![TokenUnit {
            start: 0,
            end: 3,
            form: "아버지".to_string(),
            tag: "NNG".to_string(),
        }];
        let mut sentences = vec![(0, 3)];
        normalize_row_offsets(text, &mut tokens, &mut sentences);
        assert_eq!(tokens[0].end, 3);
        assert_eq!(sentences[0], (0, 3));
    }
}
