//! Name normalizer for destination directories.

use std::fmt;

use crate::errors::DumpError;

const ASCII_RANGE: usize = 128;

/// Maps arbitrary names onto filesystem-safe names.
///
/// A normalized name has at most `max_length` characters. Control
/// characters, whitespace, characters outside the basic multilingual plane,
/// the delimiter and every configured escape character are replaced with the
/// replacement character; upper-case letters are lower-cased.
///
/// Two normalizers with the same configuration compare equal and hash
/// identically, so a normalizer can key a memoization table.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct NameNormalizer {
    max_length: usize,
    escape: [bool; ASCII_RANGE],
    replacement: char,
    delimiter: char,
}

impl NameNormalizer {
    /// Creates a new normalizer.
    ///
    /// Escape characters, the replacement and the delimiter must all be
    /// ASCII. The replacement must itself survive normalization.
    pub fn new(
        max_length: usize,
        escape_characters: &str,
        replacement: char,
        delimiter: char,
    ) -> Result<Self, DumpError> {
        if max_length == 0 {
            return Err(DumpError::invalid_argument(
                "maximum name length must be greater than 0",
            ));
        }
        let mut escape = [false; ASCII_RANGE];
        for c in escape_characters.chars() {
            if !c.is_ascii() {
                return Err(DumpError::invalid_argument(format!(
                    "escape character must be ASCII: {c:?}"
                )));
            }
            escape[c as usize] = true;
        }
        if !delimiter.is_ascii() {
            return Err(DumpError::invalid_argument(format!(
                "delimiter must be ASCII: {delimiter:?}"
            )));
        }
        escape[delimiter as usize] = true;

        if !replacement.is_ascii()
            || replacement.is_ascii_control()
            || replacement.is_ascii_whitespace()
            || replacement.is_ascii_uppercase()
            || escape[replacement as usize]
        {
            return Err(DumpError::invalid_argument(format!(
                "replacement character is not a plain character: {replacement:?}"
            )));
        }

        Ok(Self {
            max_length,
            escape,
            replacement,
            delimiter,
        })
    }

    /// Returns the maximum length of normalized names.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Returns the replacement character.
    #[must_use]
    pub fn replacement(&self) -> char {
        self.replacement
    }

    /// Returns the delimiter, which never appears in a normalized name.
    #[must_use]
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Normalizes a name.
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        name.chars()
            .take(self.max_length)
            .map(|c| self.map_char(c))
            .collect()
    }

    fn map_char(&self, c: char) -> char {
        if self.is_escaped(c) {
            return self.replacement;
        }
        if c.is_uppercase() {
            // simple case mapping: one char in, one char out
            return c.to_lowercase().next().unwrap_or(c);
        }
        c
    }

    fn is_escaped(&self, c: char) -> bool {
        if c.is_control() || c.is_whitespace() || u32::from(c) > 0xFFFF {
            return true;
        }
        c.is_ascii() && self.escape[c as usize]
    }
}

impl fmt::Debug for NameNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped: String = (0..ASCII_RANGE)
            .filter(|&i| self.escape[i])
            .filter_map(|i| char::from_u32(i as u32))
            .collect();
        f.debug_struct("NameNormalizer")
            .field("max_length", &self.max_length)
            .field("escape", &escaped)
            .field("replacement", &self.replacement)
            .field("delimiter", &self.delimiter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn normalizer(max_length: usize) -> NameNormalizer {
        NameNormalizer::new(max_length, "/\\:", '_', '-').unwrap()
    }

    #[test]
    fn test_plain_name_passes_through() {
        assert_eq!(normalizer(100).normalize("orders_2024"), "orders_2024");
    }

    #[test]
    fn test_uppercase_is_lowered() {
        assert_eq!(normalizer(100).normalize("Orders"), "orders");
        assert_eq!(normalizer(100).normalize("ÄBC"), "äbc");
    }

    #[test]
    fn test_multi_char_lowercase_uses_first_char() {
        // U+0130 lowers to "i" followed by a combining dot
        assert_eq!(normalizer(100).normalize("\u{130}X"), "ix");
        assert_eq!(normalizer(2).normalize("\u{130}\u{130}\u{130}"), "ii");
    }

    #[test]
    fn test_control_and_whitespace_replaced() {
        assert_eq!(normalizer(100).normalize("a b\tc\u{7}d"), "a_b_c_d");
    }

    #[test]
    fn test_escape_set_and_delimiter_replaced() {
        assert_eq!(normalizer(100).normalize("a/b\\c:d-e"), "a_b_c_d_e");
    }

    #[test]
    fn test_supplementary_code_points_replaced() {
        assert_eq!(normalizer(100).normalize("a\u{1F600}b"), "a_b");
        assert_eq!(normalizer(100).normalize("日本"), "日本");
    }

    #[test]
    fn test_output_is_truncated() {
        let n = normalizer(4);
        assert_eq!(n.normalize("abcdefg"), "abcd");
        assert_eq!(n.normalize("\u{1F600}\u{1F600}\u{1F600}\u{1F600}\u{1F600}"), "____");
        assert!(n.normalize("ÅÅÅÅÅÅ").chars().count() <= 4);
    }

    #[test]
    fn test_rejects_non_ascii_configuration() {
        assert!(NameNormalizer::new(10, "é", '_', '-').is_err());
        assert!(NameNormalizer::new(10, "", '_', '—').is_err());
        assert!(NameNormalizer::new(10, "", 'é', '-').is_err());
        assert!(NameNormalizer::new(0, "", '_', '-').is_err());
    }

    #[test]
    fn test_rejects_escaped_replacement() {
        assert!(NameNormalizer::new(10, "_", '_', '-').is_err());
        assert!(NameNormalizer::new(10, "", '-', '-').is_err());
        assert!(NameNormalizer::new(10, "", ' ', '-').is_err());
    }

    #[test]
    fn test_value_semantics() {
        let a = normalizer(10);
        let b = normalizer(10);
        let c = normalizer(11);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<NameNormalizer> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_debug_lists_escape_set() {
        let debug = format!("{:?}", normalizer(10));
        assert!(debug.contains("max_length: 10"));
        assert!(debug.contains("delimiter: '-'"));
    }
}
