//! Identifier quoting.

use std::borrow::Cow;

use crate::ast::{Constraint, Index, Sequence};
use crate::reserved::is_reserved;

/// Decides when an identifier needs quoting and renders qualified names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierPreparer {
    quote_char: char,
    max_identifier_length: usize,
}

impl Default for IdentifierPreparer {
    fn default() -> Self {
        Self::new('"', 128)
    }
}

fn illegal_initial(c: char) -> bool {
    c.is_ascii_digit() || c == '_' || c == '$'
}

// Unquoted DB2 names fold to upper case; the lower-case spelling is the
// case-insensitive one, so upper-case letters need quotes to survive.
fn legal_character(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$'
}

impl IdentifierPreparer {
    pub fn new(quote_char: char, max_identifier_length: usize) -> Self {
        Self {
            quote_char,
            max_identifier_length,
        }
    }

    pub fn quote_char(&self) -> char {
        self.quote_char
    }

    pub fn max_identifier_length(&self) -> usize {
        self.max_identifier_length
    }

    /// Whether `value` must be quoted to be read back verbatim.
    pub fn requires_quotes(&self, value: &str) -> bool {
        is_reserved(value)
            || value.chars().next().is_some_and(illegal_initial)
            || !value.chars().all(legal_character)
    }

    /// Quote unconditionally, doubling embedded quote characters.
    pub fn quote_identifier(&self, value: &str) -> String {
        let q = self.quote_char;
        let escaped = value.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }

    /// Quote only when [`requires_quotes`](Self::requires_quotes) says so.
    pub fn quote<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if self.requires_quotes(value) {
            Cow::Owned(self.quote_identifier(value))
        } else {
            Cow::Borrowed(value)
        }
    }

    pub fn format_column(&self, name: &str) -> String {
        self.quote(name).into_owned()
    }

    /// `schema.table`, each part quoted as needed.
    pub fn format_table(&self, name: &str, schema: Option<&str>) -> String {
        match schema {
            Some(s) => format!("{}.{}", self.quote(s), self.quote(name)),
            None => self.quote(name).into_owned(),
        }
    }

    pub fn format_sequence(&self, seq: &Sequence) -> String {
        self.format_table(&seq.name, seq.schema.as_deref())
    }

    /// Constraint name, or an empty string for an unnamed constraint.
    pub fn format_constraint(&self, constraint: &Constraint) -> String {
        constraint
            .name
            .as_deref()
            .map(|n| self.quote(&self.truncate_identifier(n)).into_owned())
            .unwrap_or_default()
    }

    pub fn format_index(&self, index: &Index) -> String {
        let name = self.truncate_identifier(&index.name);
        match &index.schema {
            Some(s) => format!("{}.{}", self.quote(s), self.quote(&name)),
            None => self.quote(&name).into_owned(),
        }
    }

    /// Shorten a generated name to the identifier limit. Truncated names end
    /// in `_` plus four hex digits of a hash of the full name, so distinct
    /// long names stay distinct. The result never exceeds the limit, even
    /// when the limit is shorter than the suffix.
    pub fn truncate_identifier<'a>(&self, name: &'a str) -> Cow<'a, str> {
        let max = self.max_identifier_length;
        if name.chars().count() <= max {
            return Cow::Borrowed(name);
        }
        let suffix = format!("_{:04x}", fnv1a(name.as_bytes()) & 0xffff);
        if max < suffix.len() {
            return Cow::Owned(suffix[suffix.len() - max..].to_string());
        }
        let keep: String = name.chars().take(max.saturating_sub(8)).collect();
        Cow::Owned(keep + &suffix)
    }

    /// Catalog spelling → case-insensitive lowercase, when that round-trips.
    pub fn normalize_name(&self, name: &str) -> String {
        let name = name.trim_end();
        let lower = name.to_lowercase();
        if name.to_uppercase() == name && !self.requires_quotes(&lower) {
            lower
        } else {
            name.to_string()
        }
    }

    /// Inverse of [`normalize_name`](Self::normalize_name).
    pub fn denormalize_name(&self, name: &str) -> String {
        if name.to_lowercase() == name && !self.requires_quotes(name) {
            name.to_uppercase()
        } else {
            name.to_string()
        }
    }
}

fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5u32, |h, b| {
        (h ^ u32::from(*b)).wrapping_mul(0x0100_0193)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reserved::RESERVED_WORDS;

    #[test]
    fn test_reserved_words_require_quotes() {
        let p = IdentifierPreparer::default();
        for word in RESERVED_WORDS {
            assert!(p.requires_quotes(word), "{word}");
        }
    }

    #[test]
    fn test_illegal_initial_characters() {
        let p = IdentifierPreparer::default();
        for ident in ["1abc", "9", "_tmp", "$x", "0select"] {
            assert!(p.requires_quotes(ident), "{ident}");
        }
    }

    #[test]
    fn test_character_class() {
        let p = IdentifierPreparer::default();
        assert!(!p.requires_quotes("customer"));
        assert!(!p.requires_quotes("order_items2"));
        assert!(!p.requires_quotes("cost$"));
        assert!(p.requires_quotes("my-table"));
        assert!(p.requires_quotes("has space"));
        assert!(p.requires_quotes("MixedCase"));
    }

    #[test]
    fn test_quote() {
        let p = IdentifierPreparer::default();
        assert_eq!(p.quote("users"), "users");
        assert_eq!(p.quote("select"), "\"select\"");
        assert_eq!(p.quote("a\"b"), "\"a\"\"b\"");
        assert_eq!(p.format_table("order", Some("sales")), "sales.\"order\"");
    }

    #[test]
    fn test_normalize_roundtrip() {
        let p = IdentifierPreparer::default();
        assert_eq!(p.normalize_name("CUSTOMER"), "customer");
        assert_eq!(p.normalize_name("CUSTOMER  "), "customer");
        assert_eq!(p.normalize_name("MixedCase"), "MixedCase");
        assert_eq!(p.normalize_name("SELECT"), "SELECT");
        assert_eq!(p.denormalize_name("customer"), "CUSTOMER");
        assert_eq!(p.denormalize_name("MixedCase"), "MixedCase");
        assert_eq!(p.denormalize_name("select"), "select");
    }

    #[test]
    fn test_truncate_identifier() {
        let p = IdentifierPreparer::new('"', 16);
        assert_eq!(p.truncate_identifier("ix_short"), "ix_short");
        let long = "ix_customer_orders_by_date";
        let cut = p.truncate_identifier(long);
        assert_eq!(cut.len(), 13);
        assert!(cut.starts_with("ix_custo_"));
        assert_ne!(cut, p.truncate_identifier("ix_customer_orders_by_name"));
    }

    #[test]
    fn test_truncate_respects_short_limits() {
        for max in 1..8 {
            let p = IdentifierPreparer::new('"', max);
            let cut = p.truncate_identifier("abcdefghij");
            assert!(cut.len() <= max, "limit {max}: {cut}");
        }
        assert_eq!(IdentifierPreparer::new('"', 6).truncate_identifier("abcdefghij").len(), 5);
    }
}
