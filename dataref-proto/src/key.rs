//! Key parsing: `NAME` and `NAME[INDEX]`.

use core::fmt;

use crate::parser::ParseError;

/// Maximum length of a key name (without index suffix).
pub const MAX_KEY_LEN: usize = 32;

/// A key as it appears on the wire, split into base name and optional index.
///
/// The index is kept signed: `LED[-1]` parses, and rejecting it is up to
/// whoever resolves the key against a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyRef<'a> {
    raw: &'a str,
    name: &'a str,
    index: Option<i32>,
}

impl<'a> KeyRef<'a> {
    /// Parse `NAME` or `NAME[INDEX]`.
    ///
    /// The name's character set is not checked here; unknown names are
    /// a lookup failure, not a syntax error.
    pub fn parse(raw: &'a str) -> Result<Self, ParseError> {
        if raw.is_empty() {
            return Err(ParseError::MissingKey);
        }

        let Some(open) = raw.find('[') else {
            if raw.contains(']') {
                return Err(ParseError::InvalidKey);
            }
            return Ok(Self {
                raw,
                name: raw,
                index: None,
            });
        };

        let name = &raw[..open];
        let inner = raw[open + 1..]
            .strip_suffix(']')
            .ok_or(ParseError::InvalidKey)?;
        if name.is_empty() || inner.contains(['[', ']']) {
            return Err(ParseError::InvalidKey);
        }
        let index = inner
            .trim()
            .parse::<i32>()
            .map_err(|_| ParseError::InvalidIndex)?;

        Ok(Self {
            raw,
            name,
            index: Some(index),
        })
    }

    /// Address a whole entry by name.
    #[must_use]
    pub const fn new(name: &'a str) -> Self {
        Self {
            raw: name,
            name,
            index: None,
        }
    }

    /// Address one element of an array entry.
    ///
    /// [`raw`](Self::raw) of the result is just `name`; use `Display` for
    /// the indexed form. Indices past `i32::MAX` saturate, which is out of
    /// range for every entry.
    #[must_use]
    pub const fn element(name: &'a str, index: usize) -> Self {
        let index = if index > i32::MAX as usize {
            i32::MAX
        } else {
            index as i32
        };
        Self {
            raw: name,
            name,
            index: Some(index),
        }
    }

    /// The key exactly as it appeared on the wire.
    #[inline]
    #[must_use]
    pub const fn raw(&self) -> &'a str {
        self.raw
    }

    /// Base name with any index suffix stripped.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    #[inline]
    #[must_use]
    pub const fn index(&self) -> Option<i32> {
        self.index
    }
}

impl fmt::Display for KeyRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.name, i),
            None => f.write_str(self.name),
        }
    }
}

/// Check that `name` is a valid registry key name: 1 to [`MAX_KEY_LEN`]
/// ASCII letters, digits or underscores.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_KEY_LEN
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_key() {
        let key = KeyRef::parse("GEAR_LED").unwrap();
        assert_eq!(key.name(), "GEAR_LED");
        assert_eq!(key.index(), None);
        assert_eq!(key.raw(), "GEAR_LED");
    }

    #[test]
    fn test_indexed_key() {
        let key = KeyRef::parse("LED_STATE[3]").unwrap();
        assert_eq!(key.name(), "LED_STATE");
        assert_eq!(key.index(), Some(3));
        assert_eq!(key.raw(), "LED_STATE[3]");
    }

    #[test]
    fn test_element_index_saturates() {
        assert_eq!(KeyRef::element("LED", 7).index(), Some(7));
        assert_eq!(KeyRef::element("LED", usize::MAX).index(), Some(i32::MAX));
        assert_eq!(
            KeyRef::element("LED", i32::MAX as usize + 1).index(),
            Some(i32::MAX)
        );
    }

    #[test]
    fn test_negative_index_parses() {
        let key = KeyRef::parse("LED_STATE[-1]").unwrap();
        assert_eq!(key.index(), Some(-1));
    }

    #[test]
    fn test_malformed_keys() {
        assert_eq!(KeyRef::parse(""), Err(ParseError::MissingKey));
        assert_eq!(KeyRef::parse("[3]"), Err(ParseError::InvalidKey));
        assert_eq!(KeyRef::parse("LED[3"), Err(ParseError::InvalidKey));
        assert_eq!(KeyRef::parse("LED]"), Err(ParseError::InvalidKey));
        assert_eq!(KeyRef::parse("LED[[3]]"), Err(ParseError::InvalidKey));
        assert_eq!(KeyRef::parse("LED[x]"), Err(ParseError::InvalidIndex));
        assert_eq!(KeyRef::parse("LED[]"), Err(ParseError::InvalidIndex));
    }

    #[test]
    fn test_display_canonical_form() {
        assert_eq!(format!("{}", KeyRef::element("LED", 2)), "LED[2]");
        assert_eq!(format!("{}", KeyRef::new("LED")), "LED");
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("GEAR_LED"));
        assert!(is_valid_name("enc2"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("BAD KEY"));
        assert!(!is_valid_name("LED[1]"));
        assert!(!is_valid_name("sim/cockpit/gear"));
        assert!(!is_valid_name(&"A".repeat(MAX_KEY_LEN + 1)));
    }
}
