//! Escaping of values interpolated into search filters and DNs
//!
//! Every escaped byte becomes a backslash followed by two lowercase hex
//! digits, which is valid both in RFC 4515 filters and RFC 4514 DNs.

use std::fmt::Write;
use std::ops::BitOr;

/// Which escape table(s) to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EscapeFlags {
    filter: bool,
    dn: bool,
}

impl EscapeFlags {
    /// Hex-escape every byte
    pub const NONE: EscapeFlags = EscapeFlags {
        filter: false,
        dn: false,
    };

    /// Escape filter metacharacters
    pub const FILTER: EscapeFlags = EscapeFlags {
        filter: true,
        dn: false,
    };

    /// Escape DN metacharacters and a leading/trailing space
    pub const DN: EscapeFlags = EscapeFlags {
        filter: false,
        dn: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.filter && !self.dn
    }
}

impl BitOr for EscapeFlags {
    type Output = EscapeFlags;

    fn bitor(self, rhs: EscapeFlags) -> EscapeFlags {
        EscapeFlags {
            filter: self.filter || rhs.filter,
            dn: self.dn || rhs.dn,
        }
    }
}

const FILTER_CHARS: &[char] = &['\\', '*', '(', ')', '\0'];

const DN_CHARS: &[char] = &['\\', ',', '=', '+', '<', '>', ';', '"', '#'];

/// Escape `value` for interpolation into a filter and/or a DN.
///
/// Characters listed in `ignore` are copied verbatim. With no flags set every
/// byte is escaped. In DN mode a single leading and a single trailing space
/// are escaped even when listed in `ignore`.
pub fn escape(value: &str, ignore: &str, flags: EscapeFlags) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    let last = value.chars().count().saturating_sub(1);

    for (i, c) in value.chars().enumerate() {
        let edge_space = flags.dn && c == ' ' && (i == 0 || i == last);

        if edge_space || (!ignore.contains(c) && needs_escape(c, flags)) {
            push_hex(&mut out, c);
        } else {
            out.push(c);
        }
    }

    out
}

/// Escape a value for an equality assertion inside a search filter
pub fn escape_filter(value: &str) -> String {
    ldap3::ldap_escape(value).into_owned()
}

/// Escape a value for use as an attribute value inside a DN
pub fn escape_dn(value: &str) -> String {
    escape(value, "", EscapeFlags::DN)
}

/// Reverse `\xx` escapes.
///
/// Returns `None` for a truncated or non-hex escape, or when the decoded
/// bytes are not UTF-8.
pub fn unescape(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let hex = value.get(i + 1..i + 3)?;
            if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}

fn needs_escape(c: char, flags: EscapeFlags) -> bool {
    if flags.is_empty() {
        return true;
    }

    (flags.filter && FILTER_CHARS.contains(&c)) || (flags.dn && DN_CHARS.contains(&c))
}

fn push_hex(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    for b in c.encode_utf8(&mut buf).bytes() {
        // Writing to a String cannot fail
        let _ = write!(out, "\\{:02x}", b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_escape_table() {
        let table = [
            ('\\', "\\5c"),
            ('*', "\\2a"),
            ('(', "\\28"),
            (')', "\\29"),
            ('\0', "\\00"),
        ];

        for (c, expected) in table {
            assert_eq!(escape_filter(&c.to_string()), expected, "escaping {:?}", c);
            let wrapped = format!("a{}b", c);
            assert_eq!(escape_filter(&wrapped), format!("a{}b", expected));
        }
    }

    #[test]
    fn test_filter_leaves_dn_chars() {
        assert_eq!(escape_filter("a,b=c+d<e>f;g\"h#i j"), "a,b=c+d<e>f;g\"h#i j");
    }

    #[test]
    fn test_filter_injection() {
        assert_eq!(
            escape_filter("*)(uid=*))(|(uid=*"),
            "\\2a\\29\\28uid=\\2a\\29\\29\\28|\\28uid=\\2a"
        );
    }

    #[test]
    fn test_dn_escape_table() {
        let table = [
            ('\\', "\\5c"),
            (',', "\\2c"),
            ('=', "\\3d"),
            ('+', "\\2b"),
            ('<', "\\3c"),
            ('>', "\\3e"),
            (';', "\\3b"),
            ('"', "\\22"),
            ('#', "\\23"),
        ];

        for (c, expected) in table {
            let wrapped = format!("a{}b", c);
            assert_eq!(escape_dn(&wrapped), format!("a{}b", expected), "escaping {:?}", c);
        }
    }

    #[test]
    fn test_dn_leaves_filter_chars() {
        assert_eq!(escape_dn("a*(b)"), "a*(b)");
    }

    #[test]
    fn test_dn_edge_spaces() {
        assert_eq!(escape_dn(" a b "), "\\20a b\\20");
        assert_eq!(escape_dn("a b"), "a b");
        assert_eq!(escape_dn(" "), "\\20");
        // Only a single leading space is escaped
        assert_eq!(escape_dn("  a"), "\\20 a");
    }

    #[test]
    fn test_filter_mode_keeps_edge_spaces() {
        assert_eq!(escape_filter(" a "), " a ");
    }

    #[test]
    fn test_combined_flags() {
        let flags = EscapeFlags::FILTER | EscapeFlags::DN;
        assert!(!flags.is_empty());
        assert_eq!(escape("*,", "", flags), "\\2a\\2c");
    }

    #[test]
    fn test_filter_mode_matches_filter_escape() {
        let samples = ["a*b(c)\\d\0e", "é(x)", " sp ", "plain", "*)(uid=*))(|(uid=*"];

        for sample in samples {
            assert_eq!(escape(sample, "", EscapeFlags::FILTER), escape_filter(sample));
        }
    }

    #[test]
    fn test_no_flags_escapes_everything() {
        assert_eq!(escape("ab", "", EscapeFlags::NONE), "\\61\\62");
        assert_eq!(escape("é", "", EscapeFlags::NONE), "\\c3\\a9");
        assert_eq!(escape("abc", "b", EscapeFlags::NONE), "\\61b\\63");
    }

    #[test]
    fn test_ignore_set() {
        assert_eq!(escape("a*b(c)", "*", EscapeFlags::FILTER), "a*b\\28c\\29");
        assert_eq!(escape(" a,b ", " ,", EscapeFlags::DN), "\\20a,b\\20");
    }

    #[test]
    fn test_unescape_round_trip() {
        let samples = ["plain", "*)(uid=*", "back\\slash", " edge ", "nul\0byte", "ünïcødé,#"];
        let modes = [
            EscapeFlags::NONE,
            EscapeFlags::FILTER,
            EscapeFlags::DN,
            EscapeFlags::FILTER | EscapeFlags::DN,
        ];

        for sample in samples {
            for flags in modes {
                let escaped = escape(sample, "", flags);
                assert_eq!(unescape(&escaped).as_deref(), Some(sample));
            }
        }
    }

    #[test]
    fn test_unescape_malformed() {
        assert_eq!(unescape("abc\\2"), None);
        assert_eq!(unescape("abc\\zz"), None);
        assert_eq!(unescape("\\ff"), None);
    }
}
