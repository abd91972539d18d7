use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Canonical identifiers are cut to this many characters.
pub const IDENTIFIER_WIDTH: usize = 10;

static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-,\s]+").expect("separator pattern is valid"));

/// Region-specific repair applied after generic cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentifierTransform {
    /// Left-pad with zeros (state dropped leading zeros).
    ZeroPad { width: usize },
    /// Prepend the region code (state omitted it).
    Prefix { code: String },
}

impl IdentifierTransform {
    pub fn apply(&self, identifier: &str) -> String {
        match self {
            IdentifierTransform::ZeroPad { width } => {
                format!("{:0>width$}", identifier, width = *width)
            }
            IdentifierTransform::Prefix { code } => format!("{}{}", code, identifier),
        }
    }
}

pub fn strip_separators(raw: &str) -> String {
    SEPARATORS.replace_all(raw.trim(), "").to_string()
}

/// Strips separators and truncates to [`IDENTIFIER_WIDTH`]. Empty results
/// are treated as missing.
pub fn clean_identifier(raw: &str) -> Option<String> {
    let stripped = strip_separators(raw);
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.chars().take(IDENTIFIER_WIDTH).collect())
}

pub fn is_all_zeros(identifier: &str) -> bool {
    !identifier.is_empty() && identifier.chars().all(|c| c == '0')
}

/// Drops a fixed number of characters from each end, then separators.
pub fn trim_fixed_width(raw: &str, prefix: usize, suffix: usize) -> Option<String> {
    let chars: Vec<char> = raw.trim().chars().collect();
    if chars.len() <= prefix + suffix {
        return None;
    }
    let middle: String = chars[prefix..chars.len() - suffix].iter().collect();
    let stripped = strip_separators(&middle);
    if stripped.is_empty() { None } else { Some(stripped) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_identifier() {
        assert_eq!(clean_identifier("42-001-12345").as_deref(), Some("4200112345"));
        assert_eq!(clean_identifier(" 34,005,20001 ").as_deref(), Some("3400520001"));
        assert_eq!(
            clean_identifier("42-001-12345-00-00").as_deref(),
            Some("4200112345")
        );
        assert_eq!(clean_identifier(" - "), None);
    }

    #[test]
    fn test_transforms() {
        let pad = IdentifierTransform::ZeroPad { width: 10 };
        assert_eq!(pad.apply("403012345"), "0403012345");
        assert_eq!(pad.apply("0403012345"), "0403012345");

        let prefix = IdentifierTransform::Prefix { code: "490".to_string() };
        assert_eq!(prefix.apply("1234567"), "4901234567");
    }

    #[test]
    fn test_trim_fixed_width() {
        assert_eq!(
            trim_fixed_width("US: 42-001-12345 -00", 4, 4).as_deref(),
            Some("4200112345")
        );
        assert_eq!(trim_fixed_width("short", 4, 4), None);
    }

    #[test]
    fn test_all_zeros() {
        assert!(is_all_zeros("0000000000"));
        assert!(!is_all_zeros("0000000001"));
        assert!(!is_all_zeros(""));
    }
}
