use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LibrisError;

/// The fixed set of shelves a book can be filed under.
///
/// Variant order is the display order: grouping and the CLI choice list
/// both follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Islamiat,
    Poetry,
    Grammar,
    Coding,
    #[serde(rename = "Software Engineering")]
    SoftwareEngineering,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Islamiat,
        Self::Poetry,
        Self::Grammar,
        Self::Coding,
        Self::SoftwareEngineering,
    ];

    /// Where books with an unrecognized category string are grouped.
    pub const FALLBACK: Category = Self::SoftwareEngineering;

    /// Canonical name, as stored in the library file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Islamiat => "Islamiat",
            Self::Poetry => "Poetry",
            Self::Grammar => "Grammar",
            Self::Coding => "Coding",
            Self::SoftwareEngineering => "Software Engineering",
        }
    }

    /// Exact match on the canonical name. Stored data is never parsed leniently.
    pub fn from_canonical(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == raw)
    }

    /// Resolve a stored category string, falling back to [`Category::FALLBACK`].
    pub fn from_stored(raw: &str) -> Self {
        Self::from_canonical(raw).unwrap_or(Self::FALLBACK)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = LibrisError;

    /// Case-insensitive; `software-engineering` and `software_engineering`
    /// are accepted alongside the display name. Meant for user input only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                LibrisError::Validation(format!(
                    "unknown category '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_parse_is_lenient() {
        assert_eq!("poetry".parse::<Category>().unwrap(), Category::Poetry);
        assert_eq!(
            "software-engineering".parse::<Category>().unwrap(),
            Category::SoftwareEngineering
        );
        assert_eq!(
            " SOFTWARE_ENGINEERING ".parse::<Category>().unwrap(),
            Category::SoftwareEngineering
        );
    }

    #[test]
    fn test_parse_unknown() {
        let err = "Cooking".parse::<Category>().unwrap_err();
        assert!(matches!(err, LibrisError::Validation(_)));
        assert!(err.to_string().contains("Islamiat"));
    }

    #[test]
    fn test_from_stored_falls_back() {
        assert_eq!(Category::from_stored("Grammar"), Category::Grammar);
        assert_eq!(Category::from_stored("History"), Category::SoftwareEngineering);
        assert_eq!(Category::from_stored(""), Category::FALLBACK);
    }

    #[test]
    fn test_from_stored_is_exact() {
        assert_eq!(Category::from_stored("poetry"), Category::FALLBACK);
        assert_eq!(Category::from_stored("Poetry "), Category::FALLBACK);
        assert_eq!(Category::from_stored("software_engineering"), Category::FALLBACK);
        assert_eq!(Category::from_canonical("poetry"), None);
        assert_eq!(Category::from_canonical("Poetry"), Some(Category::Poetry));
    }

    #[test]
    fn test_order_follows_enumeration() {
        let mut shuffled = vec![
            Category::Coding,
            Category::Islamiat,
            Category::SoftwareEngineering,
        ];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Category::Islamiat, Category::Coding, Category::SoftwareEngineering]
        );
    }

    #[test]
    fn test_serde_uses_display_name() {
        let json = serde_json::to_string(&Category::SoftwareEngineering).unwrap();
        assert_eq!(json, "\"Software Engineering\"");
    }
}
