//! Attribute keys: the closed vocabulary modifiers target.
//!
//! A key names one derived stat (`"ac"`, `"strength"`, `"speed-fly"`,
//! `"stealth-proficiency"`, `"weapon-damage"`). The engine never
//! interprets a key beyond matching it against a query.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Key naming a derived stat that modifiers can target.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeKey(pub String);

impl AttributeKey {
    /// Create a new attribute key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AttributeKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AttributeKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The key set of a modifier or a query. Most modifiers target one or two keys.
pub type AttributeKeys = SmallVec<[AttributeKey; 2]>;

/// Build a key set from anything string-like.
///
/// ```
/// use sheet_effects::core::attributes::keys;
///
/// let k = keys(["ac", "ac-bonus"]);
/// assert_eq!(k.len(), 2);
/// ```
pub fn keys<I, S>(items: I) -> AttributeKeys
where
    I: IntoIterator<Item = S>,
    S: Into<AttributeKey>,
{
    items.into_iter().map(Into::into).collect()
}

/// Check whether two key sets share at least one key.
#[must_use]
pub fn intersects(left: &[AttributeKey], right: &[AttributeKey]) -> bool {
    left.iter().any(|key| right.contains(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_key() {
        let key1 = AttributeKey::new("strength");
        let key2: AttributeKey = "strength".into();
        assert_eq!(key1, key2);
        assert_eq!(key1.as_str(), "strength");
    }

    #[test]
    fn test_intersects() {
        let a = keys(["ac", "initiative"]);
        let b = keys(["initiative"]);
        let c = keys(["speed-walk"]);

        assert!(intersects(&a, &b));
        assert!(!intersects(&a, &c));
        assert!(!intersects(&a, &[]));
    }

    #[test]
    fn test_transparent_serialization() {
        let key = AttributeKey::new("speed-fly");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"speed-fly\"");
    }
}
