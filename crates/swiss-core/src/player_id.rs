//! Player identity and deterministic ID generation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when generating a player ID.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerIdError {
    #[error("cannot derive an ID from an empty {0} name")]
    EmptyName(&'static str),

    #[error("all ordinals for prefix {0} are taken")]
    Exhausted(String),
}

/// Opaque player identifier, shared by the career record and every
/// tournament participation of the same person.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    const FAMILY_LETTERS: usize = 3;
    const GIVEN_LETTERS: usize = 2;
    const MAX_ORDINAL: u32 = 999;

    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives a fresh ID from a name.
    ///
    /// The ID is the first three letters of the family name and the first two
    /// of the given name, uppercased and right-padded with `X`, followed by a
    /// three-digit ordinal starting at `001`. The ordinal increments until
    /// `is_taken` reports the candidate as free.
    ///
    /// # Errors
    ///
    /// Returns [`PlayerIdError::EmptyName`] if either name is blank and
    /// [`PlayerIdError::Exhausted`] if ordinals `001..=999` are all taken.
    ///
    /// # Example
    ///
    /// ```
    /// use swiss_core::PlayerId;
    ///
    /// let id = PlayerId::generate("Carlsen", "Magnus", |_| false).unwrap();
    /// assert_eq!(id.as_str(), "CARMA001");
    /// ```
    pub fn generate(
        family_name: &str,
        given_name: &str,
        is_taken: impl Fn(&PlayerId) -> bool,
    ) -> Result<Self, PlayerIdError> {
        if family_name.trim().is_empty() {
            return Err(PlayerIdError::EmptyName("family"));
        }
        if given_name.trim().is_empty() {
            return Err(PlayerIdError::EmptyName("given"));
        }

        let prefix = format!(
            "{}{}",
            letters(family_name, Self::FAMILY_LETTERS),
            letters(given_name, Self::GIVEN_LETTERS)
        );

        (1..=Self::MAX_ORDINAL)
            .map(|ordinal| PlayerId(format!("{}{:03}", prefix, ordinal)))
            .find(|candidate| !is_taken(candidate))
            .ok_or(PlayerIdError::Exhausted(prefix))
    }
}

/// Takes the first `count` letters of `name`, uppercased, padded with `X`.
fn letters(name: &str, count: usize) -> String {
    let mut out: String = name
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .take(count)
        .collect();
    while out.chars().count() < count {
        out.push('X');
    }
    out
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        PlayerId(id.to_string())
    }
}

impl AsRef<str> for PlayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generate_basic_id() {
        let id = PlayerId::generate("Carlsen", "Magnus", |_| false).unwrap();
        assert_eq!(id.as_str(), "CARMA001");
    }

    #[test]
    fn short_names_are_padded_with_x() {
        let id = PlayerId::generate("Li", "A", |_| false).unwrap();
        assert_eq!(id.as_str(), "LIXAX001");
    }

    #[test]
    fn non_letters_are_skipped() {
        let id = PlayerId::generate("O'Neil", "J.-P.", |_| false).unwrap();
        assert_eq!(id.as_str(), "ONEJP001");
    }

    #[test]
    fn ordinal_increments_until_unique() {
        let taken: HashSet<PlayerId> = ["DUPJE001", "DUPJE002"]
            .iter()
            .map(|s| PlayerId::from(*s))
            .collect();
        let id = PlayerId::generate("Dupont", "Jean", |c| taken.contains(c)).unwrap();
        assert_eq!(id.as_str(), "DUPJE003");
    }

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(
            PlayerId::generate("  ", "Jean", |_| false),
            Err(PlayerIdError::EmptyName("family"))
        );
        assert_eq!(
            PlayerId::generate("Dupont", "", |_| false),
            Err(PlayerIdError::EmptyName("given"))
        );
    }

    #[test]
    fn exhausted_ordinals() {
        let result = PlayerId::generate("Dupont", "Jean", |_| true);
        assert_eq!(result, Err(PlayerIdError::Exhausted("DUPJE".to_string())));
    }

    #[test]
    fn serializes_transparently() {
        let id = PlayerId::from("CARMA001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"CARMA001\"");
    }
}
