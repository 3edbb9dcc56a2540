use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Number of random bytes behind every assigned name.
pub const NAME_BYTES: usize = 16;

/// Length of the hex-encoded assigned name.
pub const NAME_LEN: usize = NAME_BYTES * 2;

/// Store-generated identifier for a blob.
///
/// An `AssignedName` is 16 random bytes from the thread-local CSPRNG, encoded
/// as 32 lowercase hex characters. It is never derived from anything the
/// uploader supplied, so it can be used directly as a file name inside the
/// blob and thumbnail namespaces: the alphabet has no separators, dots, or
/// other characters that could escape a directory.
///
/// Names coming back from the outside world (request paths, metadata
/// records) must go through [`AssignedName::parse`], which enforces the same
/// shape.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssignedName(String);

impl AssignedName {
    /// Generate a fresh random name.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NAME_BYTES];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(hex::encode(bytes))
    }

    /// Parse and validate an externally supplied name.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.len() != NAME_LEN {
            return Err(TypeError::InvalidName {
                name: s.to_string(),
                reason: format!("expected {NAME_LEN} characters, got {}", s.len()),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TypeError::InvalidName {
                name: s.to_string(),
                reason: "must be lowercase hexadecimal".into(),
            });
        }
        Ok(Self(s.to_string()))
    }

    /// The name as a string slice, suitable as a file name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 8 characters) for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl FromStr for AssignedName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AssignedName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssignedName> for String {
    fn from(name: AssignedName) -> Self {
        name.0
    }
}

impl AsRef<str> for AssignedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AssignedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssignedName({})", self.0)
    }
}

impl fmt::Display for AssignedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn generated_names_are_well_formed() {
        let name = AssignedName::generate();
        assert_eq!(name.as_str().len(), NAME_LEN);
        assert_eq!(AssignedName::parse(name.as_str()).unwrap(), name);
    }

    #[test]
    fn generated_names_are_distinct() {
        let names: HashSet<_> = (0..1000).map(|_| AssignedName::generate()).collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn parse_rejects_traversal() {
        assert!(AssignedName::parse("../../etc/passwd").is_err());
        assert!(AssignedName::parse("..%2f..%2f0123456789abcdef01234567").is_err());
    }

    #[test]
    fn parse_rejects_uppercase() {
        let upper = "0123456789ABCDEF0123456789ABCDEF";
        let err = AssignedName::parse(upper).unwrap_err();
        assert!(matches!(err, TypeError::InvalidName { .. }));
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(AssignedName::parse("").is_err());
        assert!(AssignedName::parse("abc").is_err());
        assert!(AssignedName::parse(&"a".repeat(NAME_LEN + 1)).is_err());
    }

    #[test]
    fn short_is_prefix() {
        let name = AssignedName::parse("deadbeef00112233445566778899aabb").unwrap();
        assert_eq!(name.short(), "deadbeef");
        assert_eq!(name.to_string(), "deadbeef00112233445566778899aabb");
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let name = AssignedName::generate();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, format!("\"{}\"", name.as_str()));
        let back: AssignedName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);

        let bad: Result<AssignedName, _> = serde_json::from_str("\"photo.png\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn any_hex_of_right_length_parses(s in "[0-9a-f]{32}") {
            let parsed = AssignedName::parse(&s).unwrap();
            prop_assert_eq!(parsed.as_str(), s.as_str());
        }

        #[test]
        fn names_with_separators_never_parse(s in "[0-9a-f]{0,15}[/\\\\.][0-9a-f]{0,16}") {
            prop_assert!(AssignedName::parse(&s).is_err());
        }
    }
}
