use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifiers are opaque strings assigned by whoever creates the row. The
/// store never generates them; `new()` exists for callers that need a fresh
/// one (cloning, tests).
macro_rules! string_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(format!("{}{}", $prefix, Uuid::now_v7().simple()))
            }

            /// The empty id, meaning "none" (e.g. no parent).
            pub fn empty() -> Self {
                Self(String::new())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(BlockId, "a");
string_id!(BoardId, "b");
string_id!(TeamId, "t");
string_id!(UserId, "u");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = BlockId::new();
        let b = BlockId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with('a'));
        assert!(BoardId::new().as_str().starts_with('b'));
        assert_eq!(a.as_str().len(), 33);
    }

    #[test]
    fn empty_id_means_none() {
        assert!(BlockId::empty().is_empty());
        assert_eq!(BlockId::default(), BlockId::empty());
        assert!(!BlockId::from("card-1").is_empty());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = BlockId::from("card-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"card-1\"");
        let back: BlockId = serde_json::from_str("\"card-1\"").unwrap();
        assert_eq!(back, id);
    }
}
