//! Strongly-typed identifiers.
//!
//! All IDs are validated non-empty at construction time and implement common traits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed ID newtype wrapper.
///
/// Generates: struct, `from_string()`, `as_str()`, Display, Serialize, Deserialize.
/// Optionally generates `new()` (UUID v4) and `Default` if `uuid` flag is passed.
macro_rules! define_id {
    ($name:ident, uuid) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(PredictionId, uuid);
define_id!(PredictorTag);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_ids_rejected() {
        assert!(PredictionId::from_string(String::new()).is_err());
        assert!(PredictorTag::from_string(String::new()).is_err());
    }

    #[test]
    fn test_generated_prediction_ids_are_unique() {
        assert_ne!(PredictionId::new(), PredictionId::new());
    }

    #[test]
    fn test_tag_displays_verbatim() {
        let tag = PredictorTag::from_string("@fxn/greeting".to_string()).unwrap();
        assert_eq!(tag.to_string(), "@fxn/greeting");
        assert_eq!(tag.as_str(), "@fxn/greeting");
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let tag = PredictorTag::from_string("@a/b".to_string()).unwrap();
        assert_eq!(serde_json::to_value(&tag).unwrap(), serde_json::json!("@a/b"));
    }
}
