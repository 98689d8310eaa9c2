//! Record identifiers
//!
//! All identifiers are UUID newtypes. Parsing is strict; callers that treat a
//! malformed identifier as "not found" do so by discarding the parse error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse an identifier from a string
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Unique user identifier, supplied by the identity collaborator
    UserId
);

uuid_id!(
    /// Unique subscription identifier
    SubscriptionId
);

uuid_id!(
    /// Unique delivery identifier
    DeliveryId
);

uuid_id!(
    /// Identifier of the order a delivery fulfils
    OrderId
);

uuid_id!(
    /// Identifier of the courier carrying a delivery
    DeliveryPersonId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_surrounding_whitespace() {
        let id = UserId::new();
        let parsed = UserId::parse(&format!("  {id} ")).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(SubscriptionId::parse("not-a-uuid").is_err());
        assert!(DeliveryId::parse("").is_err());
        assert!("64f1c2a9e4b0a1b2c3d4e5f6".parse::<OrderId>().is_err());
    }

    #[test]
    fn serializes_transparently() {
        let id = DeliveryId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
