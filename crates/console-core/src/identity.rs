//! Process-local identities for draft sub-entities.
//!
//! Identities let the editor address a step, tool, part or URL independently
//! of its position in a list. They are minted fresh for every entity (including
//! everything loaded from a generation response) and never reused.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! draft_identity {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Mints a new identity.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
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
}

draft_identity!(
    /// Identity of a tool, part or reference URL.
    EntityId
);

draft_identity!(
    /// Identity of a step. Step numbers are derived from position; this is
    /// what tools and parts actually point at.
    StepId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identities_are_unique() {
        let ids: HashSet<EntityId> = (0..100).map(|_| EntityId::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_display_matches_uuid() {
        let id = StepId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }
}
