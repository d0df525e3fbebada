use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::store::Id;

use super::election_core::ElectionCore;

/// An election from the store, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use crate::model::election::ElectionSpec;

    use super::*;

    impl Election {
        pub fn active_example() -> Self {
            Self {
                id: Id::new(1),
                election: ElectionSpec::active_example().into(),
            }
        }

        pub fn upcoming_example() -> Self {
            Self {
                id: Id::new(2),
                election: ElectionSpec::upcoming_example().into(),
            }
        }
    }
}
