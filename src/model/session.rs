use serde::{Deserialize, Serialize};

use crate::model::store::Id;
use crate::model::voter::{Dni, Role, VoterCore};

/// The session singleton document: who is signed in, and which election they
/// selected for casting. The selector screen writes `selected_election`; the
/// casting flow reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub dni: Dni,
    pub display_name: String,
    pub role: Role,
    pub selected_election: Option<Id>,
}

impl Session {
    /// Start a session for the given voter, with nothing selected yet.
    pub fn for_voter(voter: &VoterCore) -> Self {
        Self {
            dni: voter.dni.clone(),
            display_name: format!("{} {}", voter.first_names, voter.last_names),
            role: voter.role,
            selected_election: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
