use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::store::Id;
use crate::model::voter::Dni;

/// Core vote record data, as stored in the votes collection.
///
/// Names are denormalised from the election/party/candidate at cast time so
/// historical records survive later edits and deletions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotCore {
    /// The voter who cast this ballot.
    pub voter: Dni,
    /// The election voted in.
    pub election_id: Id,
    pub election_name: String,
    /// One selection per ballot category.
    pub selections: Vec<Selection>,
    pub status: BallotStatus,
    /// When the ballot was cast.
    pub cast_at: DateTime<Utc>,
    /// When the record was created. Matches `cast_at` for records created by
    /// this implementation; imported data may differ.
    pub created_at: DateTime<Utc>,
}

/// A single per-category selection within a ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub category_id: u32,
    pub category_name: String,
    pub party_id: Id,
    pub party_name: String,
    pub candidate_id: u32,
    pub candidate_name: String,
}

/// States in the vote record lifecycle. Records are only ever written in the
/// cast state; the field exists so the stored shape stays explicit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallotStatus {
    Cast,
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use chrono::TimeZone;

    use super::*;

    impl BallotCore {
        pub fn example(dni: &str, election_id: Id, election_name: &str) -> Self {
            let cast_at = Utc.with_ymd_and_hms(2025, 5, 20, 15, 30, 0).unwrap();
            Self {
                voter: dni.parse().unwrap(),
                election_id,
                election_name: election_name.to_string(),
                selections: Vec::new(),
                status: BallotStatus::Cast,
                cast_at,
                created_at: cast_at,
            }
        }

        pub fn with_selection(mut self, category_id: u32, party_id: Id, party_name: &str) -> Self {
            self.selections.push(Selection {
                category_id,
                category_name: format!("Categoría {category_id}"),
                party_id,
                party_name: party_name.to_string(),
                candidate_id: 1,
                candidate_name: format!("Candidato de {party_name}"),
            });
            self
        }
    }
}
