use serde::{Deserialize, Serialize};

use crate::model::store::Id;

/// Core party data, as stored in the parties collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyCore {
    /// Party display name.
    pub name: String,
    /// Optional logo reference (a path or URL, never dereferenced here).
    pub logo: Option<String>,
    /// Optional display color, `#rrggbb`. Absent parties get a deterministic
    /// fallback from the statistics palette.
    pub color: Option<String>,
    /// The election this party runs in.
    pub election_id: Id,
    /// The ballot category this party runs in.
    pub category_id: u32,
    /// Candidates fielded by this party, in display order.
    pub candidates: Vec<Candidate>,
}

impl PartyCore {
    /// Look up a candidate by id.
    pub fn candidate(&self, id: u32) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| candidate.id == id)
    }
}

/// A candidate fielded by a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate id, unique within its party.
    pub id: u32,
    /// Candidate display name.
    pub name: String,
}

/// A party specification, as submitted by the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartySpec {
    pub name: String,
    pub logo: Option<String>,
    pub color: Option<String>,
    pub election_id: Id,
    pub category_id: u32,
    /// Candidate names, in display order.
    pub candidates: Vec<String>,
}

impl PartySpec {
    /// Reject a blank name or a malformed display color.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Party name must not be empty".to_string());
        }
        if let Some(color) = &self.color {
            if !is_hex_color(color) {
                return Err(format!("Malformed party color: {color}"));
            }
        }
        Ok(())
    }
}

impl From<PartySpec> for PartyCore {
    fn from(spec: PartySpec) -> Self {
        // Candidate ids are local to the party, allocated in display order.
        let candidates = spec
            .candidates
            .into_iter()
            .enumerate()
            .map(|(index, name)| Candidate {
                id: index as u32 + 1,
                name,
            })
            .collect();
        Self {
            name: spec.name,
            logo: spec.logo,
            color: spec.color,
            election_id: spec.election_id,
            category_id: spec.category_id,
            candidates,
        }
    }
}

/// `#rrggbb`, case-insensitive.
fn is_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl PartySpec {
        pub fn example(election_id: Id, name: &str, color: Option<&str>) -> Self {
            Self {
                name: name.to_string(),
                logo: None,
                color: color.map(str::to_string),
                election_id,
                category_id: 1,
                candidates: vec![format!("Candidato de {name}")],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_validation() {
        let election = Id::new(1);
        assert!(PartySpec::example(election, "Partido Morado", Some("#8B5CF6"))
            .validate()
            .is_ok());
        assert!(PartySpec::example(election, "Partido Morado", None)
            .validate()
            .is_ok());
        for bad in ["8B5CF6", "#8B5CF", "#8B5CFG", "#8B5CF6FF"] {
            assert!(
                PartySpec::example(election, "Partido Morado", Some(bad))
                    .validate()
                    .is_err(),
                "{bad} should be rejected"
            );
        }
    }
}
