use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::model::{
    election::{Election, ElectionKind, ElectionSpec, ElectionStatus},
    party::{Party, PartySpec},
    store::{Counter, Id, Store, ELECTION_IDS, PARTY_IDS},
    voter::{Role, VoterCore},
};

/// Filters for the election management list. All criteria are conjunctive;
/// an empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct ElectionFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    pub kind: Option<ElectionKind>,
    pub status: Option<ElectionStatus>,
    /// Matches elections whose window contains this day.
    pub open_on: Option<NaiveDate>,
}

impl ElectionFilter {
    pub fn matches(&self, election: &Election) -> bool {
        if let Some(needle) = &self.name_contains {
            if !election
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if election.kind != kind {
                return false;
            }
        }
        if let Some(status) = self.status {
            if election.status != status {
                return false;
            }
        }
        if let Some(day) = self.open_on {
            if day < election.start_date || election.end_date < day {
                return false;
            }
        }
        true
    }
}

/// List elections matching the filter.
pub fn list_elections(store: &Store, filter: &ElectionFilter) -> Result<Vec<Election>> {
    let elections = store.coll::<Election>().read_all()?;
    Ok(elections
        .into_iter()
        .filter(|election| filter.matches(election))
        .collect())
}

/// Create an election from a spec, allocating its id.
pub fn create_election(store: &Store, spec: ElectionSpec) -> Result<Election> {
    spec.validate().map_err(Error::Validation)?;
    let id = Counter::next(store, ELECTION_IDS)?;
    let election = Election {
        id,
        election: spec.into(),
    };
    store.coll::<Election>().modify(|all| {
        all.push(election.clone());
        Ok(())
    })?;
    info!("Created election {} ({})", election.id, election.name);
    Ok(election)
}

/// Replace an election's data, keeping its id.
///
/// Category ids are reallocated; historical vote records are unaffected
/// because selections carry denormalised names.
pub fn modify_election(store: &Store, id: Id, spec: ElectionSpec) -> Result<Election> {
    spec.validate().map_err(Error::Validation)?;
    let updated = Election {
        id,
        election: spec.into(),
    };
    store.coll::<Election>().modify(|all| {
        let election = all
            .iter_mut()
            .find(|election| election.id == id)
            .ok_or_else(|| Error::not_found(format!("Election {id}")))?;
        *election = updated.clone();
        Ok(())
    })?;
    info!("Modified election {id}");
    Ok(updated)
}

/// Delete an election. Does not cascade to parties or vote records.
pub fn delete_election(store: &Store, id: Id) -> Result<()> {
    store.coll::<Election>().modify(|all| {
        let before = all.len();
        all.retain(|election| election.id != id);
        if all.len() == before {
            Err(Error::not_found(format!("Election {id}")))
        } else {
            Ok(())
        }
    })?;
    info!("Deleted election {id}");
    Ok(())
}

/// List the parties registered for an election.
pub fn list_parties(store: &Store, election_id: Id) -> Result<Vec<Party>> {
    let parties = store.coll::<Party>().read_all()?;
    Ok(parties
        .into_iter()
        .filter(|party| party.election_id == election_id)
        .collect())
}

/// Add a party to an election, allocating its id.
pub fn add_party(store: &Store, spec: PartySpec) -> Result<Party> {
    spec.validate().map_err(Error::Validation)?;
    check_party_association(store, &spec)?;

    let id = Counter::next(store, PARTY_IDS)?;
    let party = Party {
        id,
        party: spec.into(),
    };
    store.coll::<Party>().modify(|all| {
        all.push(party.clone());
        Ok(())
    })?;
    info!("Added party {} ({})", party.id, party.name);
    Ok(party)
}

/// Replace a party's data, keeping its id.
pub fn update_party(store: &Store, id: Id, spec: PartySpec) -> Result<Party> {
    spec.validate().map_err(Error::Validation)?;
    check_party_association(store, &spec)?;

    let updated = Party {
        id,
        party: spec.into(),
    };
    store.coll::<Party>().modify(|all| {
        let party = all
            .iter_mut()
            .find(|party| party.id == id)
            .ok_or_else(|| Error::not_found(format!("Party {id}")))?;
        *party = updated.clone();
        Ok(())
    })?;
    info!("Updated party {id}");
    Ok(updated)
}

/// Delete a party. Historical vote records keep their denormalised names;
/// the aggregator tolerates the dangling reference.
pub fn delete_party(store: &Store, id: Id) -> Result<()> {
    store.coll::<Party>().modify(|all| {
        let before = all.len();
        all.retain(|party| party.id != id);
        if all.len() == before {
            Err(Error::not_found(format!("Party {id}")))
        } else {
            Ok(())
        }
    })?;
    info!("Deleted party {id}");
    Ok(())
}

/// Ensure the spec's election and category exist.
fn check_party_association(store: &Store, spec: &PartySpec) -> Result<()> {
    let elections = store.coll::<Election>().read_all()?;
    let election = elections
        .iter()
        .find(|election| election.id == spec.election_id)
        .ok_or_else(|| Error::not_found(format!("Election {}", spec.election_id)))?;
    if election.category(spec.category_id).is_none() {
        return Err(Error::not_found(format!(
            "Category {} in election {}",
            spec.category_id, election.name
        )));
    }
    Ok(())
}

/// Filters for the voter list. All criteria are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct VoterFilter {
    /// Case-insensitive substring of the DNI or either name field.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub voted: Option<bool>,
    pub department: Option<String>,
}

impl VoterFilter {
    pub fn matches(&self, voter: &VoterCore) -> bool {
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = voter.dni.as_str().to_lowercase().contains(&term)
                || voter.first_names.to_lowercase().contains(&term)
                || voter.last_names.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(role) = self.role {
            if voter.role != role {
                return false;
            }
        }
        if let Some(voted) = self.voted {
            if voter.has_voted != voted {
                return false;
            }
        }
        if let Some(department) = &self.department {
            if &voter.department != department {
                return false;
            }
        }
        true
    }
}

/// List voters matching the filter.
pub fn list_voters(store: &Store, filter: &VoterFilter) -> Result<Vec<VoterCore>> {
    let voters = store.coll::<VoterCore>().read_all()?;
    Ok(voters
        .into_iter()
        .filter(|voter| filter.matches(voter))
        .collect())
}

/// Summary counts for the voter list header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoterSummary {
    pub total: u64,
    pub voted: u64,
    pub not_voted: u64,
    pub admins: u64,
    pub users: u64,
    pub ppmm: u64,
}

/// Compute the summary counts over a voter list.
pub fn voter_summary(voters: &[VoterCore]) -> VoterSummary {
    let mut summary = VoterSummary {
        total: voters.len() as u64,
        ..VoterSummary::default()
    };
    for voter in voters {
        if voter.has_voted {
            summary.voted += 1;
        } else {
            summary.not_voted += 1;
        }
        match voter.role {
            Role::Admin => summary.admins += 1,
            Role::User => summary.users += 1,
            Role::Ppmm => summary.ppmm += 1,
        }
    }
    summary
}
