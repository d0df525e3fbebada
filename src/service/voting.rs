use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{
    ballot::{Ballot, BallotCore, BallotStatus, Selection},
    election::Election,
    party::Party,
    store::{Id, Store},
    voter::VoterCore,
};

use super::auth;

/// One row of the election selector screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionOverview {
    pub election: Election,
    /// Within the window and marked active.
    pub active: bool,
    /// Active AND the session voter has not voted yet.
    pub can_vote: bool,
}

/// The election selector: every election with the session voter's
/// per-election voting rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorView {
    pub voter: VoterCore,
    /// Read from the master list, not the session copy, so a vote cast in
    /// the meantime is reflected.
    pub has_voted: bool,
    pub elections: Vec<ElectionOverview>,
}

/// Build the selector view for the signed-in voter.
pub fn election_selector(store: &Store, now: DateTime<Utc>) -> Result<SelectorView> {
    let session = auth::current_session(store)?;
    let users = store.coll::<VoterCore>().read_all()?;
    let voter = users
        .into_iter()
        .find(|user| user.dni == session.dni)
        .ok_or_else(|| Error::not_found(format!("Voter with DNI {}", session.dni)))?;

    let has_voted = voter.has_voted;
    let elections = store
        .coll::<Election>()
        .read_all()?
        .into_iter()
        .map(|election| {
            let active = election.is_active(now);
            ElectionOverview {
                active,
                can_vote: active && !has_voted,
                election,
            }
        })
        .collect();

    Ok(SelectorView {
        voter,
        has_voted,
        elections,
    })
}

/// Select an election for casting, recording the hand-off in the session.
///
/// A voter who has already voted is stopped here ("Voto Emitido"), before
/// ever reaching the casting flow.
pub fn select_election(store: &Store, election_id: Id, now: DateTime<Utc>) -> Result<Election> {
    let view = election_selector(store, now)?;
    if view.has_voted {
        return Err(Error::conflict("Voto Emitido: this voter has already voted"));
    }
    let overview = view
        .elections
        .into_iter()
        .find(|overview| overview.election.id == election_id)
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    if !overview.active {
        return Err(Error::validation(format!(
            "Election '{}' is not open for voting",
            overview.election.name
        )));
    }

    let mut session = auth::current_session(store)?;
    session.selected_election = Some(election_id);
    store.write_session(&session)?;
    Ok(overview.election)
}

/// A selection the voter wishes to cast: a specific party and candidate for
/// a specific category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSpec {
    pub category_id: u32,
    pub party_id: Id,
    pub candidate_id: u32,
}

/// Cast the session voter's ballot for the selected election.
///
/// Exactly one selection per ballot category; every selection must name an
/// existing category, a party of that category, and a candidate of that
/// party. The store commits the record and the voted flag together.
pub fn cast_ballot(
    store: &Store,
    selections: Vec<SelectionSpec>,
    now: DateTime<Utc>,
) -> Result<Ballot> {
    let session = auth::current_session(store)?;
    let election_id = session
        .selected_election
        .ok_or_else(|| Error::validation("No election selected"))?;

    let elections = store.coll::<Election>().read_all()?;
    let election = elections
        .iter()
        .find(|election| election.id == election_id)
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    if !election.is_active(now) {
        return Err(Error::validation(format!(
            "Election '{}' is not open for voting",
            election.name
        )));
    }

    // Ensure the categories, parties, and candidates exist.
    let parties = store.coll::<Party>().read_all()?;
    let mut recorded = Vec::with_capacity(selections.len());
    for spec in &selections {
        let category = election.category(spec.category_id).ok_or_else(|| {
            Error::not_found(format!(
                "Category {} in election '{}'",
                spec.category_id, election.name
            ))
        })?;
        let party = parties
            .iter()
            .find(|party| {
                party.id == spec.party_id
                    && party.election_id == election.id
                    && party.category_id == category.id
            })
            .ok_or_else(|| {
                Error::not_found(format!(
                    "Party {} for category '{}'",
                    spec.party_id, category.name
                ))
            })?;
        let candidate = party.candidate(spec.candidate_id).ok_or_else(|| {
            Error::not_found(format!(
                "Candidate {} of party '{}'",
                spec.candidate_id, party.name
            ))
        })?;
        recorded.push(Selection {
            category_id: category.id,
            category_name: category.name.clone(),
            party_id: party.id,
            party_name: party.name.clone(),
            candidate_id: candidate.id,
            candidate_name: candidate.name.clone(),
        });
    }

    // Exactly one selection per category.
    for category in &election.categories {
        let count = recorded
            .iter()
            .filter(|selection| selection.category_id == category.id)
            .count();
        if count != 1 {
            return Err(Error::validation(format!(
                "Category '{}' needs exactly one selection, got {count}",
                category.name
            )));
        }
    }

    store.cast_vote(BallotCore {
        voter: session.dni,
        election_id: election.id,
        election_name: election.name.clone(),
        selections: recorded,
        status: BallotStatus::Cast,
        cast_at: now,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::config::Config;
    use crate::model::election::ElectionSpec;
    use crate::model::party::PartySpec;
    use crate::service::{admin, auth};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap()
    }

    /// A store with one active two-category election, one party per
    /// category, and a signed-in registered voter.
    fn voting_store(dir: &tempfile::TempDir) -> (Store, Election, Vec<Party>) {
        let store = Store::open(&Config::example(dir.path())).unwrap();
        let election = admin::create_election(&store, ElectionSpec::active_example()).unwrap();
        let mut parties = Vec::new();
        for category_id in [1, 2] {
            let mut spec = PartySpec::example(election.id, "Partido Morado", Some("#8B5CF6"));
            spec.name = format!("Partido {category_id}");
            spec.category_id = category_id;
            parties.push(admin::add_party(&store, spec).unwrap());
        }
        store
            .coll::<VoterCore>()
            .modify(|all| {
                all.push(VoterCore::example("10000001", "Valeria", "Torres Flores"));
                Ok(())
            })
            .unwrap();
        auth::login(&store, "10000001", "secreto").unwrap();
        (store, election, parties)
    }

    fn full_ballot(parties: &[Party]) -> Vec<SelectionSpec> {
        parties
            .iter()
            .map(|party| SelectionSpec {
                category_id: party.category_id,
                party_id: party.id,
                candidate_id: 1,
            })
            .collect()
    }

    #[test]
    fn selector_flags_eligibility() {
        let dir = tempfile::tempdir().unwrap();
        let (store, election, _) = voting_store(&dir);
        admin::create_election(&store, ElectionSpec::upcoming_example()).unwrap();

        let view = election_selector(&store, now()).unwrap();
        assert!(!view.has_voted);
        assert_eq!(2, view.elections.len());

        let active = &view.elections[0];
        assert_eq!(election.id, active.election.id);
        assert!(active.active);
        assert!(active.can_vote);

        let upcoming = &view.elections[1];
        assert!(!upcoming.active);
        assert!(!upcoming.can_vote);
    }

    #[test]
    fn cast_ballot_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let (store, election, parties) = voting_store(&dir);

        select_election(&store, election.id, now()).unwrap();
        let ballot = cast_ballot(&store, full_ballot(&parties), now()).unwrap();
        assert_eq!(2, ballot.selections.len());
        assert_eq!("Partido 1", ballot.selections[0].party_name);

        // The voted flag flipped and carries the election name.
        let users = store.coll::<VoterCore>().read_all().unwrap();
        let voter = users.iter().find(|u| u.dni.as_str() == "10000001").unwrap();
        assert!(voter.has_voted);
        assert_eq!(Some(election.name.clone()), voter.election_name);

        // The selector now reports Voto Emitido.
        let view = election_selector(&store, now()).unwrap();
        assert!(view.has_voted);
        assert!(view.elections.iter().all(|overview| !overview.can_vote));
        assert!(matches!(
            select_election(&store, election.id, now()),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn double_submit_leaves_collections_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let (store, election, parties) = voting_store(&dir);

        select_election(&store, election.id, now()).unwrap();
        cast_ballot(&store, full_ballot(&parties), now()).unwrap();

        // A second submit (session still holds the selection) is rejected...
        let err = cast_ballot(&store, full_ballot(&parties), now()).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // ...and neither collection changed.
        assert_eq!(1, store.coll::<Ballot>().read_all().unwrap().len());
        let users = store.coll::<VoterCore>().read_all().unwrap();
        assert_eq!(
            1,
            users.iter().filter(|user| user.has_voted).count()
        );
    }

    #[test]
    fn selections_must_cover_every_category_once() {
        let dir = tempfile::tempdir().unwrap();
        let (store, election, parties) = voting_store(&dir);
        select_election(&store, election.id, now()).unwrap();

        // Missing the second category.
        let partial = vec![SelectionSpec {
            category_id: 1,
            party_id: parties[0].id,
            candidate_id: 1,
        }];
        assert!(matches!(
            cast_ballot(&store, partial, now()),
            Err(Error::Validation(_))
        ));

        // Unknown candidate.
        let mut bad = full_ballot(&parties);
        bad[0].candidate_id = 9;
        assert!(matches!(
            cast_ballot(&store, bad, now()),
            Err(Error::NotFound(_))
        ));

        // Nothing was recorded.
        assert!(store.coll::<Ballot>().read_all().unwrap().is_empty());
    }

    #[test]
    fn inactive_election_cannot_be_selected() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _, _) = voting_store(&dir);
        let upcoming = admin::create_election(&store, ElectionSpec::upcoming_example()).unwrap();

        assert!(matches!(
            select_election(&store, upcoming.id, now()),
            Err(Error::Validation(_))
        ));
    }
}
