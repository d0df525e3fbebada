//! Synthetic demo data: the voter generator and the simulated-ballot
//! shortcut. Only compiled with the `demo` feature, so production code paths
//! cannot reach it. The simulated ballots are NOT a real tally: each voter's
//! party is derived from a hash of their DNI.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;

use crate::error::{Error, Result};
use crate::model::{
    ballot::{BallotCore, BallotStatus, Selection},
    election::{Election, ElectionKind, ElectionSpec, ElectionStatus},
    party::{Party, PartySpec},
    store::Store,
    voter::{Role, VoterCore},
};
use crate::service::admin;

const FIRST_NAMES: &[&str] = &[
    "Alexander", "Alejandro", "Kevin", "Yermin", "Aldair", "Ximena", "Valeria", "Carlos", "María",
    "José", "Ana", "Luis", "Carmen", "Jorge", "Rosa", "Pedro", "Isabel", "Miguel", "Patricia",
    "Juan", "Laura", "Diego", "Sofía", "Fernando", "Lucía", "Ricardo", "Elena", "Roberto",
    "Gabriela", "Andrés",
];

const LAST_NAMES: &[&str] = &[
    "García", "Rodríguez", "Martínez", "López", "González", "Pérez", "Sánchez", "Ramírez",
    "Torres", "Flores", "Rivera", "Gómez", "Díaz", "Cruz", "Morales", "Reyes", "Gutiérrez",
    "Ortiz", "Romero", "Hernández", "Jiménez", "Ruiz", "Mendoza", "Vargas", "Castillo",
];

const DEPARTMENTS: &[&str] = &[
    "Lima", "Arequipa", "Cusco", "La Libertad", "Piura", "Lambayeque", "Junín", "Puno",
    "Cajamarca", "Ica",
];

const PARTY_NAMES: &[(&str, Option<&str>)] = &[
    ("Partido Morado", Some("#8B5CF6")),
    ("Alianza Verde", Some("#10B981")),
    ("Fuerza Nacional", Some("#EF4444")),
    ("Movimiento Andino", None),
    ("Frente Azul", Some("#3B82F6")),
    ("Unidad Rosa", None),
];

/// Generate `count` synthetic voters with sequential DNIs from 10000000.
///
/// All are regular users or observers with the voted flag unset; the demo
/// admin is seeded separately by the store. One password hash is shared so
/// seeding a thousand voters does not crawl through argon2.
pub fn demo_voters(count: usize, rng: &mut impl Rng) -> Vec<VoterCore> {
    let password_hash = crate::model::voter::hash_password("demo123");
    (0..count)
        .map(|i| {
            let dni = format!("{}", 10_000_000 + i as u32);
            let first_names = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())].to_string();
            let last_names = format!(
                "{} {}",
                LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())],
                LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())]
            );
            let birth_date = NaiveDate::from_ymd_opt(
                1960 + rng.gen_range(0..45),
                rng.gen_range(1..=12),
                rng.gen_range(1..=28),
            )
            .unwrap(); // Day capped at 28.
            let registered_at =
                NaiveDate::from_ymd_opt(2024, rng.gen_range(1..=12), rng.gen_range(1..=28))
                    .unwrap(); // Day capped at 28.
            VoterCore {
                dni: dni.parse().unwrap(), // Eight digits by construction.
                first_names,
                last_names,
                birth_date,
                role: if rng.gen_bool(0.05) {
                    Role::Ppmm
                } else {
                    Role::User
                },
                department: DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())].to_string(),
                email: format!("votante{}@ejemplo.pe", 10_000_000 + i as u32),
                has_voted: false,
                election_name: None,
                registered_at,
                password_hash: password_hash.clone(),
            }
        })
        .collect()
}

/// A stable pseudo-choice: hash the DNI and index into the party list.
fn hashed_index(dni: &str, len: usize) -> usize {
    let digest = sha256::digest(dni.to_string());
    let word = u64::from_str_radix(&digest[..8], 16).unwrap_or(0);
    (word % len as u64) as usize
}

/// Build a simulated ballot for one voter: one selection per category, the
/// party picked by [`hashed_index`], the candidate always the party's first.
pub fn simulated_ballot(
    voter: &VoterCore,
    election: &Election,
    parties: &[Party],
    cast_at: DateTime<Utc>,
) -> Option<BallotCore> {
    let mut selections = Vec::with_capacity(election.categories.len());
    for category in &election.categories {
        let runners: Vec<&Party> = parties
            .iter()
            .filter(|party| party.election_id == election.id && party.category_id == category.id)
            .collect();
        if runners.is_empty() {
            return None;
        }
        let party = runners[hashed_index(voter.dni.as_str(), runners.len())];
        let candidate = party.candidates.first()?;
        selections.push(Selection {
            category_id: category.id,
            category_name: category.name.clone(),
            party_id: party.id,
            party_name: party.name.clone(),
            candidate_id: candidate.id,
            candidate_name: candidate.name.clone(),
        });
    }
    Some(BallotCore {
        voter: voter.dni.clone(),
        election_id: election.id,
        election_name: election.name.clone(),
        selections,
        status: BallotStatus::Cast,
        cast_at,
        created_at: cast_at,
    })
}

/// What [`seed`] created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub elections: usize,
    pub parties: usize,
    pub voters: usize,
    pub votes: usize,
}

/// Populate a store with a coherent demo data set: an election in progress,
/// an upcoming and a finished one, six parties, `voter_count` voters, and
/// simulated ballots cast (through the transactional path) for roughly 60 %
/// of them.
pub fn seed(store: &Store, voter_count: usize, now: DateTime<Utc>) -> Result<SeedReport> {
    let today = now.date_naive();

    let in_progress = admin::create_election(
        store,
        ElectionSpec {
            name: "Elecciones Presidenciales 2025".to_string(),
            kind: ElectionKind::InPerson,
            status: ElectionStatus::Active,
            start_date: today - Duration::days(15),
            end_date: today + Duration::days(15),
            categories: vec!["Presidencia".to_string(), "Congreso".to_string()],
        },
    )?;
    admin::create_election(
        store,
        ElectionSpec {
            name: "Elecciones Municipales 2027".to_string(),
            kind: ElectionKind::Virtual,
            status: ElectionStatus::Upcoming,
            start_date: today + Duration::days(80),
            end_date: today + Duration::days(100),
            categories: vec!["Alcaldía".to_string()],
        },
    )?;
    admin::create_election(
        store,
        ElectionSpec {
            name: "Elecciones Regionales 2024".to_string(),
            kind: ElectionKind::InPerson,
            status: ElectionStatus::Finished,
            start_date: today - Duration::days(200),
            end_date: today - Duration::days(170),
            categories: vec!["Gobernación".to_string()],
        },
    )?;

    let mut party_count = 0;
    for (index, (name, color)) in PARTY_NAMES.iter().enumerate() {
        // Alternate the six parties over the two categories.
        let category_id = index as u32 % 2 + 1;
        admin::add_party(
            store,
            PartySpec {
                name: (*name).to_string(),
                logo: None,
                color: color.map(str::to_string),
                election_id: in_progress.id,
                category_id,
                candidates: vec![format!("Candidato de {name}")],
            },
        )?;
        party_count += 1;
    }

    let mut rng = rand::thread_rng();
    let voters = demo_voters(voter_count, &mut rng);
    store.coll::<VoterCore>().modify(|all| {
        all.extend(voters.iter().cloned());
        Ok(())
    })?;

    let parties = store.coll::<Party>().read_all()?;
    let mut votes = 0;
    for voter in &voters {
        if !rng.gen_bool(0.6) {
            continue;
        }
        let cast_at = now - Duration::minutes(votes as i64);
        let ballot = simulated_ballot(voter, &in_progress, &parties, cast_at)
            .ok_or_else(|| Error::validation("Demo election has a category without parties"))?;
        store.cast_vote(ballot)?;
        votes += 1;
    }

    info!(
        "Seeded demo data: 3 elections, {party_count} parties, {} voters, {votes} votes",
        voters.len()
    );
    Ok(SeedReport {
        elections: 3,
        parties: party_count,
        voters: voters.len(),
        votes,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::config::Config;
    use crate::service::stats;

    use super::*;

    #[test]
    fn simulated_ballots_are_stable_per_voter() {
        let election = Election::active_example();
        let parties = vec![
            Party::example(1, election.id, "Partido A", None),
            Party::example(2, election.id, "Partido B", None),
        ];
        let voter = VoterCore::example("10000001", "Valeria", "Torres Flores");
        let cast_at = Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap();

        let first = simulated_ballot(&voter, &election, &parties, cast_at).unwrap();
        let second = simulated_ballot(&voter, &election, &parties, cast_at).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn seeded_store_produces_consistent_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&Config::example(dir.path())).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap();

        let report = seed(&store, 50, now).unwrap();
        assert_eq!(50, report.voters);

        // Turnout matches the number of simulated ballots (the seeded admin
        // has not voted).
        let summary = stats::dashboard(&store, now).unwrap();
        assert_eq!(51, summary.total_users);
        assert_eq!(report.votes as u64, summary.turnout.voted);
        assert_eq!(1, summary.active_elections);

        // Every ballot contributed one selection per category.
        let elections = store.coll::<Election>().read_all().unwrap();
        let results = stats::election_results(&store, elections[0].id, now).unwrap();
        assert_eq!(report.votes as u64, results.ballots_cast);
        assert_eq!(report.votes as u64 * 2, results.selection_total);
    }
}
