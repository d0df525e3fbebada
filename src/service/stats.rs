use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{
    ballot::Ballot,
    election::Election,
    party::Party,
    store::{Id, Store},
    voter::VoterCore,
};

/// The fixed fallback palette for parties without a stored color.
pub const FALLBACK_PALETTE: [&str; 6] = [
    "#8B5CF6", "#10B981", "#EF4444", "#F59E0B", "#3B82F6", "#EC4899",
];

/// Degrees between consecutive generated hues once the palette runs out.
const GOLDEN_ANGLE: f64 = 137.508;

/// The deterministic color for the nth party needing a fallback.
fn fallback_color(index: usize) -> String {
    match FALLBACK_PALETTE.get(index) {
        Some(color) => (*color).to_string(),
        None => {
            let hue = (index as f64 * GOLDEN_ANGLE) % 360.0;
            format!("hsl({hue:.1}, 70%, 50%)")
        }
    }
}

/// One party's share of an election's votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyResult {
    pub party_id: Id,
    pub name: String,
    pub votes: u64,
    /// Rounded percentage of all recorded selections.
    pub percentage: u32,
    pub color: String,
}

/// Presentation state of an election's results.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultsState {
    /// The window has not opened yet.
    Pending,
    /// Open or closed, but nothing recorded yet.
    NoVotes,
    Ready,
}

/// Aggregated results for one election, ordered by share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElectionResults {
    pub election_id: Id,
    pub election_name: String,
    pub state: ResultsState,
    /// Number of vote records for this election.
    pub ballots_cast: u64,
    /// Sum of per-party counters (one ballot contributes one per category).
    pub selection_total: u64,
    pub parties: Vec<PartyResult>,
}

impl ElectionResults {
    /// The label/value/color rows consumed by the charting layer.
    pub fn chart_rows(&self) -> Vec<ChartRow> {
        self.parties
            .iter()
            .map(|party| ChartRow {
                label: party.name.clone(),
                value: party.percentage,
                color: party.color.clone(),
            })
            .collect()
    }
}

/// The shape handed to bar/pie/donut renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub value: u32,
    pub color: String,
}

/// The election the statistics screen shows when none is chosen: the first
/// one whose window contains now, else the first one listed.
pub fn default_election_id(elections: &[Election], now: DateTime<Utc>) -> Option<Id> {
    elections
        .iter()
        .find(|election| election.start_instant() <= now && now <= election.end_instant())
        .or_else(|| elections.first())
        .map(|election| election.id)
}

/// Aggregate the results of one election from the store.
pub fn election_results(store: &Store, election_id: Id, now: DateTime<Utc>) -> Result<ElectionResults> {
    let elections = store.coll::<Election>().read_all()?;
    let election = elections
        .iter()
        .find(|election| election.id == election_id)
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    let votes = store.coll::<Ballot>().read_all()?;
    let parties = store.coll::<Party>().read_all()?;
    Ok(tally(election, &votes, &parties, now))
}

/// Tally an election's votes. Pure; reads nothing and never fails.
///
/// Selections referencing a deleted party still count under their recorded
/// id and denormalised name, with a fallback color.
pub fn tally(
    election: &Election,
    votes: &[Ballot],
    parties: &[Party],
    now: DateTime<Utc>,
) -> ElectionResults {
    let mut ballots_cast = 0_u64;
    // Per-party counters; the first occurrence captures the display name.
    let mut counts: Vec<(Id, String, u64)> = Vec::new();
    for vote in votes.iter().filter(|vote| vote.election_id == election.id) {
        ballots_cast += 1;
        for selection in &vote.selections {
            match counts.iter_mut().find(|(id, _, _)| *id == selection.party_id) {
                Some((_, _, count)) => *count += 1,
                None => counts.push((selection.party_id, selection.party_name.clone(), 1)),
            }
        }
    }

    let selection_total: u64 = counts.iter().map(|(_, _, count)| *count).sum();
    let mut rows: Vec<PartyResult> = counts
        .into_iter()
        .map(|(party_id, name, count)| PartyResult {
            party_id,
            name,
            votes: count,
            percentage: percentage_of(count, selection_total),
            color: String::new(),
        })
        .collect();

    // Share descending, then raw count descending, then party id ascending.
    rows.sort_by(|a, b| {
        b.percentage
            .cmp(&a.percentage)
            .then(b.votes.cmp(&a.votes))
            .then(a.party_id.cmp(&b.party_id))
    });

    // Colors are assigned after ordering so fallbacks are deterministic.
    let mut fallbacks = 0;
    for row in &mut rows {
        let stored = parties
            .iter()
            .find(|party| party.id == row.party_id)
            .and_then(|party| party.color.clone());
        row.color = match stored {
            Some(color) => color,
            None => {
                let color = fallback_color(fallbacks);
                fallbacks += 1;
                color
            }
        };
    }

    let state = if election.is_pending(now) {
        ResultsState::Pending
    } else if rows.is_empty() {
        ResultsState::NoVotes
    } else {
        ResultsState::Ready
    };

    ElectionResults {
        election_id: election.id,
        election_name: election.name.clone(),
        state,
        ballots_cast,
        selection_total,
        parties: rows,
    }
}

/// Voter turnout for the dashboard donut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Turnout {
    pub voted: u64,
    pub total: u64,
    /// Rounded; 0 when there are no users.
    pub percentage: u32,
}

/// One of the three upcoming-election slots on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UpcomingSlot {
    Scheduled {
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    /// Shown as "Proximamente" when fewer than three are scheduled.
    Placeholder,
}

/// The dashboard always shows exactly this many upcoming slots.
pub const UPCOMING_SLOTS: usize = 3;

/// The landing-screen summary numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub active_elections: u64,
    pub total_users: u64,
    pub turnout: Turnout,
    pub upcoming: Vec<UpcomingSlot>,
}

/// Aggregate the dashboard summary from the store.
pub fn dashboard(store: &Store, now: DateTime<Utc>) -> Result<DashboardSummary> {
    let elections = store.coll::<Election>().read_all()?;
    let users = store.coll::<VoterCore>().read_all()?;
    Ok(summarise(&elections, &users, now))
}

/// Compute the dashboard summary. Pure; recomputed in full on every call.
pub fn summarise(elections: &[Election], users: &[VoterCore], now: DateTime<Utc>) -> DashboardSummary {
    let active_elections = elections
        .iter()
        .filter(|election| election.is_active(now))
        .count() as u64;

    let total = users.len() as u64;
    let voted = users.iter().filter(|user| user.has_voted).count() as u64;
    let turnout = Turnout {
        voted,
        total,
        percentage: percentage_of(voted, total),
    };

    // Soonest first, capped at three, padded with placeholders.
    let mut future: Vec<&Election> = elections
        .iter()
        .filter(|election| election.start_instant() > now)
        .collect();
    future.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
    let mut upcoming: Vec<UpcomingSlot> = future
        .into_iter()
        .take(UPCOMING_SLOTS)
        .map(|election| UpcomingSlot::Scheduled {
            name: election.name.clone(),
            start_date: election.start_date,
            end_date: election.end_date,
        })
        .collect();
    while upcoming.len() < UPCOMING_SLOTS {
        upcoming.push(UpcomingSlot::Placeholder);
    }

    DashboardSummary {
        active_elections,
        total_users: total,
        turnout,
        upcoming,
    }
}

/// `round(part / whole * 100)`, 0 when the whole is 0.
fn percentage_of(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        0
    } else {
        ((part as f64 / whole as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use crate::model::ballot::BallotCore;
    use crate::model::election::{ElectionSpec, ElectionStatus};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap()
    }

    fn ballot(id: u32, dni: &str, election: &Election) -> Ballot {
        Ballot {
            id: Id::new(id),
            ballot: BallotCore::example(dni, election.id, &election.name),
        }
    }

    /// Three votes for A, one for B.
    fn three_to_one(election: &Election) -> Vec<Ballot> {
        let a = Id::new(10);
        let b = Id::new(11);
        let mut votes = Vec::new();
        for (index, dni) in ["10000001", "10000002", "10000003"].iter().enumerate() {
            let mut vote = ballot(index as u32 + 1, dni, election);
            vote.ballot = vote.ballot.with_selection(1, a, "Partido A");
            votes.push(vote);
        }
        let mut vote = ballot(4, "10000004", election);
        vote.ballot = vote.ballot.with_selection(1, b, "Partido B");
        votes.push(vote);
        votes
    }

    #[test]
    fn three_to_one_is_75_25() {
        let election = Election::active_example();
        let results = tally(&election, &three_to_one(&election), &[], now());

        assert_eq!(ResultsState::Ready, results.state);
        assert_eq!(4, results.ballots_cast);
        assert_eq!(4, results.selection_total);
        let shares: Vec<(&str, u64, u32)> = results
            .parties
            .iter()
            .map(|party| (party.name.as_str(), party.votes, party.percentage))
            .collect();
        assert_eq!(vec![("Partido A", 3, 75), ("Partido B", 1, 25)], shares);
    }

    #[test]
    fn zero_votes_is_a_state_not_an_error() {
        let election = Election::active_example();
        let results = tally(&election, &[], &[], now());
        assert_eq!(ResultsState::NoVotes, results.state);
        assert!(results.parties.is_empty());
        assert_eq!(0, results.selection_total);
    }

    #[test]
    fn pending_election_reports_pending_state() {
        let election = Election::upcoming_example();
        let results = tally(&election, &[], &[], Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(ResultsState::Pending, results.state);
    }

    #[test]
    fn recomputing_is_idempotent() {
        let election = Election::active_example();
        let votes = three_to_one(&election);
        let first = tally(&election, &votes, &[], now());
        let second = tally(&election, &votes, &[], now());
        assert_eq!(first, second);
    }

    #[test]
    fn percentages_sum_within_rounding_bound() {
        let election = Election::active_example();
        // Seven votes over three parties: 3/7, 2/7, 2/7.
        let mut votes = Vec::new();
        let spread = [(10, 3_u32), (11, 2), (12, 2)];
        let mut id = 0;
        for (party, count) in spread {
            for _ in 0..count {
                id += 1;
                let dni = format!("2000{id:04}");
                let mut vote = ballot(id, &dni, &election);
                vote.ballot = vote
                    .ballot
                    .with_selection(1, Id::new(party), &format!("Partido {party}"));
                votes.push(vote);
            }
        }
        let results = tally(&election, &votes, &[], now());
        let sum: u32 = results.parties.iter().map(|party| party.percentage).sum();
        let bound = results.parties.len() as u32 - 1;
        assert!(
            (100 - bound..=100 + bound).contains(&sum),
            "sum {sum} outside 100 ± {bound}"
        );
    }

    #[test]
    fn ties_break_by_party_id() {
        let election = Election::active_example();
        // Insert the higher id first so insertion order disagrees with the
        // documented tie-break.
        let mut first = ballot(1, "10000001", &election);
        first.ballot = first.ballot.with_selection(1, Id::new(20), "Partido Z");
        let mut second = ballot(2, "10000002", &election);
        second.ballot = second.ballot.with_selection(1, Id::new(10), "Partido A");

        let results = tally(&election, &[first, second], &[], now());
        let order: Vec<u32> = results.parties.iter().map(|p| p.party_id.as_u32()).collect();
        assert_eq!(vec![10, 20], order);
    }

    #[test]
    fn colors_prefer_stored_then_palette_then_golden_angle() {
        let election = Election::active_example();
        // Eight parties, one vote each; only party 1 has a stored color.
        let mut votes = Vec::new();
        for party in 1..=8_u32 {
            let mut vote = ballot(party, &format!("3000{party:04}"), &election);
            vote.ballot = vote
                .ballot
                .with_selection(1, Id::new(party), &format!("Partido {party}"));
            votes.push(vote);
        }
        let stored = vec![Party::example(1, election.id, "Partido 1", Some("#123ABC"))];

        let results = tally(&election, &votes, &stored, now());
        // All shares tie, so rows are ordered by party id.
        assert_eq!("#123ABC", results.parties[0].color);
        for (row, expected) in results.parties[1..7].iter().zip(FALLBACK_PALETTE) {
            assert_eq!(expected, row.color);
        }
        // The seventh fallback leaves the palette: 6 * 137.508 mod 360.
        assert_eq!("hsl(105.0, 70%, 50%)", results.parties[7].color);
    }

    #[test]
    fn dangling_party_references_still_count() {
        let election = Election::active_example();
        let votes = three_to_one(&election);
        // No party documents at all: every reference dangles.
        let results = tally(&election, &votes, &[], now());
        assert_eq!(2, results.parties.len());
        assert_eq!("Partido A", results.parties[0].name);
        assert_eq!(FALLBACK_PALETTE[0], results.parties[0].color);
    }

    #[test]
    fn default_election_prefers_one_in_window() {
        let active = Election::active_example();
        let upcoming = Election::upcoming_example();
        // Listed after an upcoming one, the in-window election still wins.
        assert_eq!(
            Some(active.id),
            default_election_id(&[upcoming.clone(), active.clone()], now())
        );
        // Nothing in its window: fall back to the first listed.
        assert_eq!(
            Some(upcoming.id),
            default_election_id(&[upcoming.clone()], now())
        );
        assert_eq!(None, default_election_id(&[], now()));
    }

    #[test]
    fn dashboard_summary_counts() {
        let now = now();
        let active = Election::active_example();
        let mut finished = Election::active_example();
        finished.id = Id::new(7);
        finished.election.status = ElectionStatus::Finished;
        let upcoming = Election::upcoming_example();

        let mut users = vec![
            VoterCore::example("10000001", "Valeria", "Torres Flores"),
            VoterCore::example("10000002", "Kevin", "Ramírez Cruz"),
            VoterCore::example("10000003", "Carlos", "Gómez Díaz"),
            VoterCore::example("10000004", "Ana", "Castillo Vega"),
            VoterCore::example("10000005", "Rosa", "Medina Rojas"),
        ];
        for user in users.iter_mut().take(4) {
            user.has_voted = true;
        }

        let summary = summarise(&[active, finished, upcoming.clone()], &users, now);
        assert_eq!(1, summary.active_elections);
        assert_eq!(5, summary.total_users);
        assert_eq!(
            Turnout {
                voted: 4,
                total: 5,
                percentage: 80
            },
            summary.turnout
        );
        assert_eq!(UPCOMING_SLOTS, summary.upcoming.len());
        assert_eq!(
            UpcomingSlot::Scheduled {
                name: upcoming.name.clone(),
                start_date: upcoming.start_date,
                end_date: upcoming.end_date,
            },
            summary.upcoming[0]
        );
        assert_eq!(UpcomingSlot::Placeholder, summary.upcoming[1]);
        assert_eq!(UpcomingSlot::Placeholder, summary.upcoming[2]);
    }

    #[test]
    fn empty_store_dashboard_is_all_zeroes() {
        let summary = summarise(&[], &[], now());
        assert_eq!(0, summary.active_elections);
        assert_eq!(0, summary.turnout.percentage);
        assert_eq!(
            vec![UpcomingSlot::Placeholder; UPCOMING_SLOTS],
            summary.upcoming
        );
    }

    #[test]
    fn upcoming_is_soonest_first_and_capped() {
        let base = Election::upcoming_example();
        let mut elections = Vec::new();
        for (id, year) in [(1, 2029), (2, 2027), (3, 2028), (4, 2026)] {
            let mut election = base.clone();
            election.id = Id::new(id);
            election.election.name = format!("Elecciones {year}");
            election.election.start_date = NaiveDate::from_ymd_opt(year, 8, 5).unwrap();
            election.election.end_date = NaiveDate::from_ymd_opt(year, 8, 25).unwrap();
            elections.push(election);
        }

        let summary = summarise(&elections, &[], now());
        let names: Vec<&str> = summary
            .upcoming
            .iter()
            .map(|slot| match slot {
                UpcomingSlot::Scheduled { name, .. } => name.as_str(),
                UpcomingSlot::Placeholder => "-",
            })
            .collect();
        assert_eq!(
            vec!["Elecciones 2026", "Elecciones 2027", "Elecciones 2028"],
            names
        );
    }
}
