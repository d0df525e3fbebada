//! The local document store: one JSON array file per collection under a data
//! directory, read and rewritten wholesale. The single write lock serialises
//! read-modify-write sequences within the process; cross-process atomicity is
//! out of scope.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    ballot::{Ballot, BallotCore},
    session::Session,
    voter::VoterCore,
};

mod collection;
mod counter;
mod id;

pub use collection::{Coll, StoreCollection};
pub use counter::{Counter, ELECTION_IDS, PARTY_IDS, VOTE_IDS};
pub use id::Id;

const SESSION_FILE: &str = "session.json";
const QUARANTINE_DIR: &str = "quarantine";

/// A handle on the data directory holding all collections.
pub struct Store {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl Store {
    /// Open (creating if necessary) the store at the configured data
    /// directory, ensure the id counters exist, and seed the demo admin into
    /// an empty users collection.
    pub fn open(config: &Config) -> Result<Self> {
        let store = Self {
            root: config.data_dir().to_path_buf(),
            write_lock: Mutex::new(()),
        };
        fs::create_dir_all(store.quarantine_dir())?;
        counter::ensure_counters_exist(&store)?;
        ensure_demo_admin_exists(&store, config)?;
        info!("Store online at {}", store.root.display());
        Ok(store)
    }

    /// Get a typed handle on a collection.
    pub fn coll<T: StoreCollection>(&self) -> Coll<'_, T> {
        Coll::new(self)
    }

    /// Read the session document, if anyone is signed in.
    ///
    /// An unreadable session file is quarantined and treated as signed out.
    pub fn read_session(&self) -> Result<Option<Session>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!("Session document is unreadable ({err}), quarantining");
                self.quarantine_raw("session", &raw)?;
                fs::remove_file(&path)?;
                Ok(None)
            }
        }
    }

    /// Overwrite the session document.
    pub fn write_session(&self, session: &Session) -> Result<()> {
        self.locked(|| {
            let tmp = self.session_path().with_extension("json.tmp");
            fs::write(&tmp, serde_json::to_string_pretty(session)?)?;
            fs::rename(&tmp, self.session_path())?;
            Ok(())
        })
    }

    /// Remove the session document, signing the user out.
    pub fn clear_session(&self) -> Result<()> {
        self.locked(|| {
            let path = self.session_path();
            if path.exists() {
                fs::remove_file(&path)?;
            }
            Ok(())
        })
    }

    /// Cast a vote: append the vote record and flip the voter's voted flag as
    /// one operation under the write lock. Both facts are recorded or
    /// neither; a duplicate cast for the same (voter, election) is rejected.
    pub fn cast_vote(&self, new_vote: BallotCore) -> Result<Ballot> {
        self.locked(|| {
            let votes = self.coll::<Ballot>();
            let users = self.coll::<VoterCore>();

            // Re-check the duplicate guard under the lock.
            let previous_votes = votes.read_all()?;
            if previous_votes
                .iter()
                .any(|v| v.voter == new_vote.voter && v.election_id == new_vote.election_id)
            {
                return Err(Error::conflict(format!(
                    "Voter {} has already voted in election {}",
                    new_vote.voter, new_vote.election_id
                )));
            }

            let mut all_users = users.read_all()?;
            let voter = all_users
                .iter_mut()
                .find(|u| u.dni == new_vote.voter)
                .ok_or_else(|| Error::not_found(format!("Voter with DNI {}", new_vote.voter)))?;
            if voter.has_voted {
                return Err(Error::conflict(format!(
                    "Voter {} has already voted",
                    voter.dni
                )));
            }
            voter.has_voted = true;
            voter.election_name = Some(new_vote.election_name.clone());

            let id = Counter::next_unlocked(self, VOTE_IDS)?;
            let ballot = Ballot {
                id,
                ballot: new_vote,
            };
            let mut all_votes = previous_votes.clone();
            all_votes.push(ballot.clone());

            votes.write_unlocked(&all_votes)?;
            if let Err(err) = users.write_unlocked(&all_users) {
                // Roll back the appended record so both collections agree.
                votes.write_unlocked(&previous_votes)?;
                return Err(err);
            }

            info!(
                "Vote {} cast by {} in election {}",
                ballot.id, ballot.voter, ballot.election_id
            );
            Ok(ballot)
        })
    }

    pub(crate) fn locked<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    pub(crate) fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    fn quarantine_dir(&self) -> PathBuf {
        self.root.join(QUARANTINE_DIR)
    }

    /// Append rejected documents to the collection's quarantine file.
    pub(crate) fn quarantine_values(&self, name: &str, values: Vec<Value>) -> Result<()> {
        let path = self.quarantine_dir().join(format!("{name}.json"));
        let mut quarantined = if path.exists() {
            match serde_json::from_str::<Vec<Value>>(&fs::read_to_string(&path)?) {
                Ok(existing) => existing,
                Err(_) => Vec::new(),
            }
        } else {
            Vec::new()
        };
        quarantined.extend(values);
        fs::write(&path, serde_json::to_string_pretty(&quarantined)?)?;
        Ok(())
    }

    /// Quarantine an entire unparseable file body.
    pub(crate) fn quarantine_raw(&self, name: &str, raw: &str) -> Result<()> {
        let path = self.quarantine_dir().join(format!("{name}.raw"));
        fs::write(&path, raw)?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &std::path::Path {
        &self.root
    }
}

/// Ensure there is at least one user by seeding the configured demo admin.
///
/// This operation is idempotent.
fn ensure_demo_admin_exists(store: &Store, config: &Config) -> Result<()> {
    let users = store.coll::<VoterCore>();
    store.locked(|| {
        let mut all = users.read_all()?;
        if all.is_empty() {
            let admin = VoterCore::demo_admin(config)?;
            info!("Seeding demo admin {}", admin.dni);
            all.push(admin);
            users.write_unlocked(&all)?;
        }
        Ok(())
    })
}
