use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{Id, Store};

/// A counter object used to implement auto-increment ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub name: String,
    pub next: u32,
}

/// Counter allocating election ids.
pub const ELECTION_IDS: &str = "elections";
/// Counter allocating party ids.
pub const PARTY_IDS: &str = "parties";
/// Counter allocating vote record ids.
pub const VOTE_IDS: &str = "votes";

impl Counter {
    /// Take the next value of the named counter, creating it at 1 if absent.
    pub fn next(store: &Store, name: &str) -> Result<Id> {
        store.locked(|| Self::next_unlocked(store, name))
    }

    /// As [`Counter::next`], but the caller must hold the store lock.
    pub(super) fn next_unlocked(store: &Store, name: &str) -> Result<Id> {
        let counters = store.coll::<Counter>();
        let mut all = counters.read_all()?;
        let index = match all.iter().position(|counter| counter.name == name) {
            Some(index) => index,
            None => {
                all.push(Counter {
                    name: name.to_string(),
                    next: 1,
                });
                all.len() - 1
            }
        };
        let value = all[index].next;
        all[index].next = value + 1;
        counters.write_unlocked(&all)?;
        Ok(Id::new(value))
    }
}

/// Ensure the id counters exist, starting at 1.
///
/// This operation is idempotent.
pub(super) fn ensure_counters_exist(store: &Store) -> Result<()> {
    debug!("Ensuring id counters exist");
    let counters = store.coll::<Counter>();
    store.locked(|| {
        let mut all = counters.read_all()?;
        for name in [ELECTION_IDS, PARTY_IDS, VOTE_IDS] {
            if !all.iter().any(|counter| counter.name == name) {
                all.push(Counter {
                    name: name.to_string(),
                    next: 1,
                });
            }
        }
        counters.write_unlocked(&all)
    })
}
