use std::fs;
use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::model::{ballot::Ballot, election::Election, party::Party, voter::VoterCore};

use super::{counter::Counter, Store};

/// A type that can be directly inserted/read to/from a named collection.
pub trait StoreCollection: Serialize + DeserializeOwned {
    /// The name of the collection.
    const NAME: &'static str;
}

// Election collection.
const ELECTIONS: &str = "elections";
impl StoreCollection for Election {
    const NAME: &'static str = ELECTIONS;
}

// Party collection.
const PARTIES: &str = "parties";
impl StoreCollection for Party {
    const NAME: &'static str = PARTIES;
}

// Voter collection. Voters are keyed by DNI, so they are stored bare.
const USERS: &str = "users";
impl StoreCollection for VoterCore {
    const NAME: &'static str = USERS;
}

// Vote record collection.
const VOTES: &str = "votes";
impl StoreCollection for Ballot {
    const NAME: &'static str = VOTES;
}

// Counter collection.
const COUNTERS: &str = "counters";
impl StoreCollection for Counter {
    const NAME: &'static str = COUNTERS;
}

/// A typed handle on one collection in the given store.
pub struct Coll<'s, T> {
    store: &'s Store,
    _marker: PhantomData<fn() -> T>,
}

impl<'s, T> Coll<'s, T>
where
    T: StoreCollection,
{
    pub(super) fn new(store: &'s Store) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Read the full collection.
    ///
    /// Documents that fail to deserialise are moved to the quarantine
    /// directory rather than silently dropped; a file that is not a JSON
    /// array at all is quarantined wholesale and the collection treated as
    /// empty.
    pub fn read_all(&self) -> Result<Vec<T>> {
        let path = self.store.collection_path(T::NAME);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&path)?;
        let values = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(values)) => values,
            Ok(other) => {
                error!("Collection `{}` is not a JSON array, quarantining", T::NAME);
                self.store.quarantine_values(T::NAME, vec![other])?;
                fs::remove_file(&path)?;
                return Ok(Vec::new());
            }
            Err(err) => {
                error!("Collection `{}` is unreadable ({err}), quarantining", T::NAME);
                self.store.quarantine_raw(T::NAME, &raw)?;
                fs::remove_file(&path)?;
                return Ok(Vec::new());
            }
        };

        let mut items = Vec::with_capacity(values.len());
        let mut rejected = Vec::new();
        for value in values {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!("Quarantining invalid `{}` document: {err}", T::NAME);
                    rejected.push(value);
                }
            }
        }

        if !rejected.is_empty() {
            // Move the bad documents out of the live file.
            self.store.quarantine_values(T::NAME, rejected)?;
            self.write_unlocked(&items)?;
        }

        Ok(items)
    }

    /// Overwrite the full collection; last full write wins.
    pub fn write_all(&self, items: &[T]) -> Result<()> {
        self.store.locked(|| self.write_unlocked(items))
    }

    /// Read-modify-write the collection under the store's write lock.
    pub fn modify<R>(&self, f: impl FnOnce(&mut Vec<T>) -> Result<R>) -> Result<R> {
        self.store.locked(|| {
            let mut items = self.read_all()?;
            let result = f(&mut items)?;
            self.write_unlocked(&items)?;
            Ok(result)
        })
    }

    /// Write without taking the store lock; the caller must hold it.
    pub(super) fn write_unlocked(&self, items: &[T]) -> Result<()> {
        let path = self.store.collection_path(T::NAME);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(items)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<'_, T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            _marker: PhantomData,
        }
    }
}
