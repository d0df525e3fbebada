use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Core election data, as stored in the elections collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Election name.
    pub name: String,
    /// Whether the election is held in person or virtually.
    pub kind: ElectionKind,
    /// Stored election status. "Currently accepting votes" additionally
    /// requires the date window to contain now; see [`ElectionCore::is_active`].
    pub status: ElectionStatus,
    /// First day of the voting window.
    pub start_date: NaiveDate,
    /// Last day of the voting window (inclusive).
    pub end_date: NaiveDate,
    /// Ballot categories, in display order.
    pub categories: Vec<Category>,
}

impl ElectionCore {
    /// The instant the voting window opens: midnight on the start date.
    pub fn start_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.start_date.and_time(NaiveTime::MIN))
    }

    /// The instant the voting window closes: the final second of the end date.
    pub fn end_instant(&self) -> DateTime<Utc> {
        let end_of_day = self.end_date.and_hms_opt(23, 59, 59).unwrap(); // Always a valid time.
        Utc.from_utc_datetime(&end_of_day)
    }

    /// An election is active iff now falls within its window AND its stored
    /// status says so. A future-dated election marked active is still
    /// excluded, and vice versa.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start_instant() <= now
            && now <= self.end_instant()
            && self.status == ElectionStatus::Active
    }

    /// An election is pending iff its window has not opened yet.
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        now < self.start_instant()
    }

    /// Look up a category by id.
    pub fn category(&self, id: u32) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }
}

/// Whether an election is held at physical polling stations or online.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElectionKind {
    InPerson,
    Virtual,
}

/// Stored states in the election lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    /// Accepting votes (subject to the date window).
    Active,
    /// Announced but not yet opened.
    Upcoming,
    /// Closed.
    Finished,
}

/// A single ballot category within an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id, unique within its election.
    pub id: u32,
    /// Category display name.
    pub name: String,
}
