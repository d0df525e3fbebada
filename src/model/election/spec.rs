use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::election_core::{Category, ElectionCore, ElectionKind, ElectionStatus};

/// An election specification, as submitted by the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Election name.
    pub name: String,
    /// Whether the election is held in person or virtually.
    pub kind: ElectionKind,
    /// Initial stored status.
    pub status: ElectionStatus,
    /// First day of the voting window.
    pub start_date: NaiveDate,
    /// Last day of the voting window (inclusive).
    pub end_date: NaiveDate,
    /// Category names, in display order.
    pub categories: Vec<String>,
}

impl ElectionSpec {
    /// Reject a window that ends before it starts or a blank name.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Election name must not be empty".to_string());
        }
        if self.end_date < self.start_date {
            return Err(format!(
                "Election window ends ({}) before it starts ({})",
                self.end_date, self.start_date
            ));
        }
        if self.categories.is_empty() {
            return Err("An election needs at least one ballot category".to_string());
        }
        Ok(())
    }
}

impl From<ElectionSpec> for ElectionCore {
    fn from(spec: ElectionSpec) -> Self {
        // Category ids are local to the election, allocated in display order.
        let categories = spec
            .categories
            .into_iter()
            .enumerate()
            .map(|(index, name)| Category {
                id: index as u32 + 1,
                name,
            })
            .collect();
        Self {
            name: spec.name,
            kind: spec.kind,
            status: spec.status,
            start_date: spec.start_date,
            end_date: spec.end_date,
            categories,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl ElectionSpec {
        pub fn active_example() -> Self {
            Self {
                name: "Elecciones Presidenciales 2025".to_string(),
                kind: ElectionKind::InPerson,
                status: ElectionStatus::Active,
                start_date: NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 6, 5).unwrap(),
                categories: vec!["Presidencia".to_string(), "Congreso".to_string()],
            }
        }

        pub fn upcoming_example() -> Self {
            Self {
                name: "Elecciones Municipales 2027".to_string(),
                kind: ElectionKind::Virtual,
                status: ElectionStatus::Upcoming,
                start_date: NaiveDate::from_ymd_opt(2027, 8, 5).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2027, 8, 25).unwrap(),
                categories: vec!["Alcaldía".to_string()],
            }
        }
    }
}
