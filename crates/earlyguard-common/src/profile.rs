//! Patient demographics collected on the first wizard step.

use serde::{Deserialize, Serialize};

/// Biological sex as expected by the prediction services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// Demographic profile backing one assessment run.
///
/// Fields start empty and are filled in by the user on the profile step;
/// the wizard refuses to advance until `is_complete()` holds. A completed
/// assessment never edits its profile — starting over creates a fresh one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    /// Pregnancy count; only meaningful when `sex` is `Female`.
    pub pregnancies: Option<u32>,
}

impl UserProfile {
    /// Upper bound of the plausible human age range accepted by the wizard.
    pub const MAX_AGE: u32 = 120;

    /// Completion gate for the profile step: name, age, and sex all present,
    /// with age a positive number inside the plausible range.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && self.age.is_some_and(|a| (1..=Self::MAX_AGE).contains(&a))
            && self.sex.is_some()
    }

    /// Pregnancy count as sent to the metabolic service: zero unless the
    /// profile is female and a count was recorded.
    pub fn effective_pregnancies(&self) -> u32 {
        match self.sex {
            Some(Sex::Female) => self.pregnancies.unwrap_or(0),
            _ => 0,
        }
    }
}
