//! Difficulty selection and per-difficulty budgets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Difficulty selector chosen once at the start of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    /// Five units, fifteen minutes.
    Easy,
    /// Three units, ten minutes.
    Medium,
    /// One unit, five minutes.
    Hard,
}

impl Difficulty {
    /// All difficulty keys in ascending order.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Canonical key as written in data files and the protocol.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Easy => "EASY",
            Self::Medium => "MEDIUM",
            Self::Hard => "HARD",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Difficulty {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(Self::Easy),
            "MEDIUM" => Ok(Self::Medium),
            "HARD" => Ok(Self::Hard),
            _ => Err(DispatchError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Unit and time budgets for one difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Difficulty this profile applies to.
    pub key: Difficulty,
    /// Units available for the whole session.
    pub unit_budget: u32,
    /// Seconds before the case goes cold.
    pub time_limit_secs: u32,
    /// Rank shown on the briefing screen.
    #[serde(default)]
    pub label: String,
    /// One-line summary of the budgets.
    #[serde(default)]
    pub description: String,
}

impl DifficultyProfile {
    /// Built-in profile for a difficulty.
    #[must_use]
    pub fn builtin(key: Difficulty) -> Self {
        let (unit_budget, time_limit_secs, label) = match key {
            Difficulty::Easy => (5, 900, "Trainee"),
            Difficulty::Medium => (3, 600, "Officer"),
            Difficulty::Hard => (1, 300, "Detective"),
        };
        Self {
            key,
            unit_budget,
            time_limit_secs,
            label: label.to_string(),
            description: format!(
                "{} dispatch unit{}, {} minutes",
                unit_budget,
                if unit_budget == 1 { "" } else { "s" },
                time_limit_secs / 60
            ),
        }
    }
}

/// Profiles for every difficulty key.
///
/// Construction guarantees exactly one profile per key, so lookups are total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DifficultyProfile>", into = "Vec<DifficultyProfile>")]
pub struct ProfileTable {
    /// Indexed by `Difficulty as usize`.
    profiles: [DifficultyProfile; 3],
}

impl ProfileTable {
    /// Build a table from a list of profiles.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidCatalog`] if a key is missing or
    /// duplicated, or if any budget is zero.
    pub fn new(profiles: Vec<DifficultyProfile>) -> Result<Self> {
        let mut slots: [Option<DifficultyProfile>; 3] = [None, None, None];

        for profile in profiles {
            if profile.unit_budget == 0 {
                return Err(DispatchError::InvalidCatalog(format!(
                    "{} has no units",
                    profile.key
                )));
            }
            if profile.time_limit_secs == 0 {
                return Err(DispatchError::InvalidCatalog(format!(
                    "{} has no time limit",
                    profile.key
                )));
            }
            let slot = &mut slots[profile.key as usize];
            if slot.is_some() {
                return Err(DispatchError::InvalidCatalog(format!(
                    "duplicate profile for {}",
                    profile.key
                )));
            }
            *slot = Some(profile);
        }

        let missing: Vec<&str> = Difficulty::ALL
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(key, _)| key.key())
            .collect();
        if !missing.is_empty() {
            return Err(DispatchError::InvalidCatalog(format!(
                "missing difficulty profiles: {}",
                missing.join(", ")
            )));
        }

        let [Some(easy), Some(medium), Some(hard)] = slots else {
            unreachable!("all slots checked above");
        };
        Ok(Self {
            profiles: [easy, medium, hard],
        })
    }

    /// Profile for a difficulty.
    #[must_use]
    pub fn get(&self, key: Difficulty) -> &DifficultyProfile {
        &self.profiles[key as usize]
    }

    /// Iterate profiles in difficulty order.
    pub fn iter(&self) -> impl Iterator<Item = &DifficultyProfile> {
        self.profiles.iter()
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            profiles: Difficulty::ALL.map(DifficultyProfile::builtin),
        }
    }
}

impl TryFrom<Vec<DifficultyProfile>> for ProfileTable {
    type Error = DispatchError;

    fn try_from(profiles: Vec<DifficultyProfile>) -> Result<Self> {
        Self::new(profiles)
    }
}

impl From<ProfileTable> for Vec<DifficultyProfile> {
    fn from(table: ProfileTable) -> Self {
        table.profiles.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_budgets() {
        let table = ProfileTable::default();
        assert_eq!(table.get(Difficulty::Easy).unit_budget, 5);
        assert_eq!(table.get(Difficulty::Easy).time_limit_secs, 900);
        assert_eq!(table.get(Difficulty::Medium).unit_budget, 3);
        assert_eq!(table.get(Difficulty::Medium).time_limit_secs, 600);
        assert_eq!(table.get(Difficulty::Hard).unit_budget, 1);
        assert_eq!(table.get(Difficulty::Hard).time_limit_secs, 300);
        assert_eq!(table.get(Difficulty::Hard).description, "1 dispatch unit, 5 minutes");
    }

    #[test]
    fn test_parse_difficulty() {
        assert_eq!("EASY".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!(matches!(
            "MEDIUM | HARD".parse::<Difficulty>(),
            Err(DispatchError::UnknownDifficulty(_))
        ));
    }

    #[test]
    fn test_table_rejects_missing_key() {
        let err = ProfileTable::new(vec![
            DifficultyProfile::builtin(Difficulty::Easy),
            DifficultyProfile::builtin(Difficulty::Hard),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("MEDIUM"), "{err}");
    }

    #[test]
    fn test_table_rejects_duplicate_and_zero_budget() {
        let dup = ProfileTable::new(vec![
            DifficultyProfile::builtin(Difficulty::Easy),
            DifficultyProfile::builtin(Difficulty::Easy),
        ]);
        assert!(dup.is_err());

        let mut broke = DifficultyProfile::builtin(Difficulty::Medium);
        broke.unit_budget = 0;
        assert!(ProfileTable::new(vec![broke]).is_err());
    }

    #[test]
    fn test_table_ron_roundtrip() {
        let table = ProfileTable::default();
        let text = ron::to_string(&table).unwrap();
        let back: ProfileTable = ron::from_str(&text).unwrap();
        assert_eq!(back, table);
    }
}
