//! Core domain types for the Fitplan system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Body metric categories and the consultation condition
//! - Program identifiers, programs and exercises
//! - User profiles
//! - Consultation inputs and recorded consultations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Body Metric Categories
// ============================================================================

/// Biological sex, used only to pick body-fat thresholds
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// BMI band
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Ideal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub const ALL: [BmiCategory; 4] = [
        BmiCategory::Underweight,
        BmiCategory::Ideal,
        BmiCategory::Overweight,
        BmiCategory::Obese,
    ];
}

/// Body-fat band (sex adjusted)
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum BodyFatCategory {
    Low,
    Normal,
    High,
}

impl BodyFatCategory {
    pub const ALL: [BodyFatCategory; 3] = [
        BodyFatCategory::Low,
        BodyFatCategory::Normal,
        BodyFatCategory::High,
    ];
}

/// What the resolver looks up.
///
/// A consultation without a body-fat measurement is a distinct mode with its
/// own table, not a full consultation with a missing field.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Condition {
    BmiOnly {
        bmi: BmiCategory,
    },
    Full {
        bmi: BmiCategory,
        body_fat: BodyFatCategory,
    },
}

impl Condition {
    pub fn bmi(&self) -> BmiCategory {
        match self {
            Condition::BmiOnly { bmi } | Condition::Full { bmi, .. } => *bmi,
        }
    }

    pub fn body_fat(&self) -> Option<BodyFatCategory> {
        match self {
            Condition::BmiOnly { .. } => None,
            Condition::Full { body_fat, .. } => Some(*body_fat),
        }
    }
}

// ============================================================================
// Program Identifiers
// ============================================================================

/// Stable program code, `P1` through `P10`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProgramId(u8);

impl ProgramId {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Build a program id from its number (1..=10)
    pub fn new(number: u8) -> crate::Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&number) {
            Ok(Self(number))
        } else {
            Err(crate::Error::InvalidInput(format!(
                "program number {} is outside P{}..P{}",
                number,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// For built-in tables only; `number` must already be in range.
    pub(crate) const fn builtin(number: u8) -> Self {
        Self(number)
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// Every valid program id in order
    pub fn all() -> impl Iterator<Item = ProgramId> {
        (Self::MIN..=Self::MAX).map(ProgramId)
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl FromStr for ProgramId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('P')
            .or_else(|| trimmed.strip_prefix('p'))
            .ok_or_else(|| crate::Error::InvalidInput(format!("invalid program code '{}'", s)))?;
        let number: u8 = digits
            .parse()
            .map_err(|_| crate::Error::InvalidInput(format!("invalid program code '{}'", s)))?;
        Self::new(number)
    }
}

impl TryFrom<String> for ProgramId {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        value.parse()
    }
}

impl From<ProgramId> for String {
    fn from(id: ProgramId) -> Self {
        id.to_string()
    }
}

// ============================================================================
// Programs and Exercises
// ============================================================================

/// Kind of exercise in the library
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Cardio,
    Strength,
    Flexibility,
}

/// An exercise that programs can reference
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub kind: ExerciseKind,
    pub description: String,
    pub reference_url: Option<String>,
}

/// One day of a weekly schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScheduleEntry {
    pub day: String,
    pub activity: String,
}

/// An exercise program with its display metadata
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub description: String,
    pub schedule: Vec<ScheduleEntry>,
    pub diet: String,
    pub cardio_percent: u8,
    pub weights_percent: u8,
    #[serde(default)]
    pub exercise_ids: Vec<String>,
}

/// A single rule row: (BMI band, body-fat band) -> program
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgramRule {
    pub bmi: BmiCategory,
    pub body_fat: BodyFatCategory,
    pub program: ProgramId,
}

/// A BMI-only rule row: BMI band -> program
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BmiOnlyRule {
    pub bmi: BmiCategory,
    pub program: ProgramId,
}

// ============================================================================
// Users and Consultations
// ============================================================================

/// A registered user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: u32,
    pub name: String,
    pub sex: Sex,
    pub created_at: DateTime<Utc>,
}

/// Measurements supplied for one consultation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsultationInput {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub sex: Sex,
    pub body_fat_percent: Option<f64>,
}

/// A consultation as stored in history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConsultationRecord {
    pub id: Uuid,
    pub user_id: Option<u32>,
    pub consulted_at: DateTime<Utc>,
    pub input: ConsultationInput,
    pub bmi: f64,
    pub condition: Condition,
    pub program: ProgramId,
    pub fallback: bool,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// Programs and the exercise library they draw from
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Catalog {
    pub programs: BTreeMap<ProgramId, Program>,
    pub exercises: BTreeMap<String, Exercise>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_id_parse() {
        assert_eq!("P1".parse::<ProgramId>().unwrap().number(), 1);
        assert_eq!("p10".parse::<ProgramId>().unwrap().number(), 10);
        assert!("P0".parse::<ProgramId>().is_err());
        assert!("P11".parse::<ProgramId>().is_err());
        assert!("X3".parse::<ProgramId>().is_err());
        assert!("P".parse::<ProgramId>().is_err());
    }

    #[test]
    fn test_program_id_serializes_as_code() {
        let id = ProgramId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"P7\"");
        let parsed: ProgramId = serde_json::from_str("\"P7\"").unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<ProgramId>("\"P42\"").is_err());
    }

    #[test]
    fn test_all_program_ids() {
        let ids: Vec<String> = ProgramId::all().map(|p| p.to_string()).collect();
        assert_eq!(ids.len(), 10);
        assert_eq!(ids.first().map(String::as_str), Some("P1"));
        assert_eq!(ids.last().map(String::as_str), Some("P10"));
    }

    #[test]
    fn test_condition_accessors() {
        let only = Condition::BmiOnly {
            bmi: BmiCategory::Obese,
        };
        assert_eq!(only.bmi(), BmiCategory::Obese);
        assert_eq!(only.body_fat(), None);

        let full = Condition::Full {
            bmi: BmiCategory::Ideal,
            body_fat: BodyFatCategory::High,
        };
        assert_eq!(full.bmi(), BmiCategory::Ideal);
        assert_eq!(full.body_fat(), Some(BodyFatCategory::High));
    }

    #[test]
    fn test_condition_json_is_tagged() {
        let full = Condition::Full {
            bmi: BmiCategory::Ideal,
            body_fat: BodyFatCategory::Normal,
        };
        let json = serde_json::to_string(&full).unwrap();
        assert!(json.contains("\"mode\":\"full\""));
        assert!(json.contains("\"body_fat\":\"normal\""));
    }
}
