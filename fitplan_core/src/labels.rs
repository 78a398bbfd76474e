//! Codes and display names for the category enums.
//!
//! Every place that shows or parses a category goes through here: the CLI
//! output, the config file rule rows and the CSV archive all use these codes.

use crate::{BmiCategory, BodyFatCategory, Error, ExerciseKind, Result, Sex};
use std::fmt;
use std::str::FromStr;

impl BmiCategory {
    /// Short code (`B1`..`B4`)
    pub fn code(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "B1",
            BmiCategory::Ideal => "B2",
            BmiCategory::Overweight => "B3",
            BmiCategory::Obese => "B4",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Ideal => "Ideal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }

    /// Human readable BMI range of the band
    pub fn range_label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "< 18.5",
            BmiCategory::Ideal => "18.5 - 24.9",
            BmiCategory::Overweight => "25 - 29.9",
            BmiCategory::Obese => ">= 30",
        }
    }
}

impl BodyFatCategory {
    /// Short code (`F1`..`F3`)
    pub fn code(&self) -> &'static str {
        match self {
            BodyFatCategory::Low => "F1",
            BodyFatCategory::Normal => "F2",
            BodyFatCategory::High => "F3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BodyFatCategory::Low => "Low",
            BodyFatCategory::Normal => "Normal",
            BodyFatCategory::High => "High",
        }
    }
}

impl Sex {
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for BodyFatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Parsing accepts the code or the name, case-insensitive.

impl FromStr for BmiCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        BmiCategory::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| Error::InvalidInput(format!("unknown BMI category '{}'", s)))
    }
}

impl FromStr for BodyFatCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        BodyFatCategory::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| Error::InvalidInput(format!("unknown body-fat category '{}'", s)))
    }
}

impl FromStr for Sex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(Error::InvalidInput(format!("unknown sex '{}'", other))),
        }
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cardio" => Ok(ExerciseKind::Cardio),
            "strength" => Ok(ExerciseKind::Strength),
            "flexibility" => Ok(ExerciseKind::Flexibility),
            other => Err(Error::InvalidInput(format!("unknown exercise kind '{}'", other))),
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExerciseKind::Cardio => "Cardio",
            ExerciseKind::Strength => "Strength",
            ExerciseKind::Flexibility => "Flexibility",
        })
    }
}
