//! Program resolution.
//!
//! Resolution is a single table lookup:
//! - BMI-only condition → BMI-only table
//! - full condition → full table, or the fallback program on a gap
//!
//! Resolution is pure, so a shared `RuleTable` can serve any number of
//! threads.

use crate::classify::{classify_body_fat, compute_bmi};
use crate::{BmiCategory, Condition, ConsultationInput, ProgramId, Result, RuleTable};

/// Outcome of resolving a condition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub program: ProgramId,
    /// True when the full table had no rule and the fallback was used
    pub fallback: bool,
}

/// Result of a complete consultation: classification plus resolution
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Consultation {
    pub bmi: f64,
    pub condition: Condition,
    pub resolution: Resolution,
}

/// Resolve a condition to a program. Never fails.
pub fn resolve_program(table: &RuleTable, condition: Condition) -> Resolution {
    match condition {
        Condition::BmiOnly { bmi } => Resolution {
            program: table.lookup_bmi_only(bmi),
            fallback: false,
        },
        Condition::Full { bmi, body_fat } => match table.lookup(bmi, body_fat) {
            Some(program) => Resolution {
                program,
                fallback: false,
            },
            None => Resolution {
                program: table.fallback(),
                fallback: true,
            },
        },
    }
}

/// Classify the measurements into a condition
///
/// An absent body-fat percentage gives a BMI-only condition.
pub fn condition_for(input: &ConsultationInput) -> Result<(f64, Condition)> {
    let bmi_value = compute_bmi(input.weight_kg, input.height_cm)?;
    let bmi = BmiCategory::from_bmi(bmi_value);

    let condition = match input.body_fat_percent {
        Some(percent) => Condition::Full {
            bmi,
            body_fat: classify_body_fat(percent, input.sex)?,
        },
        None => Condition::BmiOnly { bmi },
    };

    Ok((bmi_value, condition))
}

/// Classify the measurements and resolve a program for them
pub fn consult(table: &RuleTable, input: &ConsultationInput) -> Result<Consultation> {
    let (bmi, condition) = condition_for(input)?;
    Ok(Consultation {
        bmi,
        condition,
        resolution: resolve_program(table, condition),
    })
}
