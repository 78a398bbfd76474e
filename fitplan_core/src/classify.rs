//! Body metric classification.
//!
//! Turns raw measurements into the categories the rule table is keyed by:
//! - BMI from weight and height, banded on the raw value
//! - Body-fat percentage, banded with sex-specific thresholds

use crate::{BmiCategory, BodyFatCategory, Error, Result, Sex};

/// Lower bound of the Ideal band
pub const BMI_IDEAL_MIN: f64 = 18.5;
/// Lower bound of the Overweight band
pub const BMI_OVERWEIGHT_MIN: f64 = 25.0;
/// Lower bound of the Obese band
pub const BMI_OBESE_MIN: f64 = 30.0;

/// Body-fat thresholds for one sex: below `low_below` is Low, above
/// `high_above` is High, anything between (inclusive) is Normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyFatThresholds {
    pub low_below: f64,
    pub high_above: f64,
}

impl BodyFatThresholds {
    pub fn for_sex(sex: Sex) -> Self {
        match sex {
            Sex::Male => Self {
                low_below: 10.0,
                high_above: 20.0,
            },
            Sex::Female => Self {
                low_below: 20.0,
                high_above: 30.0,
            },
        }
    }
}

impl BmiCategory {
    /// Band an already computed BMI value. Each band includes its lower bound.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < BMI_IDEAL_MIN {
            BmiCategory::Underweight
        } else if bmi < BMI_OVERWEIGHT_MIN {
            BmiCategory::Ideal
        } else if bmi < BMI_OBESE_MIN {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    /// Whether `bmi` falls inside this band
    pub fn contains(&self, bmi: f64) -> bool {
        Self::from_bmi(bmi) == *self
    }
}

fn require_positive(value: f64, what: &str) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidInput(format!("{} must be a number, got {}", what, value)));
    }
    if value <= 0.0 {
        return Err(Error::InvalidInput(format!("{} must be positive, got {}", what, value)));
    }
    Ok(())
}

/// Compute BMI = weight / (height in metres)²
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Result<f64> {
    require_positive(weight_kg, "weight")?;
    require_positive(height_cm, "height")?;

    let height_m = height_cm / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

/// Classify weight and height into a BMI band
pub fn classify_bmi(weight_kg: f64, height_cm: f64) -> Result<BmiCategory> {
    compute_bmi(weight_kg, height_cm).map(BmiCategory::from_bmi)
}

/// Classify a body-fat percentage for the given sex
pub fn classify_body_fat(percent: f64, sex: Sex) -> Result<BodyFatCategory> {
    require_positive(percent, "body fat percentage")?;

    let thresholds = BodyFatThresholds::for_sex(sex);
    let category = if percent < thresholds.low_below {
        BodyFatCategory::Low
    } else if percent > thresholds.high_above {
        BodyFatCategory::High
    } else {
        BodyFatCategory::Normal
    };
    Ok(category)
}
