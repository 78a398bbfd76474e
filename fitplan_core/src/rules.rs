//! The program rule table.
//!
//! Two independent tables are held:
//! - the full table, keyed by (BMI band, body-fat band), which may have gaps
//!   that resolve to the fallback program
//! - the BMI-only table, one program per BMI band, always complete
//!
//! A `RuleTable` is immutable once built. Reloading rules means building a
//! new table and swapping it in.

use crate::{BmiCategory, BmiOnlyRule, BodyFatCategory, Error, ProgramId, ProgramRule, Result};
use std::collections::BTreeSet;

const fn p(number: u8) -> ProgramId {
    ProgramId::builtin(number)
}

/// Program used when the full table has no rule for a pair
pub const DEFAULT_FALLBACK: ProgramId = p(2);

const BMI_BANDS: usize = 4;
const BODY_FAT_BANDS: usize = 3;

type FullGrid = [[Option<ProgramId>; BODY_FAT_BANDS]; BMI_BANDS];

// Rows follow BmiCategory order, columns BodyFatCategory order.
const BUILTIN_FULL: FullGrid = [
    [Some(p(1)), Some(p(2)), Some(p(3))],
    [Some(p(4)), Some(p(5)), Some(p(6))],
    [None, Some(p(7)), Some(p(8))],
    [None, Some(p(9)), Some(p(10))],
];

const BUILTIN_BMI_ONLY: [ProgramId; BMI_BANDS] = [p(2), p(5), p(8), p(10)];

fn bmi_index(bmi: BmiCategory) -> usize {
    match bmi {
        BmiCategory::Underweight => 0,
        BmiCategory::Ideal => 1,
        BmiCategory::Overweight => 2,
        BmiCategory::Obese => 3,
    }
}

fn body_fat_index(body_fat: BodyFatCategory) -> usize {
    match body_fat {
        BodyFatCategory::Low => 0,
        BodyFatCategory::Normal => 1,
        BodyFatCategory::High => 2,
    }
}

/// Validated, immutable rule table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTable {
    full: FullGrid,
    bmi_only: [ProgramId; BMI_BANDS],
    fallback: ProgramId,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTable {
    /// The built-in table (10 rules, Overweight/Low and Obese/Low uncovered)
    pub const fn builtin() -> Self {
        Self {
            full: BUILTIN_FULL,
            bmi_only: BUILTIN_BMI_ONLY,
            fallback: DEFAULT_FALLBACK,
        }
    }

    /// Build a table from rule rows
    ///
    /// Rejects:
    /// - two full rules for the same (BMI, body-fat) pair
    /// - a BMI band with zero or several BMI-only rules
    /// - any uncovered pair when `require_full_coverage` is set
    pub fn new(
        rules: &[ProgramRule],
        bmi_only: &[BmiOnlyRule],
        fallback: ProgramId,
        require_full_coverage: bool,
    ) -> Result<Self> {
        let mut full: FullGrid = [[None; BODY_FAT_BANDS]; BMI_BANDS];
        for rule in rules {
            let cell = &mut full[bmi_index(rule.bmi)][body_fat_index(rule.body_fat)];
            if let Some(existing) = *cell {
                return Err(Error::RuleTable(format!(
                    "duplicate rule for {}/{}: {} and {}",
                    rule.bmi, rule.body_fat, existing, rule.program
                )));
            }
            *cell = Some(rule.program);
        }

        let mut only: [Option<ProgramId>; BMI_BANDS] = [None; BMI_BANDS];
        for rule in bmi_only {
            let cell = &mut only[bmi_index(rule.bmi)];
            if let Some(existing) = *cell {
                return Err(Error::RuleTable(format!(
                    "duplicate BMI-only rule for {}: {} and {}",
                    rule.bmi, existing, rule.program
                )));
            }
            *cell = Some(rule.program);
        }

        let mut resolved_only = [fallback; BMI_BANDS];
        for bmi in BmiCategory::ALL {
            resolved_only[bmi_index(bmi)] = only[bmi_index(bmi)].ok_or_else(|| {
                Error::RuleTable(format!("missing BMI-only rule for {}", bmi))
            })?;
        }

        let table = Self {
            full,
            bmi_only: resolved_only,
            fallback,
        };

        if require_full_coverage {
            let gaps = table.gaps();
            if !gaps.is_empty() {
                let listed: Vec<String> = gaps
                    .iter()
                    .map(|(bmi, body_fat)| format!("{}/{}", bmi, body_fat))
                    .collect();
                return Err(Error::RuleTable(format!(
                    "full coverage required but {} pair(s) have no rule: {}",
                    gaps.len(),
                    listed.join(", ")
                )));
            }
        }

        Ok(table)
    }

    /// Program for a (BMI, body-fat) pair, if a rule covers it
    pub fn lookup(&self, bmi: BmiCategory, body_fat: BodyFatCategory) -> Option<ProgramId> {
        self.full[bmi_index(bmi)][body_fat_index(body_fat)]
    }

    /// Program for a BMI-only consultation
    pub fn lookup_bmi_only(&self, bmi: BmiCategory) -> ProgramId {
        self.bmi_only[bmi_index(bmi)]
    }

    pub fn fallback(&self) -> ProgramId {
        self.fallback
    }

    /// Full-table rules in BMI, then body-fat order
    pub fn rules(&self) -> Vec<ProgramRule> {
        let mut rules = Vec::new();
        for bmi in BmiCategory::ALL {
            for body_fat in BodyFatCategory::ALL {
                if let Some(program) = self.lookup(bmi, body_fat) {
                    rules.push(ProgramRule {
                        bmi,
                        body_fat,
                        program,
                    });
                }
            }
        }
        rules
    }

    pub fn bmi_only_rules(&self) -> Vec<BmiOnlyRule> {
        BmiCategory::ALL
            .into_iter()
            .map(|bmi| BmiOnlyRule {
                bmi,
                program: self.lookup_bmi_only(bmi),
            })
            .collect()
    }

    /// Pairs with no full-table rule
    pub fn gaps(&self) -> Vec<(BmiCategory, BodyFatCategory)> {
        let mut gaps = Vec::new();
        for bmi in BmiCategory::ALL {
            for body_fat in BodyFatCategory::ALL {
                if self.lookup(bmi, body_fat).is_none() {
                    gaps.push((bmi, body_fat));
                }
            }
        }
        gaps
    }

    /// Every program the table can produce, fallback included
    pub fn referenced_programs(&self) -> BTreeSet<ProgramId> {
        let mut programs: BTreeSet<ProgramId> =
            self.rules().into_iter().map(|r| r.program).collect();
        programs.extend(self.bmi_only.iter().copied());
        programs.insert(self.fallback);
        programs
    }
}
