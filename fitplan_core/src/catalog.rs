//! Program catalog and exercise library.
//!
//! This module provides the built-in programs and exercises, validation,
//! and the admin operations for editing a stored catalog.

use crate::types::*;
use crate::{Error, Result, RuleTable};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with built-in programs and exercises
///
/// Prefer `get_default_catalog()` for read-only use; this returns an owned
/// copy that can be edited and saved.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

const WEEK: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn exercise(
    id: &str,
    name: &str,
    kind: ExerciseKind,
    description: &str,
    reference_url: Option<&str>,
) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        kind,
        description: description.into(),
        reference_url: reference_url.map(Into::into),
    }
}

#[allow(clippy::too_many_arguments)]
fn program(
    number: u8,
    name: &str,
    description: &str,
    cardio_percent: u8,
    weights_percent: u8,
    diet: &str,
    week: [&str; 7],
    exercise_ids: &[&str],
) -> Program {
    Program {
        id: ProgramId::builtin(number),
        name: name.into(),
        description: description.into(),
        schedule: WEEK
            .iter()
            .zip(week.iter())
            .map(|(day, activity)| ScheduleEntry {
                day: (*day).into(),
                activity: (*activity).into(),
            })
            .collect(),
        diet: diet.into(),
        cardio_percent,
        weights_percent,
        exercise_ids: exercise_ids.iter().map(|id| (*id).into()).collect(),
    }
}

/// Internal function that actually builds the catalog
fn build_default_catalog_internal() -> Catalog {
    let mut exercises = BTreeMap::new();
    let mut programs = BTreeMap::new();

    // ========================================================================
    // Exercises
    // ========================================================================

    for ex in [
        exercise(
            "brisk_walk",
            "Brisk Walk",
            ExerciseKind::Cardio,
            "Walk at a pace that raises the heart rate but still allows conversation.",
            None,
        ),
        exercise(
            "cycling",
            "Stationary Cycling",
            ExerciseKind::Cardio,
            "Steady cycling at moderate resistance.",
            None,
        ),
        exercise(
            "swimming",
            "Swimming",
            ExerciseKind::Cardio,
            "Low-impact full body cardio in the pool.",
            None,
        ),
        exercise(
            "jump_rope",
            "Jump Rope",
            ExerciseKind::Cardio,
            "Short rounds of skipping with rest between rounds.",
            None,
        ),
        exercise(
            "interval_run",
            "Interval Run",
            ExerciseKind::Cardio,
            "Alternate fast running and easy jogging.",
            None,
        ),
        exercise(
            "squat",
            "Barbell Squat",
            ExerciseKind::Strength,
            "Compound lower body lift.",
            Some("https://www.youtube.com/watch?v=ultWZbUMPL8"),
        ),
        exercise(
            "deadlift",
            "Deadlift",
            ExerciseKind::Strength,
            "Hip hinge lift for the posterior chain.",
            Some("https://www.youtube.com/watch?v=op9kVnSso6Q"),
        ),
        exercise(
            "bench_press",
            "Bench Press",
            ExerciseKind::Strength,
            "Horizontal press for chest, shoulders and triceps.",
            None,
        ),
        exercise(
            "pushup",
            "Push-up",
            ExerciseKind::Strength,
            "Bodyweight horizontal press.",
            None,
        ),
        exercise(
            "lunge",
            "Walking Lunge",
            ExerciseKind::Strength,
            "Unilateral leg work.",
            None,
        ),
        exercise(
            "plank",
            "Plank",
            ExerciseKind::Strength,
            "Isometric core hold.",
            None,
        ),
        exercise(
            "yoga_flow",
            "Yoga Flow",
            ExerciseKind::Flexibility,
            "Gentle sequence of poses for mobility.",
            None,
        ),
        exercise(
            "stretching",
            "Full Body Stretch",
            ExerciseKind::Flexibility,
            "Static stretches held 30 seconds each.",
            None,
        ),
    ] {
        exercises.insert(ex.id.clone(), ex);
    }

    // ========================================================================
    // Programs
    // ========================================================================

    for prog in [
        program(
            1,
            "Lean Mass Builder",
            "Heavy compound lifting with a calorie surplus to add muscle.",
            30,
            70,
            "Calorie surplus of about 500 kcal; 1.8 g protein per kg body weight.",
            [
                "Squat + bench press",
                "Brisk walk 20 min",
                "Deadlift + push-ups",
                "Rest",
                "Squat + lunges",
                "Cycling 20 min",
                "Rest",
            ],
            &["squat", "deadlift", "bench_press", "pushup", "lunge", "brisk_walk", "cycling"],
        ),
        program(
            2,
            "Foundation Strength",
            "General strength base with light cardio for building healthy weight.",
            40,
            60,
            "Slight calorie surplus; three balanced meals plus two snacks.",
            [
                "Full body strength",
                "Brisk walk 30 min",
                "Full body strength",
                "Stretching",
                "Full body strength",
                "Cycling 30 min",
                "Rest",
            ],
            &["squat", "pushup", "plank", "brisk_walk", "cycling", "stretching"],
        ),
        program(
            3,
            "Recomposition Starter",
            "Strength work to build muscle while bringing body fat down.",
            50,
            50,
            "Maintenance calories, high protein, limit refined sugar.",
            [
                "Strength: lower body",
                "Cycling 30 min",
                "Strength: upper body",
                "Brisk walk 30 min",
                "Strength: full body",
                "Yoga flow",
                "Rest",
            ],
            &["squat", "lunge", "pushup", "plank", "cycling", "brisk_walk", "yoga_flow"],
        ),
        program(
            4,
            "Athletic Performance",
            "Power and conditioning for lean, fit bodies.",
            40,
            60,
            "Maintenance calories; carbohydrates around training sessions.",
            [
                "Deadlift + plank",
                "Interval run",
                "Bench press + push-ups",
                "Swimming 30 min",
                "Squat + lunges",
                "Jump rope",
                "Rest",
            ],
            &["deadlift", "plank", "interval_run", "bench_press", "pushup", "swimming", "squat", "lunge", "jump_rope"],
        ),
        program(
            5,
            "Balanced Fitness",
            "Even mix of cardio and strength to maintain an ideal body.",
            50,
            50,
            "Maintenance calories with a balanced plate: half vegetables, quarter protein, quarter grains.",
            [
                "Full body strength",
                "Cycling 40 min",
                "Full body strength",
                "Swimming 30 min",
                "Full body strength",
                "Yoga flow",
                "Rest",
            ],
            &["squat", "bench_press", "plank", "cycling", "swimming", "yoga_flow"],
        ),
        program(
            6,
            "Toning and Conditioning",
            "Higher volume cardio with circuit strength to reduce body fat.",
            60,
            40,
            "Mild deficit of 300 kcal; high fibre, lean protein.",
            [
                "Circuit strength",
                "Interval run",
                "Cycling 40 min",
                "Circuit strength",
                "Jump rope",
                "Brisk walk 45 min",
                "Rest",
            ],
            &["pushup", "lunge", "plank", "interval_run", "cycling", "jump_rope", "brisk_walk"],
        ),
        program(
            7,
            "Active Fat Loss",
            "Cardio-led program with strength to keep muscle during weight loss.",
            60,
            40,
            "Deficit of 400 kcal; protein at every meal, avoid sugary drinks.",
            [
                "Brisk walk 45 min",
                "Strength: full body",
                "Cycling 40 min",
                "Strength: full body",
                "Swimming 30 min",
                "Brisk walk 60 min",
                "Rest",
            ],
            &["brisk_walk", "squat", "pushup", "cycling", "swimming"],
        ),
        program(
            8,
            "Metabolic Conditioning",
            "Frequent moderate cardio and light circuits to lower body fat.",
            70,
            30,
            "Deficit of 500 kcal; reduce refined carbohydrates, plenty of vegetables.",
            [
                "Cycling 45 min",
                "Light circuit",
                "Brisk walk 60 min",
                "Swimming 30 min",
                "Light circuit",
                "Brisk walk 60 min",
                "Stretching",
            ],
            &["cycling", "brisk_walk", "swimming", "lunge", "plank", "stretching"],
        ),
        program(
            9,
            "Low-Impact Progression",
            "Joint-friendly cardio building up duration week by week.",
            70,
            30,
            "Deficit of 500 kcal; portion control, regular meal times.",
            [
                "Brisk walk 30 min",
                "Swimming 30 min",
                "Bodyweight strength",
                "Cycling 30 min",
                "Brisk walk 40 min",
                "Bodyweight strength",
                "Rest",
            ],
            &["brisk_walk", "swimming", "cycling", "pushup", "plank"],
        ),
        program(
            10,
            "Gentle Start",
            "Very low impact activity to build the habit safely.",
            80,
            20,
            "Gradual deficit; replace processed food with whole food, consult a dietitian.",
            [
                "Brisk walk 20 min",
                "Stretching",
                "Swimming 20 min",
                "Rest",
                "Cycling 20 min",
                "Yoga flow",
                "Rest",
            ],
            &["brisk_walk", "stretching", "swimming", "cycling", "yoga_flow"],
        ),
    ] {
        programs.insert(prog.id, prog);
    }

    Catalog {
        programs,
        exercises,
    }
}

impl Catalog {
    /// Look up a program
    pub fn program(&self, id: ProgramId) -> Result<&Program> {
        self.programs
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("program {}", id)))
    }

    /// Look up an exercise
    pub fn exercise(&self, id: &str) -> Result<&Exercise> {
        self.exercises
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("exercise '{}'", id)))
    }

    /// Exercises referenced by a program, skipping dangling ids
    pub fn exercises_for(&self, program: &Program) -> Vec<&Exercise> {
        program
            .exercise_ids
            .iter()
            .filter_map(|id| self.exercises.get(id))
            .collect()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, exercise) in &self.exercises {
            if id.is_empty() || exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if id != &exercise.id {
                errors.push(format!(
                    "Exercise key '{}' doesn't match exercise.id '{}'",
                    id, exercise.id
                ));
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", id));
            }
        }

        for (id, program) in &self.programs {
            if id != &program.id {
                errors.push(format!(
                    "Program key '{}' doesn't match program.id '{}'",
                    id, program.id
                ));
            }
            errors.extend(self.program_errors(program));
        }

        errors
    }

    /// Problems with a single program against this catalog's exercises
    fn program_errors(&self, program: &Program) -> Vec<String> {
        let mut errors = Vec::new();
        let id = program.id;

        if program.name.trim().is_empty() {
            errors.push(format!("Program '{}' has empty name", id));
        }
        let total = u16::from(program.cardio_percent) + u16::from(program.weights_percent);
        if total != 100 {
            errors.push(format!(
                "Program '{}': cardio {}% + weights {}% = {}%, expected 100%",
                id, program.cardio_percent, program.weights_percent, total
            ));
        }

        // Check that all referenced exercises exist
        for exercise_id in &program.exercise_ids {
            if !self.exercises.contains_key(exercise_id) {
                errors.push(format!(
                    "Program '{}' references non-existent exercise '{}'",
                    id, exercise_id
                ));
            }
        }

        errors
    }

    /// Check that every program the rule table can produce is in the catalog
    pub fn validate_against(&self, table: &RuleTable) -> Vec<String> {
        table
            .referenced_programs()
            .into_iter()
            .filter(|id| !self.programs.contains_key(id))
            .map(|id| format!("Rule table references program '{}' missing from catalog", id))
            .collect()
    }

    /// Insert or replace a program, returning the previous version
    ///
    /// The program is checked first; an invalid program leaves the catalog
    /// unchanged.
    pub fn upsert_program(&mut self, program: Program) -> Result<Option<Program>> {
        let errors = self.program_errors(&program);
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        tracing::debug!("Upserting program {}", program.id);
        Ok(self.programs.insert(program.id, program))
    }

    /// Remove a program unless the rule table can still resolve to it
    pub fn remove_program(&mut self, id: ProgramId, table: &RuleTable) -> Result<Program> {
        if table.referenced_programs().contains(&id) {
            return Err(Error::CatalogValidation(format!(
                "program {} is still used by the rule table",
                id
            )));
        }
        self.programs
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("program {}", id)))
    }

    /// Insert or replace an exercise, returning the previous version
    pub fn upsert_exercise(&mut self, exercise: Exercise) -> Result<Option<Exercise>> {
        if exercise.id.is_empty() || exercise.name.is_empty() {
            return Err(Error::InvalidInput(
                "exercise id and name must not be empty".into(),
            ));
        }
        tracing::debug!("Upserting exercise {}", exercise.id);
        Ok(self.exercises.insert(exercise.id.clone(), exercise))
    }

    /// Remove an exercise unless a program still lists it
    pub fn remove_exercise(&mut self, id: &str) -> Result<Exercise> {
        let users: Vec<String> = self
            .programs
            .values()
            .filter(|p| p.exercise_ids.iter().any(|e| e == id))
            .map(|p| p.id.to_string())
            .collect();
        if !users.is_empty() {
            return Err(Error::CatalogValidation(format!(
                "exercise '{}' is used by {}",
                id,
                users.join(", ")
            )));
        }
        self.exercises
            .remove(id)
            .ok_or_else(|| Error::NotFound(format!("exercise '{}'", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: u8) -> ProgramId {
        ProgramId::new(n).unwrap()
    }

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.programs.len(), 10);
        assert_eq!(catalog.exercises.len(), 13);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_default_catalog_covers_builtin_rules() {
        let errors = get_default_catalog().validate_against(&RuleTable::builtin());
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_every_program_has_a_week() {
        for program in get_default_catalog().programs.values() {
            assert_eq!(program.schedule.len(), 7, "{}", program.id);
        }
    }

    #[test]
    fn test_bad_ratio_reported() {
        let mut catalog = build_default_catalog();
        let mut program = catalog.program(pid(5)).unwrap().clone();
        program.cardio_percent = 90;
        catalog.programs.insert(program.id, program);
        let errors = catalog.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("expected 100%"));
    }

    #[test]
    fn test_dangling_exercise_reported() {
        let mut catalog = build_default_catalog();
        let mut program = catalog.program(pid(1)).unwrap().clone();
        program.exercise_ids.push("handstand".into());
        catalog.programs.insert(program.id, program);
        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("handstand")));
    }

    #[test]
    fn test_upsert_program_checks_before_insert() {
        let mut catalog = build_default_catalog();
        let mut program = catalog.program(pid(5)).unwrap().clone();

        program.weights_percent = 10;
        let err = catalog.upsert_program(program.clone()).unwrap_err();
        assert!(err.to_string().contains("expected 100%"));
        assert_eq!(catalog.program(pid(5)).unwrap().weights_percent, 50);

        program.weights_percent = 50;
        program.exercise_ids.push("handstand".into());
        assert!(catalog.upsert_program(program.clone()).is_err());

        program.exercise_ids.pop();
        program.name = "Balanced Plus".into();
        let previous = catalog.upsert_program(program).unwrap();
        assert_eq!(previous.unwrap().name, "Balanced Fitness");
        assert_eq!(catalog.program(pid(5)).unwrap().name, "Balanced Plus");
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_removed_program_can_be_recreated() {
        let mut catalog = build_default_catalog();
        let only = RuleTable::builtin().bmi_only_rules();
        let table = RuleTable::new(&[], &only, pid(2), false).unwrap();
        let removed = catalog.remove_program(pid(3), &table).unwrap();

        assert!(catalog.upsert_program(removed).unwrap().is_none());
        assert!(catalog.program(pid(3)).is_ok());
    }

    #[test]
    fn test_remove_program_in_use_refused() {
        let mut catalog = build_default_catalog();
        let result = catalog.remove_program(pid(3), &RuleTable::builtin());
        assert!(matches!(result, Err(Error::CatalogValidation(_))));
        assert!(catalog.programs.contains_key(&pid(3)));
    }

    #[test]
    fn test_remove_unused_program() {
        let mut catalog = build_default_catalog();
        let only = RuleTable::builtin().bmi_only_rules();
        let table = RuleTable::new(&[], &only, pid(2), false).unwrap();
        let removed = catalog.remove_program(pid(3), &table).unwrap();
        assert_eq!(removed.id, pid(3));
        assert!(matches!(
            catalog.remove_program(pid(3), &table),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_exercise_crud() {
        let mut catalog = build_default_catalog();
        let rowing = Exercise {
            id: "rowing".into(),
            name: "Rowing Machine".into(),
            kind: ExerciseKind::Cardio,
            description: String::new(),
            reference_url: None,
        };
        assert!(catalog.upsert_exercise(rowing).unwrap().is_none());
        assert!(catalog.exercise("rowing").is_ok());

        let removed = catalog.remove_exercise("rowing").unwrap();
        assert_eq!(removed.name, "Rowing Machine");
        assert!(matches!(catalog.exercise("rowing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_remove_exercise_in_use_refused() {
        let mut catalog = build_default_catalog();
        let err = catalog.remove_exercise("brisk_walk").unwrap_err();
        assert!(err.to_string().contains("P10"));
    }

    #[test]
    fn test_empty_exercise_rejected() {
        let mut catalog = build_default_catalog();
        let blank = Exercise {
            id: String::new(),
            name: "x".into(),
            kind: ExerciseKind::Strength,
            description: String::new(),
            reference_url: None,
        };
        assert!(catalog.upsert_exercise(blank).is_err());
    }
}
