use clap::{Args, Parser, Subcommand};
use fitplan_core::csv_rollup::{cleanup_processed_wals, wal_to_csv_and_archive};
use fitplan_core::history::{for_user, program_counts};
use fitplan_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fitplan")]
#[command(about = "Exercise program recommendations from body metrics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the standard one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a program and record the consultation
    Consult {
        /// Weight in kilograms
        #[arg(long)]
        weight: f64,

        /// Height in centimetres
        #[arg(long)]
        height: f64,

        /// Body fat percentage; omit for a BMI-only consultation
        #[arg(long)]
        body_fat: Option<f64>,

        /// Sex (male, female); taken from the user profile with --user
        #[arg(long)]
        sex: Option<Sex>,

        /// Registered user to record the consultation for
        #[arg(long)]
        user: Option<u32>,

        /// Show the recommendation without recording it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the BMI and body-fat categories for measurements
    Classify {
        #[arg(long)]
        weight: f64,

        #[arg(long)]
        height: f64,

        #[arg(long, requires = "sex")]
        body_fat: Option<f64>,

        #[arg(long)]
        sex: Option<Sex>,
    },

    /// Manage the program catalog
    Programs {
        #[command(subcommand)]
        command: ProgramCommand,
    },

    /// Manage the exercise library
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommand,
    },

    /// Manage registered users
    Users {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Inspect and edit the rule table
    Rules {
        #[command(subcommand)]
        command: RuleCommand,
    },

    /// Show recent consultations
    History {
        /// How many days back to look
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Only this user's consultations
        #[arg(long)]
        user: Option<u32>,
    },

    /// Roll up WAL consultations to CSV
    Rollup {
        /// Clean up processed WAL files after rollup
        #[arg(long)]
        cleanup: bool,
    },
}

#[derive(Subcommand)]
enum ProgramCommand {
    List,
    Show { id: ProgramId },
    /// Add a program that is not in the catalog yet
    Add {
        id: ProgramId,
        name: String,
        #[command(flatten)]
        details: ProgramDetails,
    },
    /// Change fields of an existing program
    Edit {
        id: ProgramId,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        details: ProgramDetails,
    },
    Remove { id: ProgramId },
}

#[derive(Args)]
struct ProgramDetails {
    #[arg(long)]
    description: Option<String>,

    #[arg(long)]
    diet: Option<String>,

    /// Cardio share in percent; with --weights must total 100
    #[arg(long)]
    cardio: Option<u8>,

    #[arg(long)]
    weights: Option<u8>,

    /// Exercise id (repeatable); replaces the program's list
    #[arg(long = "exercise")]
    exercises: Vec<String>,

    /// Schedule entry as DAY=ACTIVITY (repeatable); replaces the week
    #[arg(long = "schedule", value_parser = parse_schedule_entry)]
    schedule: Vec<ScheduleEntry>,
}

impl ProgramDetails {
    fn apply(self, program: &mut Program) {
        if let Some(description) = self.description {
            program.description = description;
        }
        if let Some(diet) = self.diet {
            program.diet = diet;
        }
        if let Some(cardio) = self.cardio {
            program.cardio_percent = cardio;
        }
        if let Some(weights) = self.weights {
            program.weights_percent = weights;
        }
        if !self.exercises.is_empty() {
            program.exercise_ids = self.exercises;
        }
        if !self.schedule.is_empty() {
            program.schedule = self.schedule;
        }
    }
}

fn parse_schedule_entry(s: &str) -> std::result::Result<ScheduleEntry, String> {
    match s.split_once('=') {
        Some((day, activity)) if !day.trim().is_empty() && !activity.trim().is_empty() => {
            Ok(ScheduleEntry {
                day: day.trim().to_string(),
                activity: activity.trim().to_string(),
            })
        }
        _ => Err(format!("expected DAY=ACTIVITY, got '{}'", s)),
    }
}

#[derive(Subcommand)]
enum ExerciseCommand {
    List,
    Add {
        id: String,
        name: String,
        #[arg(long)]
        kind: ExerciseKind,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        url: Option<String>,
    },
    Remove { id: String },
}

#[derive(Subcommand)]
enum UserCommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        sex: Sex,
    },
    Rename { id: u32, name: String },
    /// Change the sex used for body-fat classification
    SetSex { id: u32, sex: Sex },
    Remove { id: u32 },
}

#[derive(Subcommand)]
enum RuleCommand {
    /// Print both tables and the fallback program
    List,
    /// Report uncovered pairs and programs missing from the catalog
    Check,
    /// Map a (BMI, body-fat) pair to a program
    Set {
        bmi: BmiCategory,
        body_fat: BodyFatCategory,
        program: ProgramId,
    },
    /// Remove the rule for a pair, leaving it to the fallback
    Unset {
        bmi: BmiCategory,
        body_fat: BodyFatCategory,
    },
    /// Set the program for a BMI-only consultation
    SetBmiOnly { bmi: BmiCategory, program: ProgramId },
    /// Set the fallback program
    SetFallback { program: ProgramId },
}

/// File locations under the data directory
struct Paths {
    catalog: PathBuf,
    users: PathBuf,
    wal_dir: PathBuf,
    wal: PathBuf,
    csv: PathBuf,
}

impl Paths {
    fn new(data_dir: &Path) -> Self {
        let wal_dir = data_dir.join("wal");
        Self {
            catalog: data_dir.join("catalog.json"),
            users: data_dir.join("users.json"),
            wal: wal_dir.join("consultations.wal"),
            wal_dir,
            csv: data_dir.join("consultations.csv"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        fitplan_core::logging::init();
    } else {
        fitplan_core::logging::init_with_level("warn");
    }

    let config = Config::load_or_default(cli.config.as_deref())?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());
    let paths = Paths::new(&data_dir);

    match cli.command {
        Commands::Consult {
            weight,
            height,
            body_fat,
            sex,
            user,
            dry_run,
        } => {
            let input = Measurements {
                weight,
                height,
                body_fat,
                sex,
                user,
            };
            cmd_consult(&paths, &config, input, dry_run)
        }
        Commands::Classify {
            weight,
            height,
            body_fat,
            sex,
        } => cmd_classify(weight, height, body_fat, sex),
        Commands::Programs { command } => cmd_programs(&paths, &config, command),
        Commands::Exercises { command } => cmd_exercises(&paths, command),
        Commands::Users { command } => cmd_users(&paths, command),
        Commands::Rules { command } => {
            let config_path = match cli.config {
                Some(path) => path,
                None => Config::default_config_path()?,
            };
            cmd_rules(&paths, config, &config_path, command)
        }
        Commands::History { days, user } => cmd_history(&paths, days, user),
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
    }
}

struct Measurements {
    weight: f64,
    height: f64,
    body_fat: Option<f64>,
    sex: Option<Sex>,
    user: Option<u32>,
}

/// Load the catalog and check it against the rule table
fn load_checked_catalog(paths: &Paths, table: &RuleTable) -> Result<Catalog> {
    let catalog = Catalog::load(&paths.catalog)?;
    let mut errors = catalog.validate();
    errors.extend(catalog.validate_against(table));
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn cmd_consult(paths: &Paths, config: &Config, input: Measurements, dry_run: bool) -> Result<()> {
    let table = config.rules.build_table()?;
    let catalog = load_checked_catalog(paths, &table)?;

    let sex = match (input.sex, input.user) {
        (Some(sex), _) => sex,
        (None, Some(user_id)) => UserDirectory::load(&paths.users)?.get(user_id)?.sex,
        (None, None) => {
            return Err(Error::InvalidInput(
                "either --sex or --user is required".into(),
            ))
        }
    };
    if let Some(user_id) = input.user {
        // Fails early for unknown users even when --sex was given
        UserDirectory::load(&paths.users)?.get(user_id)?;
    }

    let consultation_input = ConsultationInput {
        weight_kg: input.weight,
        height_cm: input.height,
        sex,
        body_fat_percent: input.body_fat,
    };
    let result = consult(&table, &consultation_input)?;

    tracing::info!(
        "Resolved {:?} to {} (fallback: {})",
        result.condition,
        result.resolution.program,
        result.resolution.fallback
    );

    let program = catalog.program(result.resolution.program)?;
    display_consultation(&result, &table);
    display_program(program, &catalog);

    if dry_run {
        println!("\n[Dry run - not recording consultation]");
        return Ok(());
    }

    let record = ConsultationRecord {
        id: uuid::Uuid::new_v4(),
        user_id: input.user,
        consulted_at: chrono::Utc::now(),
        input: consultation_input,
        bmi: result.bmi,
        condition: result.condition,
        program: result.resolution.program,
        fallback: result.resolution.fallback,
    };

    std::fs::create_dir_all(&paths.wal_dir)?;
    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&record)?;

    println!("\n✓ Consultation recorded");
    Ok(())
}

fn cmd_classify(weight: f64, height: f64, body_fat: Option<f64>, sex: Option<Sex>) -> Result<()> {
    let bmi = compute_bmi(weight, height)?;
    let category = BmiCategory::from_bmi(bmi);
    println!(
        "BMI: {:.1} → {} ({}, {})",
        bmi,
        category,
        category.code(),
        category.range_label()
    );

    if let (Some(percent), Some(sex)) = (body_fat, sex) {
        let body_fat_category = classify_body_fat(percent, sex)?;
        println!(
            "Body fat: {:.1}% ({}) → {} ({})",
            percent,
            sex,
            body_fat_category,
            body_fat_category.code()
        );
    }
    Ok(())
}

fn cmd_programs(paths: &Paths, config: &Config, command: ProgramCommand) -> Result<()> {
    match command {
        ProgramCommand::List => {
            let catalog = Catalog::load(&paths.catalog)?;
            for program in catalog.programs.values() {
                println!(
                    "{:<4} {:<26} cardio {:>3}% / weights {:>3}%",
                    program.id.to_string(),
                    program.name,
                    program.cardio_percent,
                    program.weights_percent
                );
            }
        }
        ProgramCommand::Show { id } => {
            let catalog = Catalog::load(&paths.catalog)?;
            display_program(catalog.program(id)?, &catalog);
        }
        ProgramCommand::Add { id, name, details } => {
            let mut program = Program {
                id,
                name,
                description: String::new(),
                schedule: Vec::new(),
                diet: String::new(),
                cardio_percent: 0,
                weights_percent: 0,
                exercise_ids: Vec::new(),
            };
            details.apply(&mut program);
            Catalog::update(&paths.catalog, |catalog| {
                if catalog.programs.contains_key(&id) {
                    return Err(Error::InvalidInput(format!(
                        "program {} already exists; use `programs edit`",
                        id
                    )));
                }
                catalog.upsert_program(program)
            })?;
            println!("✓ Added program {}", id);
        }
        ProgramCommand::Edit { id, name, details } => {
            Catalog::update(&paths.catalog, |catalog| {
                let mut program = catalog.program(id)?.clone();
                if let Some(name) = name {
                    program.name = name;
                }
                details.apply(&mut program);
                catalog.upsert_program(program)
            })?;
            println!("✓ Updated program {}", id);
        }
        ProgramCommand::Remove { id } => {
            let table = config.rules.build_table()?;
            let removed = Catalog::update(&paths.catalog, |catalog| {
                catalog.remove_program(id, &table)
            })?;
            println!("✓ Removed program {} ({})", removed.id, removed.name);
        }
    }
    Ok(())
}

fn cmd_exercises(paths: &Paths, command: ExerciseCommand) -> Result<()> {
    match command {
        ExerciseCommand::List => {
            let catalog = Catalog::load(&paths.catalog)?;
            for exercise in catalog.exercises.values() {
                println!(
                    "{:<14} {:<22} {}",
                    exercise.id, exercise.name, exercise.kind
                );
            }
        }
        ExerciseCommand::Add {
            id,
            name,
            kind,
            description,
            url,
        } => {
            let exercise = Exercise {
                id: id.clone(),
                name,
                kind,
                description,
                reference_url: url,
            };
            let previous =
                Catalog::update(&paths.catalog, |catalog| catalog.upsert_exercise(exercise))?;
            if previous.is_some() {
                println!("✓ Updated exercise {}", id);
            } else {
                println!("✓ Added exercise {}", id);
            }
        }
        ExerciseCommand::Remove { id } => {
            let removed = Catalog::update(&paths.catalog, |catalog| catalog.remove_exercise(&id))?;
            println!("✓ Removed exercise {} ({})", removed.id, removed.name);
        }
    }
    Ok(())
}

fn cmd_users(paths: &Paths, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::List => {
            let directory = UserDirectory::load(&paths.users)?;
            if directory.list().is_empty() {
                println!("No users registered.");
            }
            for user in directory.list() {
                println!(
                    "{:>4}  {:<24} {:<6} since {}",
                    user.id,
                    user.name,
                    user.sex,
                    user.created_at.format("%Y-%m-%d")
                );
            }
        }
        UserCommand::Add { name, sex } => {
            let id = UserDirectory::update(&paths.users, |dir| dir.add(&name, sex))?;
            println!("✓ Added user {} ({})", id, name.trim());
        }
        UserCommand::Rename { id, name } => {
            UserDirectory::update(&paths.users, |dir| dir.rename(id, &name))?;
            println!("✓ Renamed user {}", id);
        }
        UserCommand::SetSex { id, sex } => {
            UserDirectory::update(&paths.users, |dir| dir.set_sex(id, sex))?;
            println!("✓ User {} is now {}", id, sex);
        }
        UserCommand::Remove { id } => {
            let removed = UserDirectory::update(&paths.users, |dir| dir.remove(id))?;
            println!("✓ Removed user {} ({})", removed.id, removed.name);
        }
    }
    Ok(())
}

fn cmd_rules(paths: &Paths, mut config: Config, config_path: &Path, command: RuleCommand) -> Result<()> {
    match command {
        RuleCommand::List => {
            let table = config.rules.build_table()?;
            display_rule_table(&table);
            return Ok(());
        }
        RuleCommand::Check => {
            let table = config.rules.build_table()?;
            let catalog = Catalog::load(&paths.catalog)?;
            let gaps = table.gaps();
            if gaps.is_empty() {
                println!("All 12 pairs have a rule.");
            } else {
                println!("{} pair(s) resolve to fallback {}:", gaps.len(), table.fallback());
                for (bmi, body_fat) in gaps {
                    println!("  - {} / {}", bmi, body_fat);
                }
            }
            let errors = catalog.validate_against(&table);
            for error in &errors {
                println!("  ! {}", error);
            }
            if !errors.is_empty() {
                return Err(Error::CatalogValidation(
                    "rule table references missing programs".into(),
                ));
            }
            return Ok(());
        }
        RuleCommand::Set {
            bmi,
            body_fat,
            program,
        } => {
            config.rules.set_rule(ProgramRule {
                bmi,
                body_fat,
                program,
            });
            println!("✓ {} / {} → {}", bmi, body_fat, program);
        }
        RuleCommand::Unset { bmi, body_fat } => {
            if config.rules.unset_rule(bmi, body_fat)? {
                println!("✓ Removed rule for {} / {}", bmi, body_fat);
            } else {
                println!("No rule for {} / {}", bmi, body_fat);
            }
        }
        RuleCommand::SetBmiOnly { bmi, program } => {
            config.rules.set_bmi_only(bmi, program);
            println!("✓ {} (BMI only) → {}", bmi, program);
        }
        RuleCommand::SetFallback { program } => {
            config.rules.fallback = program;
            println!("✓ Fallback → {}", program);
        }
    }

    // Only write configurations that still build a valid table
    config.rules.build_table()?;
    config.save_to(config_path)
}

fn cmd_history(paths: &Paths, days: u32, user: Option<u32>) -> Result<()> {
    let records = load_recent(&paths.wal, &paths.csv, days)?;
    let shown: Vec<&ConsultationRecord> = match user {
        Some(user_id) => for_user(&records, user_id),
        None => records.iter().collect(),
    };

    if shown.is_empty() {
        println!("No consultations in the last {} days.", days);
        return Ok(());
    }

    for record in &shown {
        let body_fat = record
            .condition
            .body_fat()
            .map(|c| c.label())
            .unwrap_or("-");
        println!(
            "{}  BMI {:>5.1} {:<11} BF {:<6} → {}{}",
            record.consulted_at.format("%Y-%m-%d %H:%M"),
            record.bmi,
            record.condition.bmi().label(),
            body_fat,
            record.program,
            if record.fallback { " (fallback)" } else { "" }
        );
    }

    let owned: Vec<ConsultationRecord> = shown.into_iter().cloned().collect();
    println!();
    for (program, count) in program_counts(&owned) {
        println!("  {}: {}", program, count);
    }
    Ok(())
}

fn cmd_rollup(paths: &Paths, cleanup: bool) -> Result<()> {
    if !paths.wal.exists() {
        println!("No WAL file found - nothing to roll up.");
        return Ok(());
    }

    let count = wal_to_csv_and_archive(&paths.wal, &paths.csv)?;

    println!("✓ Rolled up {} consultations to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = cleanup_processed_wals(&paths.wal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed WAL files", cleaned);
        }
    }

    Ok(())
}

fn display_consultation(result: &Consultation, table: &RuleTable) {
    let bmi = result.condition.bmi();
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  CONSULTATION");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  BMI: {:.1} → {} ({})", result.bmi, bmi, bmi.code());
    match result.condition.body_fat() {
        Some(body_fat) => println!("  Body fat: {} ({})", body_fat, body_fat.code()),
        None => println!("  Body fat: not measured (BMI-only recommendation)"),
    }
    if result.resolution.fallback {
        println!(
            "  No rule for this combination; using default program {}",
            table.fallback()
        );
    }
    println!();
}

fn display_program(program: &Program, catalog: &Catalog) {
    println!("  {}: {}", program.id, program.name);
    println!("  {}", program.description);
    println!(
        "  Cardio {}% / Weights {}%",
        program.cardio_percent, program.weights_percent
    );
    println!();
    for entry in &program.schedule {
        println!("  {:<10} {}", entry.day, entry.activity);
    }
    println!();
    println!("  Diet: {}", program.diet);

    let exercises = catalog.exercises_for(program);
    if !exercises.is_empty() {
        println!();
        for exercise in exercises {
            match &exercise.reference_url {
                Some(url) => println!("  → {} ({})", exercise.name, url),
                None => println!("  → {}", exercise.name),
            }
        }
    }
}

fn display_rule_table(table: &RuleTable) {
    print!("{:<12}", "BMI \\ BF");
    for body_fat in BodyFatCategory::ALL {
        print!(" {:<8}", body_fat.label());
    }
    println!(" {:<8}", "BMI only");

    for bmi in BmiCategory::ALL {
        print!("{:<12}", bmi.label());
        for body_fat in BodyFatCategory::ALL {
            let cell = table
                .lookup(bmi, body_fat)
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string());
            print!(" {:<8}", cell);
        }
        println!(" {:<8}", table.lookup_bmi_only(bmi).to_string());
    }
    println!();
    println!("Fallback: {}", table.fallback());
}
