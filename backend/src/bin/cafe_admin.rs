//! Cafeteria Administration - command line tool
//!
//! Exit codes: 0 success, 2 invalid input, 3 not found, 1 anything else.

use std::process::ExitCode;

use cafe_backend::{
    connect_pool,
    error::{AppError, AppResult},
    init_tracing,
    services::{ScheduleService, SeedService},
    Config, DEFAULT_LOG_FILTER, MIGRATOR,
};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cafe-admin", about = "Cafeteria administration commands", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default shift for every day of an employee's week
    #[command(name = "generate_week_schedule")]
    GenerateWeekSchedule {
        /// First day of the week, YYYY-MM-DD
        week_start: String,
        /// Employee id
        employee_id: String,
    },
    /// Load the sample dataset
    #[command(name = "seed_fixture")]
    SeedFixture,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.log, DEFAULT_LOG_FILTER);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli, config: Config) -> AppResult<()> {
    // Parse arguments before touching the database
    let command = Command::parse(cli.command)?;

    let db = connect_pool(&config.database).await?;
    MIGRATOR
        .run(&db)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

    match command {
        Command::GenerateWeekSchedule { week_start, employee_id } => {
            generate_week_schedule(db, &config, week_start, employee_id, cli.json).await
        }
        Command::SeedFixture => seed_fixture(db, cli.json).await,
    }
}

/// Validated command arguments
enum Command {
    GenerateWeekSchedule { week_start: NaiveDate, employee_id: Uuid },
    SeedFixture,
}

impl Command {
    fn parse(command: Commands) -> AppResult<Self> {
        match command {
            Commands::GenerateWeekSchedule { week_start, employee_id } => {
                Ok(Command::GenerateWeekSchedule {
                    week_start: parse_date(&week_start)?,
                    employee_id: parse_employee_id(&employee_id)?,
                })
            }
            Commands::SeedFixture => Ok(Command::SeedFixture),
        }
    }
}

fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(format!("'{}' is not a date in YYYY-MM-DD format", raw)))
}

fn parse_employee_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::validation("employee_id", format!("'{}' is not a valid employee id", raw)))
}

async fn generate_week_schedule(
    db: PgPool,
    config: &Config,
    week_start: NaiveDate,
    employee_id: Uuid,
    json: bool,
) -> AppResult<()> {
    let summary = ScheduleService::new(db, &config.schedule)
        .generate_week(week_start, employee_id)
        .await?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Week of {}: {} cells created, {} already present",
            week_start, summary.created, summary.already_present
        );
    }
    Ok(())
}

async fn seed_fixture(db: PgPool, json: bool) -> AppResult<()> {
    let summary = SeedService::new(db).seed_fixture().await?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Fixture loaded: {} employees, {} supplies, {} products, {} recipe items, {} customers created",
            summary.employees, summary.supplies, summary.products, summary.recipe_items, summary.customers
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(format!("JSON rendering failed: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-04").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        let err = parse_date("04/03/2024").unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_parse_employee_id() {
        assert!(parse_employee_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_employee_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_cli_uses_snake_case_command_names() {
        let cli = Cli::try_parse_from([
            "cafe-admin",
            "generate_week_schedule",
            "2024-03-04",
            "0b7c1c6e-8f7e-4a39-9d43-2f1f3f1a2b3c",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::GenerateWeekSchedule { .. }));

        let cli = Cli::try_parse_from(["cafe-admin", "--json", "seed_fixture"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::SeedFixture));
    }
}
