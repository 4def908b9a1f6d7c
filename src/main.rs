use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use household_ledger::{
    clock::SystemClock,
    config::{self, database},
    core::{ActualInput, Ledger},
    errors::Result,
    events::LogNotifier,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Monthly household ledger: summaries, month closing and actual entry.
#[derive(Debug, Parser)]
#[command(name = "household-ledger", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize a month (YYYY-MM), or the working month when omitted
    Summary {
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Make sure a month (YYYY-MM) has a dashboard and print its id
    Open {
        #[arg(value_parser = parse_month)]
        month: NaiveDate,
    },
    /// Close an open month
    Approve { dashboard: i64 },
    /// Reopen a closed month
    CancelApprove { dashboard: i64 },
    /// Overwrite the carried balance of a closed month
    AdjustBalance {
        dashboard: i64,
        #[arg(allow_negative_numbers = true)]
        balance: i64,
    },
    /// Record the actual amount of a plan for a month
    Enter {
        #[arg(long, value_parser = parse_month)]
        month: NaiveDate,
        #[arg(long)]
        plan: i64,
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        #[arg(long)]
        dashboard: Option<i64>,
        #[arg(long)]
        actual: Option<i64>,
    },
    /// Show a plan with its recorded amount
    Detail {
        #[arg(long)]
        plan: i64,
        #[arg(long)]
        dashboard: Option<i64>,
        #[arg(long)]
        actual: Option<i64>,
    },
}

fn parse_month(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM: {e}"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();

    // 3. Load settings, then the database
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {e}"))?;
    let offset = app_config.offset()?;

    database::ensure_database_dir(&app_config.database_url)?;
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    let ledger = Ledger::from_connection(
        db,
        Arc::new(SystemClock::new(offset)),
        Arc::new(LogNotifier),
        app_config.income_category,
    );

    run(&ledger, cli.command)
        .await
        .inspect_err(|e| error!("Command failed ({:?}): {e}", e.kind()))
}

async fn run(ledger: &Ledger, command: Command) -> Result<()> {
    match command {
        Command::Summary { month } => print_json(&ledger.summarize(month).await?),
        Command::Open { month } => print_json(&ledger.open_month(month).await?),
        Command::Approve { dashboard } => ledger.approve(dashboard).await,
        Command::CancelApprove { dashboard } => ledger.cancel_approve(dashboard).await,
        Command::AdjustBalance { dashboard, balance } => {
            ledger.adjust_balance(dashboard, balance).await
        }
        Command::Enter {
            month,
            plan,
            amount,
            dashboard,
            actual,
        } => {
            let entry = ledger
                .enter_actual(ActualInput {
                    month,
                    plan_id: plan,
                    dashboard_id: dashboard,
                    actual_id: actual,
                    amount,
                })
                .await?;
            print_json(&entry)
        }
        Command::Detail {
            plan,
            dashboard,
            actual,
        } => print_json(&ledger.actual_detail(plan, dashboard, actual).await?),
    }
}
