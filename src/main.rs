//! prepost CLI
//!
//! Entry point for the `prepost` command-line tool.

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use prepost::duck::{self, DuckCli};
use prepost::signal::SignalHandler;
use prepost::wait::{SystemClock, WaitSummary, Waiter};
use prepost::{cloud_client, datahub, horizon, logging, tasks};
use prepost::{EffectiveConfig, Settings, TaskError};

#[derive(Parser)]
#[command(name = "prepost")]
#[command(about = "Pre- and post-processing tasks for cloud simulations", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, short = 'c', global = true, env = "PREPOST_CONFIG")]
    config: Option<PathBuf>,

    /// Log diagnostics at debug level
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Seconds between status polls
    #[arg(long, global = true)]
    poll_interval: Option<u64>,

    /// Give up waiting after this many seconds
    #[arg(long, global = true)]
    deadline: Option<u64>,

    /// Retries of a failed status fetch
    #[arg(long, global = true)]
    fetch_retries: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for one simulation to finish
    WaitSimulation {
        /// Simulation id (default: the simulation_id setting)
        id: Option<String>,

        /// Exit non-zero unless the simulation completed successfully
        #[arg(long)]
        require_success: bool,

        /// Print the final record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Wait for every simulation of an execution, including late ones
    WaitExecution {
        /// Execution id
        id: String,

        /// Exit non-zero unless every simulation completed successfully
        #[arg(long)]
        require_success: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transfer files to or from the data hub
    Datahub {
        #[command(subcommand)]
        action: DatahubCommands,
    },

    /// Download all solution data of a solution
    DownloadSolution {
        /// Solution id
        solution_id: String,

        /// Target directory (default: output_path)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Create DuckDB views over a model's Parquet output
    ConfigureViews {
        /// Model name as listed in the directory mapping
        model: String,

        /// Skip printing each statement and a preview of each view
        #[arg(long)]
        quiet: bool,
    },

    /// Export the reporting extract to Parquet
    Report {
        /// Also write a CSV copy
        #[arg(long)]
        csv: bool,

        /// Date stamped in the file name, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print the sample series query and export it to Parquet
    SampleQuery,

    /// Export memberships from the reference database to CSV
    Memberships,

    /// Write the horizon parameter file
    Horizon {
        /// Model name
        model: String,

        /// TODAY or MM/DD/YY
        date: String,

        /// Output file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Print the simulation id and resolved paths
    Env,

    /// Print the effective configuration and its sources as JSON
    ShowConfig,

    /// List every file under a directory (default: simulation_path)
    ListFiles { dir: Option<PathBuf> },

    /// Remove workflow scratch files (default: the memberships extract)
    Clean { files: Vec<PathBuf> },

    /// Sleep in fixed intervals, printing the time after each
    Sleep {
        /// Total seconds
        #[arg(default_value_t = 300)]
        total: u64,

        /// Seconds per interval
        #[arg(default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },
}

#[derive(Subcommand)]
enum DatahubCommands {
    /// Download remote files matching a glob into output_path
    Download { pattern: String },

    /// Upload files under output_path matching a glob
    Upload { pattern: String, remote_path: String },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code().as_i32());
        }
    };

    if let Commands::ShowConfig = cli.command {
        match serde_json::to_string_pretty(&config) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        process::exit(0);
    }

    let settings = match config.settings() {
        Ok(s) => s,
        Err(e) => {
            let e = TaskError::from(e);
            eprintln!("{}", e);
            process::exit(e.exit_code().as_i32());
        }
    };

    // Tasks that always print "done", whatever the outcome
    let prints_done = matches!(
        cli.command,
        Commands::Datahub { .. }
            | Commands::ConfigureViews { .. }
            | Commands::Report { .. }
            | Commands::SampleQuery
            | Commands::Memberships
            | Commands::Clean { .. }
    );

    let result = run(cli.command, &settings);

    if let Err(e) = &result {
        eprintln!("{}", e);
    }
    if prints_done {
        println!("done");
    }

    match result {
        Ok(()) => process::exit(0),
        Err(e) => process::exit(e.exit_code().as_i32()),
    }
}

fn load_config(cli: &Cli) -> Result<EffectiveConfig, TaskError> {
    let mut poll = Map::new();
    if let Some(interval) = cli.poll_interval {
        poll.insert("interval_seconds".to_string(), json!(interval));
    }
    if let Some(deadline) = cli.deadline {
        poll.insert("deadline_seconds".to_string(), json!(deadline));
    }
    if let Some(retries) = cli.fetch_retries {
        poll.insert("fetch_retries".to_string(), json!(retries));
    }
    let overrides = if poll.is_empty() {
        None
    } else {
        Some(json!({ "poll": Value::Object(poll) }))
    };

    Ok(EffectiveConfig::build(
        cli.config.as_deref(),
        std::env::vars(),
        overrides,
    )?)
}

fn run(command: Commands, settings: &Settings) -> Result<(), TaskError> {
    match command {
        Commands::WaitSimulation {
            id,
            require_success,
            json,
        } => {
            let id = id
                .or_else(|| settings.simulation_id.clone())
                .ok_or_else(|| TaskError::Usage("A simulation id or the simulation_id setting is required".to_string()))?;
            run_wait_simulation(settings, &id, require_success, json)
        }
        Commands::WaitExecution {
            id,
            require_success,
            json,
        } => run_wait_execution(settings, &id, require_success, json),
        Commands::Datahub { action } => {
            let client = cloud_client(settings);
            match action {
                DatahubCommands::Download { pattern } => {
                    datahub::download(&client, &pattern, &settings.output_path)?;
                }
                DatahubCommands::Upload {
                    pattern,
                    remote_path,
                } => {
                    datahub::upload(&client, &pattern, &remote_path, &settings.output_path)?;
                }
            }
            Ok(())
        }
        Commands::DownloadSolution {
            solution_id,
            output,
        } => {
            let client = cloud_client(settings);
            let output = output.unwrap_or_else(|| settings.output_path.clone());
            datahub::download_solution_data(&client, &solution_id, &output)?;
            Ok(())
        }
        Commands::ConfigureViews { model, quiet } => {
            let runner = DuckCli::new(&settings.duckdb_cli_path);
            duck::configure_views(
                &runner,
                &settings.duck_db_path(),
                &settings.directory_map_path,
                &model,
                !quiet,
            )?;
            Ok(())
        }
        Commands::Report { csv, date } => {
            let runner = DuckCli::new(&settings.duckdb_cli_path);
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            duck::write_report(
                &runner,
                &settings.duck_db_path(),
                &settings.output_path,
                date,
                csv,
            )?;
            Ok(())
        }
        Commands::SampleQuery => {
            let runner = DuckCli::new(&settings.duckdb_cli_path);
            duck::sample_query(&runner, &settings.duck_db_path(), &settings.output_path)?;
            Ok(())
        }
        Commands::Memberships => {
            let runner = DuckCli::new(&settings.duckdb_cli_path);
            duck::write_memberships(
                &runner,
                &settings.reference_db_path(),
                &settings.memberships_csv_path(),
            )?;
            Ok(())
        }
        Commands::Horizon {
            model,
            date,
            output,
        } => {
            let date = horizon::parse_date(&date)?;
            horizon::write_horizon(&model, date, output.as_deref())?;
            Ok(())
        }
        Commands::Env => {
            tasks::print_environment(settings, &mut io::stdout().lock())?;
            println!("Done");
            Ok(())
        }
        Commands::ListFiles { dir } => {
            let dir = dir.unwrap_or_else(|| settings.simulation_path.clone());
            println!("Listing files under: {}", dir.display());
            for file in tasks::list_files(&dir)? {
                println!("{}", file.display());
            }
            Ok(())
        }
        Commands::Clean { files } => {
            let files = if files.is_empty() {
                vec![settings.memberships_csv_path()]
            } else {
                files
            };
            tasks::remove_files(&files)?;
            Ok(())
        }
        Commands::Sleep { total, interval } => {
            tasks::sleep_loop(
                Duration::from_secs(total),
                Duration::from_secs(interval),
                &SystemClock::new(),
            );
            Ok(())
        }
        Commands::ShowConfig => Ok(()),
    }
}

fn waiter(settings: &Settings) -> Result<Waiter, TaskError> {
    let handler = SignalHandler::new();
    if let Err(e) = handler.install() {
        tracing::warn!("Interrupt handler not installed: {}", e);
    }

    Ok(Waiter::new(cloud_client(settings), settings.poll_config()?).with_cancellation(handler.state()))
}

fn run_wait_simulation(
    settings: &Settings,
    id: &str,
    require_success: bool,
    json_output: bool,
) -> Result<(), TaskError> {
    let simulation = waiter(settings)?.wait_simulation(id)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&simulation).map_err(io::Error::other)?);
    }

    if require_success && !simulation.status.is_success() {
        return Err(TaskError::Unsuccessful(format!(
            "Simulation {} finished with status {}",
            id, simulation.status
        )));
    }
    Ok(())
}

fn run_wait_execution(
    settings: &Settings,
    id: &str,
    require_success: bool,
    json_output: bool,
) -> Result<(), TaskError> {
    let simulations = waiter(settings)?.wait_execution(id)?;
    let summary = WaitSummary::from_records(&simulations);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary).map_err(io::Error::other)?);
    } else {
        println!("Execution {}: {}", id, summary);
    }

    if require_success && !summary.all_succeeded() {
        return Err(TaskError::Unsuccessful(format!(
            "Execution {} has unsuccessful simulations: {}",
            id,
            summary
                .unsuccessful
                .iter()
                .chain(summary.unfinished.iter())
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    Ok(())
}
