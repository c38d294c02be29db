//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a survey store and print the rows behind one route.
//! - Optionally run the startup sweep first.
//!
//! Usage: `fieldsurvey_cli [--config FILE] [--db PATH] [--sweep] <ROUTE> [SORT]`

use clap::Parser;
use fieldsurvey_core::{verify_state, StoreConfig, StoreError, SurveyStore, Value};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fieldsurvey_cli", about = "Print the rows behind one survey store route")]
struct Args {
    /// JSON store configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file; overrides `database_path` from the config.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Run the startup consistency sweep before querying.
    #[arg(long)]
    sweep: bool,

    /// Route to query, e.g. `campaigns/{urn}/surveys`.
    route: String,

    /// Sort order, e.g. `_id DESC`.
    sort: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error[{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), StoreError> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|err| {
                StoreError::Config(format!("cannot read `{}`: {err}", path.display()))
            })?;
            StoreConfig::from_json_str(&json)?
        }
        None => StoreConfig::in_memory(),
    };
    if let Some(db) = &args.db {
        config.database_path = Some(db.clone());
    }

    let store = SurveyStore::open(&config)?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        fieldsurvey_core::core_version()
    );

    if args.sweep {
        let report = verify_state(&store)?;
        eprintln!(
            "sweep reset={} purged={} violations={}",
            report.reset,
            report.purged,
            report.violations.len()
        );
    }

    let rows = store.query(&args.route, None, None, &[], args.sort.as_deref())?;
    println!("{}", rows.columns().join("\t"));
    for row in rows.rows() {
        let cells = row.values().iter().map(render).collect::<Vec<_>>();
        println!("{}", cells.join("\t"));
    }
    eprintln!("{} row(s)", rows.len());
    Ok(())
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(value) => value.replace(['\t', '\n'], " "),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}
