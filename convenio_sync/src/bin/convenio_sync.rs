use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use convenio_sync::input::{DEFAULT_ACCEPTANCE_FILE, DEFAULT_PRICES_FILE};
use convenio_sync::store::sqlite::SqliteStore;
use convenio_sync::{ImportError, ImportInput, Pipeline, aliases, load_resolver, logging};

#[derive(Parser)]
#[command(version, about = "Partner/site spreadsheet importer")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Import both exports into the database.
    Import {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        db: DbArgs,
    },
    /// Show how every label in the exports resolves, without touching the database.
    Aliases {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Summarize what is stored.
    Verify {
        #[command(flatten)]
        db: DbArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Price export (Convenio, VACINAS, Preco).
    #[arg(long, value_name = "FILE", default_value = DEFAULT_PRICES_FILE)]
    prices: PathBuf,
    /// Acceptance export (Convênios, Unidade, Aceita).
    #[arg(long, value_name = "FILE", default_value = DEFAULT_ACCEPTANCE_FILE)]
    acceptance: PathBuf,
    /// Alias TOML replacing the built-in tables.
    #[arg(long, value_name = "FILE")]
    aliases: Option<PathBuf>,
}

#[derive(Args)]
struct DbArgs {
    /// SQLite database; defaults to $DATABASE_URL.
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,
}

fn open_store(db: DbArgs) -> Result<SqliteStore, ImportError> {
    let url = match db.database_url {
        Some(url) => url,
        None => shared_utils::get_env_var("DATABASE_URL")
            .map_err(|e| ImportError::StoreUnavailable(e.to_string()))?,
    };
    SqliteStore::connect(&url).map_err(|e| ImportError::StoreUnavailable(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing("info")?;

    match cli.cmd {
        Cmd::Import { input, db } => {
            let resolver = load_resolver(input.aliases.as_deref())?;
            let store = open_store(db)?;
            let rows = ImportInput::read(&input.prices, &input.acceptance)?;

            let summary = Pipeline::new(&store, &resolver)
                .run(&rows)
                .await
                .context("import aborted")?;
            println!("{summary}");
        }
        Cmd::Aliases { input } => {
            let resolver = load_resolver(input.aliases.as_deref())?;
            let rows = ImportInput::read(&input.prices, &input.acceptance)?;
            let report = aliases::coverage(&resolver, &rows.prices, &rows.acceptance);
            print!("{report}");
        }
        Cmd::Verify { db } => {
            let store = open_store(db)?;
            let report = store.verify_report().await?;
            println!("{report}");
        }
    }

    Ok(())
}
