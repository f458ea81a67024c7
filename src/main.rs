use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mte_service::io::excel_write;
use mte_service::server::{self, AppState};
use mte_service::{AirtableClient, AirtableConfig, Config, MteError, Result, Store, ensure_store};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    init_tracing()?;
    match cli.command {
        Command::Serve(args) => execute_serve(args).await,
        Command::Load(args) => execute_load(args),
        Command::Template(args) => execute_template(args),
    }
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| MteError::Logging(error.to_string()))
}

async fn execute_serve(args: ServeArgs) -> Result<()> {
    let config = args
        .store
        .into_config()
        .with_bind(args.bind)
        .with_static_dir(args.static_dir)
        .with_airtable(AirtableConfig::from_env());
    config.trace_loaded();

    ensure_store(&config)?;

    let airtable = AirtableClient::new(config.airtable.clone())?;
    let state = AppState::new(Store::new(&config.database_path), airtable);
    let app = server::router(state, config.static_dir.as_deref());
    let listener = TcpListener::bind(config.bind).await?;
    server::serve(listener, app).await
}

fn execute_load(args: StoreArgs) -> Result<()> {
    let config = args.into_config();
    let outcome = ensure_store(&config)?;
    println!("{outcome}");
    Ok(())
}

fn execute_template(args: TemplateArgs) -> Result<()> {
    if args.output.exists() && !args.force {
        return Err(MteError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", args.output.display()),
        )));
    }
    excel_write::write_template(&args.output)?;
    info!(output = %args.output.display(), "template written");
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Look up variant MTE values and sum them over a JSON API."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the database if needed, then serve the API.
    Serve(ServeArgs),
    /// Build the database from the workbook if it does not exist yet.
    Load(StoreArgs),
    /// Write an empty workbook with the expected sheets and headers.
    Template(TemplateArgs),
}

#[derive(clap::Args)]
struct StoreArgs {
    /// SQLite database file.
    #[arg(long, env = "MTE_DATABASE", default_value = "mte_data.db")]
    database: PathBuf,

    /// Workbook used to build the database when it is missing.
    #[arg(long, env = "MTE_WORKBOOK", default_value = "database.xlsx")]
    workbook: PathBuf,
}

impl StoreArgs {
    fn into_config(self) -> Config {
        Config::new(self.database, self.workbook)
    }
}

#[derive(clap::Args)]
struct ServeArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Address to listen on.
    #[arg(long, env = "MTE_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Directory holding the front-end; `index.html` is served for unknown paths.
    #[arg(long, env = "MTE_STATIC_DIR")]
    static_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct TemplateArgs {
    /// Output workbook path.
    #[arg(long)]
    output: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}
