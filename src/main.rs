use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use backoffice::Backoffice;
use backoffice::config::{ClientConfig, ConfigError};
use backoffice::error::{ApiError, ErrorCode};
use backoffice::net::types::{
    AnalyticsQuery, BookingQuery, BookingUpdate, Registration, Role, TourDetails, TourOrder,
    TourQuery,
};
use backoffice::route::{GuardDecision, Navigator, Route};
use backoffice::state::session::SessionError;
use backoffice::store::FileCredentialStore;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not logged in; run `backoffice login` first")]
    NotLoggedIn,
}

#[derive(Parser, Debug)]
#[command(name = "backoffice", about = "Travel agency back-office API and session CLI")]
struct Cli {
    /// API root; overrides BACKOFFICE_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Token file; overrides BACKOFFICE_TOKEN_FILE.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Request timeout; overrides BACKOFFICE_TIMEOUT_SECS.
    #[arg(long)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "BACKOFFICE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BACKOFFICE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        role: Option<Role>,
    },
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    Stats,
    Bookings(BookingsCommand),
    Tours(ToursCommand),
    Analytics {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
    },
    /// Restore the session and print the guard decision for a back-office path.
    Open { path: String },
}

#[derive(Args, Debug)]
struct BookingsCommand {
    #[command(subcommand)]
    command: BookingsSubcommand,
}

#[derive(Subcommand, Debug)]
enum BookingsSubcommand {
    List {
        #[arg(long)]
        estado: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        per_page: Option<u32>,
    },
    Show {
        id: i64,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Cancel {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct ToursCommand {
    #[command(subcommand)]
    command: ToursSubcommand,
}

#[derive(Subcommand, Debug)]
enum ToursSubcommand {
    Search(TourSearchArgs),
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct TourSearchArgs {
    #[arg(long)]
    q: Option<String>,
    #[arg(long)]
    continente: Option<String>,
    #[arg(long)]
    pais: Option<String>,
    #[arg(long)]
    categoria: Option<String>,
    #[arg(long)]
    tipo_viaje: Option<String>,
    #[arg(long)]
    precio_min: Option<f64>,
    #[arg(long)]
    precio_max: Option<f64>,
    #[arg(long)]
    destacados: Option<bool>,
    /// precio_asc, precio_desc, popularidad or recientes.
    #[arg(long)]
    order_by: Option<TourOrder>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    per_page: Option<u32>,
}

impl From<TourSearchArgs> for TourQuery {
    fn from(args: TourSearchArgs) -> Self {
        Self {
            q: args.q,
            continent: args.continente,
            country: args.pais,
            category: args.categoria,
            trip_type: args.tipo_viaje,
            price_min: args.precio_min,
            price_max: args.precio_max,
            featured_only: args.destacados,
            order_by: args.order_by,
            page: args.page,
            per_page: args.per_page,
        }
    }
}

/// Terminal stand-in for page navigation.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(to = route.path(), "redirect");
        if route == Route::Login {
            eprintln!("session ended; run `backoffice login` to sign in again");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let store = Arc::new(FileCredentialStore::new(config.token_file.clone()));
    let app = Backoffice::connect(&config, store, Arc::new(CliNavigator))?;

    let result = run(&app, cli.command).await;
    if let Err(CliError::Api(e) | CliError::Session(SessionError::Api(e))) = &result {
        tracing::debug!(code = e.error_code(), retryable = e.retryable(), "command failed");
    }
    result
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_lookup(|key| match key {
        "BACKOFFICE_API_URL" if cli.api_url.is_some() => cli.api_url.clone(),
        _ => std::env::var(key).ok(),
    })?;
    if let Some(path) = &cli.token_file {
        config = config.with_token_file(path);
    }
    if let Some(secs) = cli.timeout_secs.filter(|secs| *secs > 0) {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

async fn run(app: &Backoffice, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => {
            let user = app.session().login(&email, &password).await?;
            print_json(&user)
        }
        Command::Logout => {
            app.session().logout().await;
            print_json(&json!({ "success": true }))
        }
        Command::Whoami => {
            let session = app.session().restore().await;
            let user = session.user.ok_or(CliError::NotLoggedIn)?;
            print_json(&user)
        }
        Command::Register { name, email, password, role } => {
            let registration = Registration { name, email, password, role };
            let user = app.session().register(&registration).await?;
            print_json(&user)
        }
        Command::ResetPassword { email } => {
            let ack = app.session().request_password_reset(&email).await?;
            print_json(&ack)
        }
        Command::Stats => print_json(&app.admin().stats().await?),
        Command::Bookings(bookings) => run_bookings(app, bookings).await,
        Command::Tours(tours) => run_tours(app, tours).await,
        Command::Analytics { from, to } => {
            let report = app.admin().analytics(&AnalyticsQuery { from, to }).await?;
            print_json(&report)
        }
        Command::Open { path } => {
            app.session().restore().await;
            let decision = app.open(&path);
            print_json(&decision_json(&path, &decision))
        }
    }
}

async fn run_bookings(app: &Backoffice, bookings: BookingsCommand) -> Result<(), CliError> {
    let admin = app.admin();
    match bookings.command {
        BookingsSubcommand::List { estado, page, per_page } => {
            let query = BookingQuery { status: estado, page, per_page };
            print_json(&admin.list_bookings(&query).await?)
        }
        BookingsSubcommand::Show { id } => print_json(&admin.booking(id).await?),
        BookingsSubcommand::Update { id, data } => {
            let update: BookingUpdate = serde_json::from_str(&data)?;
            print_json(&admin.update_booking(id, &update).await?)
        }
        BookingsSubcommand::Cancel { id } => print_json(&admin.cancel_booking(id).await?),
    }
}

async fn run_tours(app: &Backoffice, tours: ToursCommand) -> Result<(), CliError> {
    let admin = app.admin();
    match tours.command {
        ToursSubcommand::Search(args) => print_json(&admin.search_tours(&args.into()).await?),
        ToursSubcommand::Show { id } => print_json(&admin.tour(id).await?),
        ToursSubcommand::Create { data } => {
            let details: TourDetails = serde_json::from_str(&data)?;
            print_json(&admin.create_tour(&details).await?)
        }
        ToursSubcommand::Update { id, data } => {
            let details: TourDetails = serde_json::from_str(&data)?;
            print_json(&admin.update_tour(id, &details).await?)
        }
        ToursSubcommand::Delete { id } => print_json(&admin.delete_tour(id).await?),
    }
}

fn decision_json(path: &str, decision: &GuardDecision) -> Value {
    match decision {
        GuardDecision::Loading => json!({ "path": path, "decision": "loading" }),
        GuardDecision::Render => json!({ "path": path, "decision": "render" }),
        GuardDecision::Redirect(route) => {
            json!({ "path": path, "decision": "redirect", "to": route.path() })
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
