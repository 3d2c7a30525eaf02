//! Storedesk CLI - store API access from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in and print a bearer token
//! sd-cli login
//!
//! # List products matching a search term
//! sd-cli products list --search serum
//!
//! # List shipped orders as JSON
//! sd-cli orders list --status shipped --json
//!
//! # Mark an order as delivered
//! sd-cli orders set-delivery 65f0c2 delivered
//! ```
//!
//! # Environment Variables
//!
//! - `API_BASE_URL` - Store API base URL
//! - `STOREDESK_TOKEN` - Bearer token from a previous `login`
//! - `STOREDESK_EMAIL` / `STOREDESK_PASSWORD` - Admin credentials, used
//!   when no token is set
//! - `CURRENCY` - Display currency (default `NGN`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

use commands::{CliError, Context, Output};

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Storedesk CLI tools")]
struct Cli {
    /// Store API base URL
    #[arg(long, env = "API_BASE_URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with admin credentials and print the bearer token
    Login,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Browse and update orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Browse user accounts
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Match name, brand, SKU or category
        #[arg(short, long)]
        search: Option<String>,

        /// Only products in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Print raw JSON records
        #[arg(long)]
        json: bool,
    },
    /// List products at or below the stock threshold
    LowStock {
        #[arg(short, long, default_value_t = 5)]
        threshold: i64,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List {
        /// Delivery status (`pending`, `shipped`, `delivered`)
        #[arg(long)]
        status: Option<String>,

        /// Match customer name or email
        #[arg(short, long)]
        search: Option<String>,

        /// Print raw JSON records
        #[arg(long)]
        json: bool,
    },
    /// Set an order's delivery status
    SetDelivery { id: String, status: String },
    /// Set an order's payment status
    SetPayment { id: String, status: String },
}

#[derive(Subcommand)]
enum UserAction {
    /// List user accounts
    List {
        /// Only `admin` or `user` accounts
        #[arg(short, long)]
        role: Option<String>,

        /// Print raw JSON records
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so listings stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storedesk_cli=info,storedesk_admin=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut out = Output::stdout();

    if matches!(cli.command, Commands::Login) {
        let api = commands::api_client(cli.api_url.as_deref())?;
        return commands::session::login(&api, &mut out).await;
    }

    let ctx = Context::connect(cli.api_url.as_deref()).await?;

    match cli.command {
        Commands::Login => {}
        Commands::Products { action } => match action {
            ProductAction::List {
                search,
                category,
                json,
            } => {
                commands::products::list(&ctx, &mut out, search.as_deref(), category.as_deref(), json)
                    .await?;
            }
            ProductAction::LowStock { threshold } => {
                commands::products::low_stock(&ctx, &mut out, threshold).await?;
            }
        },
        Commands::Orders { action } => match action {
            OrderAction::List {
                status,
                search,
                json,
            } => {
                let status = status
                    .map(|s| s.parse())
                    .transpose()
                    .map_err(CliError::InvalidArgument)?;
                commands::orders::list(&ctx, &mut out, status, search.as_deref(), json).await?;
            }
            OrderAction::SetDelivery { id, status } => {
                let status = status.parse().map_err(CliError::InvalidArgument)?;
                commands::orders::set_delivery(&ctx, &mut out, &id, status).await?;
            }
            OrderAction::SetPayment { id, status } => {
                let status = status.parse().map_err(CliError::InvalidArgument)?;
                commands::orders::set_payment(&ctx, &mut out, &id, status).await?;
            }
        },
        Commands::Users { action } => match action {
            UserAction::List { role, json } => {
                let role = role
                    .map(|r| r.parse())
                    .transpose()
                    .map_err(CliError::InvalidArgument)?;
                commands::users::list(&ctx, &mut out, role, json).await?;
            }
        },
    }
    Ok(())
}
