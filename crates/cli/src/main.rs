//! Virtual Wardrobe CLI - Shop from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password is read from stdin)
//! wardrobe login -e ada@example.com
//!
//! # Browse
//! wardrobe products list --category Outerwear
//! wardrobe products show 2
//!
//! # Cart
//! wardrobe cart add 2 --size M --color Camel
//! wardrobe cart remove 7
//! wardrobe cart show
//!
//! # Virtual try-on
//! wardrobe try-on 2 --photo me.jpg
//! ```
//!
//! # Environment Variables
//!
//! - `WARDROBE_API_BASE_URL` - Base URL of the Virtual Wardrobe API (required)
//! - `WARDROBE_CREDENTIALS_PATH` - Where the session is kept between runs
//! - `SENTRY_DSN` - Sentry DSN for error tracking (optional)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use virtual_wardrobe_core::{CartItemId, ProductId};
use virtual_wardrobe_storefront::Storefront;
use virtual_wardrobe_storefront::config::StorefrontConfig;
use virtual_wardrobe_storefront::navigation::MemoryNavigator;

mod commands;
mod output;

use commands::CliError;

#[derive(Parser)]
#[command(name = "wardrobe")]
#[command(author, version, about = "Virtual Wardrobe from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password (password read from stdin)
    Login {
        #[arg(short, long)]
        email: String,
    },
    /// Create an account and sign in (password read from stdin)
    Signup {
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Generate a virtual try-on image
    TryOn {
        /// Product to try on
        product_id: i32,

        /// Photo of yourself
        #[arg(short, long)]
        photo: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products
    List {
        /// Only this category (`All` for every category)
        #[arg(short, long)]
        category: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one product with its colors and sizes
    Show { id: i32 },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product variant
    Add {
        product_id: i32,

        #[arg(short, long)]
        size: String,

        #[arg(short, long)]
        color: String,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a cart line
    Remove { item_id: i32 },
}

impl Commands {
    /// The view this command corresponds to, for sign-in redirects.
    fn location(&self) -> String {
        match self {
            Self::Login { .. } | Self::Signup { .. } => "/login".to_string(),
            Self::Logout | Self::Whoami => "/".to_string(),
            Self::Products {
                action: ProductsAction::Show { id },
            }
            | Self::TryOn { product_id: id, .. } => format!("/products/{id}"),
            Self::Products { .. } => "/products".to_string(),
            Self::Cart { .. } => "/cart".to_string(),
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    use secrecy::ExposeSecret;

    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "virtual_wardrobe_storefront=info,virtual_wardrobe_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let navigator = Arc::new(MemoryNavigator::new(cli.command.location()));
    let storefront = Storefront::with_credential_file(config, navigator.clone());
    let notices = storefront.notices().subscribe();

    let result = run(cli, &storefront).await;

    output::notices(notices);
    output::redirects(&navigator.history());

    if let Err(e) = result {
        output::failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, storefront: &Storefront) -> Result<(), CliError> {
    let (_, sync) = storefront.start().await;

    let result = match cli.command {
        Commands::Login { email } => commands::auth::login(storefront, &email).await,
        Commands::Signup { email, name } => {
            commands::auth::signup(storefront, &email, name.as_deref()).await
        }
        Commands::Logout => commands::auth::logout(storefront),
        Commands::Whoami => {
            commands::auth::whoami(storefront);
            Ok(())
        }
        Commands::Products { action } => match action {
            ProductsAction::List {
                category,
                limit,
                offset,
            } => commands::catalog::list(storefront, category, limit, offset).await,
            ProductsAction::Show { id } => {
                commands::catalog::show(storefront, ProductId::new(id)).await
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront).await,
            CartAction::Add {
                product_id,
                size,
                color,
                quantity,
            } => {
                commands::cart::add(
                    storefront,
                    ProductId::new(product_id),
                    &size,
                    &color,
                    quantity,
                )
                .await
            }
            CartAction::Remove { item_id } => {
                commands::cart::remove(storefront, CartItemId::new(item_id)).await
            }
        },
        Commands::TryOn { product_id, photo } => {
            commands::try_on::generate(storefront, ProductId::new(product_id), &photo).await
        }
    };

    sync.abort();
    result
}
