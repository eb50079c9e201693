use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use multimart_content::cms::{Query, SearchOptions, Sort};
use multimart_content::orders::{NotificationOutcome, NotificationProfile, OrderRequest};
use multimart_content::preferences::{LocalStorage, Preferences};
use multimart_content::telemetry::{filter_for_verbosity, init_tracing};
use multimart_content::{CmsConfig, Storefront};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "storefront", version, about = "Multimart content CLI")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Override CONTENTSTACK_BRANCH
    #[arg(long, global = true)]
    branch: Option<String>,
    /// Override CONTENTSTACK_HOME_ENTRY_UID
    #[arg(long, global = true)]
    home_uid: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Assemble the home page (sections plus footer)
    Home,
    /// List every product
    Products,
    /// Fetch one product by entry UID
    Product {
        uid: String,
        /// Also list the other products in its category
        #[arg(long, default_value_t = false)]
        related: bool,
    },
    /// Products in a category, with search fallbacks
    Category { name: String },
    /// Keyword search over product names and descriptions
    Search { term: String },
    /// List every banner
    Banners,
    /// List every service
    Services,
    /// Footer content (falls back to the built-in footer)
    Footer,
    /// Raw entry search against any content type
    Entries {
        content_type: String,
        /// JSON query object, e.g. '{"category":"sofa"}'
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 0)]
        skip: u64,
        #[arg(long, default_value_t = 100)]
        limit: i64,
        /// Field to sort by; prefix with '-' for descending
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, default_value_t = false)]
        include_count: bool,
    },
    /// Place an order and wait for the customer notification
    Order {
        #[arg(long)]
        email: String,
        #[arg(long)]
        total: f64,
    },
    /// Local user preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum PrefsAction {
    /// Print the stored preferences
    Show,
    /// Merge one key; the value is parsed as JSON, else stored as a string
    Set { key: String, value: String },
    /// Remove all stored preferences
    Clear,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(filter_for_verbosity(cli.verbose))?;

    let mut config = CmsConfig::from_env();
    if cli.branch.is_some() {
        config = config.with_branch(cli.branch.clone());
    }
    if let Some(uid) = cli.home_uid.clone() {
        config = config.with_home_entry_uid(uid);
    }

    let connect = || Storefront::connect(&config).context("contentstack client setup");

    match cli.command {
        Commands::Home => print_json(&connect()?.fetch_home_page_with_footer().await?)?,
        Commands::Products => print_json(&connect()?.fetch_products().await?)?,
        Commands::Product { uid, related: false } => {
            print_json(&connect()?.fetch_product_by_id(&uid).await?)?
        }
        Commands::Product { uid, related: true } => {
            print_json(&connect()?.fetch_product_with_related(&uid).await?)?
        }
        Commands::Category { name } => {
            print_json(&connect()?.fetch_products_by_category(&name).await?)?
        }
        Commands::Search { term } => print_json(&connect()?.search_products(&term).await?)?,
        Commands::Banners => print_json(&connect()?.fetch_banners().await?)?,
        Commands::Services => print_json(&connect()?.fetch_services().await?)?,
        Commands::Footer => print_json(&connect()?.fetch_footer_or_fallback().await)?,
        Commands::Entries {
            content_type,
            query,
            skip,
            limit,
            sort,
            include_count,
        } => {
            let query = match query.as_deref() {
                Some(raw) => {
                    let value: Value =
                        serde_json::from_str(raw).context("--query must be valid JSON")?;
                    Query::from_value(&value)
                        .ok_or_else(|| anyhow!("--query must be a JSON object"))?
                }
                None => Query::new(),
            };
            let mut options = SearchOptions::default().with_skip(skip).with_limit(limit);
            if let Some(raw) = sort.as_deref() {
                let sort = Sort::parse(raw).ok_or_else(|| anyhow!("invalid --sort '{raw}'"))?;
                options = options.with_sort(sort);
            }
            if include_count {
                options = options.with_count();
            }
            print_json(&connect()?.search_entries(&content_type, &query, &options).await?)?
        }
        Commands::Order { email, total } => {
            let order = OrderRequest::new(&email, total)?;
            let receipt = connect()?.place_order(order, &NotificationProfile::default());
            info!(order_id = %receipt.order_id, "storefront: order accepted");
            println!("order {} placed (total {:.2})", receipt.order_id, receipt.total);
            match receipt.notification.outcome().await {
                NotificationOutcome::Delivered(_) => println!("notification sent"),
                NotificationOutcome::Failed(reason) => {
                    warn!(%reason, "storefront: notification failed");
                    println!("notification failed: {reason}");
                }
            }
        }
        Commands::Prefs { action } => run_prefs(&config, &action)?,
    }
    Ok(())
}

fn run_prefs(config: &CmsConfig, action: &PrefsAction) -> Result<()> {
    let prefs = Preferences::new(LocalStorage::new(&config.storage_path));
    match action {
        PrefsAction::Show => print_json(&prefs.load()),
        PrefsAction::Set { key, value } => {
            if key.trim().is_empty() {
                bail!("preference key must not be empty");
            }
            let parsed =
                serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.clone()));
            let mut patch = Map::new();
            patch.insert(key.clone(), parsed);
            print_json(&prefs.update(patch)?)
        }
        PrefsAction::Clear => {
            prefs.clear()?;
            println!("preferences cleared");
            Ok(())
        }
    }
}
