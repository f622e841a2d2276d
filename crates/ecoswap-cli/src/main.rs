//! EcoSwap CLI - Command-line client for the EcoSwap marketplace.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{AddItemArgs, Context};
use ecoswap_config::{Config, Paths};
use ecoswap_marketplace::{
    Category, ExchangeFilter, ItemCondition, ItemFilter, ItemStatus, MarketplaceError,
};
use std::str::FromStr;
use tracing::debug;

/// EcoSwap CLI - Swap, donate and message from the terminal.
#[derive(Parser)]
#[command(name = "ecoswap")]
#[command(about = "EcoSwap CLI for the clothing exchange marketplace")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error); defaults to the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// API base URL, overriding the config file and ECOSWAP_API_URL
    #[arg(long, global = true, env = "ECOSWAP_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with email and password
    Login {
        /// Email (or phone); prompted when omitted
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long)]
        phone: Option<String>,
    },

    /// Logout and clear session
    Logout,

    /// Check authentication status
    Status {
        /// Fetch profile and balance from the server
        #[arg(short, long)]
        refresh: bool,
    },

    /// Browse and manage item listings
    Items {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Exchange requests
    Exchanges {
        #[command(subcommand)]
        command: ExchangeCommands,
    },

    /// Donations
    Donations {
        #[command(subcommand)]
        command: DonationCommands,
    },

    /// Eco points
    Points {
        #[command(subcommand)]
        command: Option<PointCommands>,
    },

    /// Conversations and messages
    Messages {
        #[command(subcommand)]
        command: MessageCommands,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// List items from other users
    List {
        #[arg(short, long, value_parser = parse_vocab::<Category>)]
        category: Option<Category>,
        /// Item status; repeat to match several
        #[arg(short = 's', long = "status", value_parser = parse_vocab::<ItemStatus>)]
        statuses: Vec<ItemStatus>,
        #[arg(long)]
        size: Option<String>,
        #[arg(short = 'q', long)]
        search: Option<String>,
        #[arg(short, long, default_value = "20")]
        limit: u32,
        /// Include your own listings
        #[arg(long)]
        include_mine: bool,
    },
    /// List your own items
    Mine,
    /// Show item details
    Show {
        /// Item ID
        id: i64,
    },
    /// List a new item
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, value_parser = parse_vocab::<Category>)]
        category: Category,
        /// New, "Gently Used" or Worn
        #[arg(long, value_parser = parse_vocab::<ItemCondition>)]
        condition: ItemCondition,
        #[arg(long, default_value = "Available", value_parser = parse_vocab::<ItemStatus>)]
        status: ItemStatus,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
        #[arg(long)]
        pickup: Option<String>,
    },
    /// Delete one of your items
    Delete {
        /// Item ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ExchangeCommands {
    /// List exchange requests
    List {
        /// all, sent or received
        #[arg(long, default_value = "all", value_parser = parse_vocab::<ExchangeFilter>)]
        filter: ExchangeFilter,
    },
    /// Request an exchange for an item
    Request {
        /// ID of the item you want
        item: i64,
        /// ID of one of your items to offer
        #[arg(long)]
        offer_item: Option<i64>,
        /// Eco points to offer
        #[arg(long)]
        offer_points: Option<i64>,
    },
    /// Accept a request
    Accept {
        /// Exchange ID
        id: i64,
    },
    /// Reject a request
    Reject {
        /// Exchange ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum DonationCommands {
    /// List your donations
    List,
    /// Donate an item
    Create {
        /// ID of a listed item
        #[arg(long, required_unless_present = "title")]
        item: Option<i64>,
        /// Title of an unlisted item
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        recipient: Option<String>,
    },
}

#[derive(Subcommand)]
enum PointCommands {
    /// Show your balance
    Balance,
    /// Show transaction history
    History {
        #[arg(short, long, default_value = "1")]
        page: u32,
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
}

#[derive(Subcommand)]
enum MessageCommands {
    /// List conversations
    Conversations,
    /// Show a conversation
    Thread {
        /// Conversation ID
        id: i64,
    },
    /// Start a conversation with a user
    Start {
        /// User ID
        user: i64,
    },
    /// Send a message
    Send {
        /// Conversation ID
        id: i64,
        /// Message text
        text: String,
    },
}

/// clap value parser for the marketplace vocabularies.
fn parse_vocab<T>(value: &str) -> Result<T, String>
where
    T: FromStr<Err = MarketplaceError>,
{
    value.parse().map_err(|e: MarketplaceError| e.to_string())
}

async fn run(cli: Cli, ctx: Context) -> anyhow::Result<()> {
    let format = &cli.format;

    match cli.command {
        Commands::Login { email } => commands::login(&ctx, email, format).await,
        Commands::Register { name, email, phone } => {
            commands::register(&ctx, name, email, phone, format).await
        }
        Commands::Logout => commands::logout(&ctx, format).await,
        Commands::Status { refresh } => commands::status(&ctx, refresh, format).await,
        Commands::Items { command } => match command {
            ItemCommands::List {
                category,
                statuses,
                size,
                search,
                limit,
                include_mine,
            } => {
                let mut filter = ItemFilter::default().limit(limit);
                filter.category = category;
                filter.size = size;
                filter.search = search;
                for status in statuses {
                    filter = filter.status(status);
                }
                commands::items_list(&ctx, filter, include_mine, format).await
            }
            ItemCommands::Mine => commands::items_mine(&ctx, format).await,
            ItemCommands::Show { id } => commands::items_show(&ctx, id, format).await,
            ItemCommands::Add {
                title,
                category,
                condition,
                status,
                description,
                brand,
                size,
                color,
                image_url,
                pickup,
            } => {
                let args = AddItemArgs {
                    title,
                    category,
                    condition,
                    status,
                    description,
                    brand,
                    size,
                    color,
                    image_url,
                    pickup_location: pickup,
                };
                commands::items_add(&ctx, args, format).await
            }
            ItemCommands::Delete { id } => commands::items_delete(&ctx, id, format).await,
        },
        Commands::Exchanges { command } => match command {
            ExchangeCommands::List { filter } => {
                commands::exchanges_list(&ctx, filter, format).await
            }
            ExchangeCommands::Request {
                item,
                offer_item,
                offer_points,
            } => commands::exchanges_request(&ctx, item, offer_item, offer_points, format).await,
            ExchangeCommands::Accept { id } => commands::exchanges_accept(&ctx, id, format).await,
            ExchangeCommands::Reject { id } => commands::exchanges_reject(&ctx, id, format).await,
        },
        Commands::Donations { command } => match command {
            DonationCommands::List => commands::donations_list(&ctx, format).await,
            DonationCommands::Create {
                item,
                title,
                recipient,
            } => commands::donations_create(&ctx, item, title, recipient, format).await,
        },
        Commands::Points { command } => match command.unwrap_or(PointCommands::Balance) {
            PointCommands::Balance => commands::points_balance(&ctx, format).await,
            PointCommands::History { page, limit } => {
                commands::points_history(&ctx, page, limit, format).await
            }
        },
        Commands::Messages { command } => match command {
            MessageCommands::Conversations => commands::messages_conversations(&ctx, format).await,
            MessageCommands::Thread { id } => commands::messages_thread(&ctx, id, format).await,
            MessageCommands::Start { user } => commands::messages_start(&ctx, user, format).await,
            MessageCommands::Send { id, text } => {
                commands::messages_send(&ctx, id, &text, format).await
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let paths = match Paths::new() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut config = match Config::load(&paths) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.trim().to_string();
        if let Err(e) = config.validate() {
            eprintln!("Error: invalid --api-url: {}", e);
            std::process::exit(1);
        }
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize logging via observability crate
    ecoswap_config::init_logging("cli", &config.log_level, false);
    debug!(api = %config.api_base_url, "Starting");

    let result = match Context::open(&paths, &config) {
        Ok(ctx) => run(cli, ctx).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
