//! Synthmint CLI
//!
//! Command-line interface for the synthetic token engine. A deployment
//! lives in a local data directory: engine state under `engine.json`,
//! the CLI identity and simulated feed answer under `config.json`.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use synthmint::cli::config::CliConfig;
use synthmint::cli::output::{OutputFormat, Reporter};
use synthmint::core::collateral::ReserveAmount;
use synthmint::core::config::EngineParams;
use synthmint::core::token::TokenAmount;
use synthmint::oracle::feed::StaticFeed;
use synthmint::protocol::engine::SynthEngine;
use synthmint::storage::backend::FileStore;
use synthmint::utils::constants::PRICE_SCALE;
use synthmint::utils::crypto::AccountId;

/// Synthmint CLI - oracle-priced synthetic tokens over a stablecoin reserve
#[derive(Parser)]
#[command(name = "synthmint")]
#[command(version = synthmint::VERSION)]
#[command(about = "Command-line interface for the synthmint engine", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to data directory
    #[arg(short, long, env = "SYNTHMINT_DATA_DIR", default_value = "~/.synthmint")]
    data_dir: PathBuf,

    /// Act as this account (hex) instead of the configured identity
    #[arg(long = "as", value_name = "HEX")]
    acting: Option<String>,

    /// Output format (text, json, json-pretty, minimal)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new deployment in the data directory
    Init {
        /// Force overwrite of an existing deployment
        #[arg(short, long)]
        force: bool,

        /// Initial feed price in reserve units per token
        #[arg(short, long, default_value = "260")]
        price: String,
    },

    /// Engine status and configuration
    Status,

    /// Current price quote and minimum deposit
    Price,

    /// Deposit reserve and mint tokens
    #[command(alias = "buy")]
    Deposit {
        /// Reserve amount, e.g. 2600 or 2600.50
        #[arg(short, long)]
        amount: String,
    },

    /// Redeem tokens for reserve
    #[command(alias = "sell")]
    Redeem {
        /// Whole tokens to redeem
        #[arg(short, long)]
        tokens: u64,
    },

    /// Transfer tokens to another account
    Transfer {
        /// Recipient account (hex)
        #[arg(short, long)]
        to: String,

        /// Whole tokens to transfer
        #[arg(short, long)]
        amount: u64,
    },

    /// Token and reserve balances
    Balance {
        /// Account to check (hex, defaults to own account)
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Total supply and reserve backing
    Supply,

    /// Mint test reserve to your account
    Faucet {
        /// Reserve amount, e.g. 10000
        #[arg(short, long)]
        amount: String,
    },

    /// Approve the vault to pull reserve on deposit
    Approve {
        /// Reserve amount, e.g. 10000
        #[arg(short, long)]
        amount: String,
    },

    /// Recent engine events
    Events {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Dump a verifiable snapshot of the full engine state
    Export,

    /// Administrative operations (owner only)
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Mint unbacked tokens
    Mint {
        /// Recipient account (hex)
        #[arg(short, long)]
        to: String,

        /// Whole tokens to mint
        #[arg(short, long)]
        amount: u64,
    },

    /// Withdraw reserve from the vault to the owner
    Withdraw {
        /// Reserve amount, e.g. 100.50
        #[arg(short, long)]
        amount: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Enable the fallback price
    FallbackEnable {
        /// Fallback price in reserve units per token
        #[arg(short, long)]
        price: String,
    },

    /// Disable the fallback price
    FallbackDisable,

    /// Change the fallback price value
    FallbackSet {
        /// Fallback price in reserve units per token
        #[arg(short, long)]
        price: String,
    },

    /// Set the simulated feed answer
    SetPrice {
        /// Feed value in reserve units per token; non-positive simulates a broken feed
        #[arg(short, long, allow_hyphen_values = true)]
        price: String,
    },

    /// Transfer engine ownership
    TransferOwner {
        /// New owner account (hex)
        #[arg(short, long)]
        to: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN
// ═══════════════════════════════════════════════════════════════════════════════

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let format = match cli.format.parse::<OutputFormat>() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };
    let out = Reporter::new(format);

    if let Err(e) = run_command(&cli, &out) {
        out.error(&e.to_string());
        std::process::exit(1);
    }
}

fn run_command(cli: &Cli, out: &Reporter) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init { force, price } => cmd_init(cli, *force, price, out),
        Commands::Status => cmd_status(cli, out),
        Commands::Price => cmd_price(cli, out),
        Commands::Deposit { amount } => cmd_deposit(cli, amount, out),
        Commands::Redeem { tokens } => cmd_redeem(cli, *tokens, out),
        Commands::Transfer { to, amount } => cmd_transfer(cli, to, *amount, out),
        Commands::Balance { account } => cmd_balance(cli, account.as_deref(), out),
        Commands::Supply => cmd_supply(cli, out),
        Commands::Faucet { amount } => cmd_faucet(cli, amount, out),
        Commands::Approve { amount } => cmd_approve(cli, amount, out),
        Commands::Events { count } => cmd_events(cli, *count, out),
        Commands::Export => cmd_export(cli, out),
        Commands::Admin(cmd) => cmd_admin(cli, cmd, out),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMAND HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_init(cli: &Cli, force: bool, price: &str, out: &Reporter) -> anyhow::Result<()> {
    let data_dir = expand_path(&cli.data_dir)?;
    let engine_file = data_dir.join("engine.json");

    if engine_file.exists() && !force {
        anyhow::bail!(
            "Deployment already exists at {}. Use --force to overwrite.",
            data_dir.display()
        );
    }

    let feed_value = parse_feed_value(price)?;
    if feed_value <= 0 {
        anyhow::bail!("Initial feed price must be positive");
    }

    std::fs::create_dir_all(&data_dir)?;
    if engine_file.exists() {
        std::fs::remove_file(&engine_file)?;
    }

    let now = now_secs();
    let account = AccountId::random();

    let mut config = CliConfig::new(data_dir.clone(), account);
    config.set_feed_answer(feed_value, now);
    config.save(&CliConfig::path_in(&data_dir))?;

    let spinner = create_spinner("Initializing engine...");
    let feed = StaticFeed::with_description(config.feed_answer(), "config feed");
    let store = FileStore::new(&data_dir)?;
    let engine = SynthEngine::initialize(
        store,
        EngineParams::default(),
        Box::new(feed),
        account,
        now,
    )?;
    spinner.finish_and_clear();

    out.success(&format!("Deployment created at {}", data_dir.display()));
    out.kv("account", &account.to_string());
    out.kv(
        "token",
        &format!(
            "{} ({})",
            engine.params().token_name,
            engine.params().token_symbol
        ),
    );
    out.kv("price", &format_price(feed_value as u64));

    Ok(())
}

fn cmd_status(cli: &Cli, out: &Reporter) -> anyhow::Result<()> {
    let (engine, config, data_dir) = open_engine(cli)?;
    let now = now_secs();

    out.section("Engine");
    out.kv("version", synthmint::VERSION);
    out.kv("data_dir", &data_dir.display().to_string());
    out.kv("owner", &engine.owner().to_string());
    out.kv("vault", &engine.vault_account().to_string());
    out.kv("account", &config.account.to_string());
    out.kv("sequence", &engine.last_sequence().to_string());
    out.kv("state_hash", &engine.state_hash().to_hex());

    out.section("Token");
    out.kv("name", &engine.params().token_name);
    out.kv("symbol", &engine.params().token_symbol);
    out.kv("supply", &engine.total_supply().to_string());
    out.kv("holders", &engine.holder_count().to_string());
    out.kv("vault_reserve", &engine.vault_reserve().to_string());

    out.section("Price");
    out.kv("feed", &engine.feed_description());
    match engine.current_price(now) {
        Ok(quote) => {
            out.kv("price", &format_price(quote.price));
            out.kv("source", &quote.source.to_string());
        }
        Err(e) => out.kv("price", &format!("unavailable ({})", e)),
    }
    let fallback = engine.fallback();
    if fallback.enabled {
        out.kv("fallback", &format!("enabled at {}", format_price(fallback.price)));
    } else {
        out.kv("fallback", "disabled");
    }

    Ok(())
}

fn cmd_price(cli: &Cli, out: &Reporter) -> anyhow::Result<()> {
    let (engine, _config, _dir) = open_engine(cli)?;
    let now = now_secs();

    let quote = engine.current_price(now)?;
    let minimum = engine.min_deposit(now)?;

    out.kv("price", &format_price(quote.price));
    out.kv("source", &quote.source.to_string());
    out.kv("updated_at", &format_timestamp(quote.updated_at));
    out.kv("min_deposit", &minimum.to_string());

    Ok(())
}

fn cmd_deposit(cli: &Cli, amount: &str, out: &Reporter) -> anyhow::Result<()> {
    let (mut engine, config, _dir) = open_engine(cli)?;
    let account = acting_account(cli, &config)?;
    let amount = parse_reserve(amount)?;
    let now = now_secs();

    let allowance = engine.allowance_of(&account);
    if allowance < amount {
        out.warning(&format!(
            "Vault allowance is {}, need {}. Run 'synthmint approve' first.",
            allowance, amount
        ));
    }

    let spinner = create_spinner("Submitting deposit...");
    let result = engine.deposit(account, amount, now);
    spinner.finish_and_clear();
    let receipt = result?;

    out.success(&format!(
        "Minted {} {} for {}",
        receipt.tokens_minted,
        engine.params().token_symbol,
        receipt.reserve_amount
    ));
    out.kv("price", &format_price(receipt.price));
    out.kv("source", &receipt.source.to_string());
    out.kv("sequence", &receipt.sequence.to_string());

    Ok(())
}

fn cmd_redeem(cli: &Cli, tokens: u64, out: &Reporter) -> anyhow::Result<()> {
    let (mut engine, config, _dir) = open_engine(cli)?;
    let account = acting_account(cli, &config)?;
    let now = now_secs();

    let spinner = create_spinner("Submitting redemption...");
    let result = engine.redeem(account, TokenAmount::from_units(tokens), now);
    spinner.finish_and_clear();
    let receipt = result?;

    out.success(&format!(
        "Redeemed {} {} for {}",
        receipt.tokens_burned,
        engine.params().token_symbol,
        receipt.reserve_returned
    ));
    out.kv("price", &format_price(receipt.price));
    out.kv("source", &receipt.source.to_string());
    out.kv("sequence", &receipt.sequence.to_string());

    Ok(())
}

fn cmd_transfer(cli: &Cli, to: &str, amount: u64, out: &Reporter) -> anyhow::Result<()> {
    let (mut engine, config, _dir) = open_engine(cli)?;
    let from = acting_account(cli, &config)?;
    let to = parse_account(to)?;

    let sequence = engine.transfer(from, to, TokenAmount::from_units(amount), now_secs())?;

    out.success(&format!(
        "Transferred {} {} to {}",
        amount,
        engine.params().token_symbol,
        to
    ));
    out.kv("sequence", &sequence.to_string());

    Ok(())
}

fn cmd_balance(cli: &Cli, account: Option<&str>, out: &Reporter) -> anyhow::Result<()> {
    let (engine, config, _dir) = open_engine(cli)?;
    let account = match account {
        Some(hex) => parse_account(hex)?,
        None => acting_account(cli, &config)?,
    };

    out.kv("account", &account.to_string());
    out.kv("tokens", &engine.balance_of(&account).to_string());
    out.kv("reserve", &engine.reserve_balance_of(&account).to_string());
    out.kv("allowance", &engine.allowance_of(&account).to_string());

    Ok(())
}

fn cmd_supply(cli: &Cli, out: &Reporter) -> anyhow::Result<()> {
    let (engine, _config, _dir) = open_engine(cli)?;

    out.kv("supply", &engine.total_supply().to_string());
    out.kv("holders", &engine.holder_count().to_string());
    out.kv("vault_reserve", &engine.vault_reserve().to_string());

    Ok(())
}

fn cmd_faucet(cli: &Cli, amount: &str, out: &Reporter) -> anyhow::Result<()> {
    let (mut engine, config, _dir) = open_engine(cli)?;
    let account = acting_account(cli, &config)?;
    let amount = parse_reserve(amount)?;

    engine.faucet(account, amount, now_secs())?;

    out.success(&format!("Minted {} test reserve", amount));
    out.kv("reserve", &engine.reserve_balance_of(&account).to_string());

    Ok(())
}

fn cmd_approve(cli: &Cli, amount: &str, out: &Reporter) -> anyhow::Result<()> {
    let (mut engine, config, _dir) = open_engine(cli)?;
    let account = acting_account(cli, &config)?;
    let amount = parse_reserve(amount)?;

    engine.approve(account, amount, now_secs())?;

    out.success(&format!("Approved the vault for {}", amount));

    Ok(())
}

fn cmd_events(cli: &Cli, count: usize, out: &Reporter) -> anyhow::Result<()> {
    let (engine, _config, _dir) = open_engine(cli)?;

    let events = engine.recent_events(count)?;
    if events.is_empty() {
        out.info("No events recorded");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|(sequence, event)| {
            vec![
                sequence.to_string(),
                event.event_type().to_string(),
                format_timestamp(event.timestamp()),
            ]
        })
        .collect();

    out.table(&["SEQ", "EVENT", "TIME"], &rows);

    Ok(())
}

fn cmd_export(cli: &Cli, out: &Reporter) -> anyhow::Result<()> {
    let (engine, _config, _dir) = open_engine(cli)?;

    let snapshot = engine.snapshot(now_secs());
    out.data(&snapshot);

    Ok(())
}

fn cmd_admin(cli: &Cli, cmd: &AdminCommands, out: &Reporter) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Mint { to, amount } => {
            let (mut engine, config, _dir) = open_engine(cli)?;
            let caller = acting_account(cli, &config)?;
            let to = parse_account(to)?;

            let sequence =
                engine.admin_mint(caller, to, TokenAmount::from_units(*amount), now_secs())?;

            out.success(&format!(
                "Minted {} unbacked {} to {}",
                amount,
                engine.params().token_symbol,
                to
            ));
            out.kv("sequence", &sequence.to_string());
        }

        AdminCommands::Withdraw { amount, yes } => {
            let (mut engine, config, _dir) = open_engine(cli)?;
            let caller = acting_account(cli, &config)?;
            let amount = parse_reserve(amount)?;

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Withdraw {} from the vault reserve?", amount))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    out.info("Withdrawal cancelled");
                    return Ok(());
                }
            }

            let sequence = engine.withdraw_reserve(caller, amount, now_secs())?;

            out.success(&format!("Withdrew {} to the owner account", amount));
            out.kv("owner_reserve", &engine.reserve_balance_of(&caller).to_string());
            out.kv("vault_reserve", &engine.vault_reserve().to_string());
            out.kv("sequence", &sequence.to_string());
        }

        AdminCommands::FallbackEnable { price } => {
            let (mut engine, config, _dir) = open_engine(cli)?;
            let caller = acting_account(cli, &config)?;
            let price = parse_reserve(price)?.micros();

            let sequence = engine.enable_fallback(caller, price, now_secs())?;

            out.success(&format!("Fallback enabled at {}", format_price(price)));
            out.kv("sequence", &sequence.to_string());
        }

        AdminCommands::FallbackDisable => {
            let (mut engine, config, _dir) = open_engine(cli)?;
            let caller = acting_account(cli, &config)?;

            let sequence = engine.disable_fallback(caller, now_secs())?;

            out.success("Fallback disabled");
            out.kv("sequence", &sequence.to_string());
        }

        AdminCommands::FallbackSet { price } => {
            let (mut engine, config, _dir) = open_engine(cli)?;
            let caller = acting_account(cli, &config)?;
            let price = parse_reserve(price)?.micros();

            let sequence = engine.set_fallback_price(caller, price, now_secs())?;

            out.success(&format!("Fallback price set to {}", format_price(price)));
            out.kv("sequence", &sequence.to_string());
        }

        AdminCommands::SetPrice { price } => {
            let data_dir = expand_path(&cli.data_dir)?;
            let config_path = CliConfig::path_in(&data_dir);
            let mut config = CliConfig::load(&config_path)?;

            let value = parse_feed_value(price)?;
            config.set_feed_answer(value, now_secs());
            config.save(&config_path)?;

            if value <= 0 {
                out.warning(
                    "Non-positive feed value; quotes will fail unless the fallback is enabled",
                );
            }
            out.success(&format!("Feed answer set to {}", price));
        }

        AdminCommands::TransferOwner { to } => {
            let (mut engine, config, _dir) = open_engine(cli)?;
            let caller = acting_account(cli, &config)?;
            let to = parse_account(to)?;

            let sequence = engine.transfer_ownership(caller, to, now_secs())?;

            out.success(&format!("Ownership transferred to {}", to));
            out.kv("sequence", &sequence.to_string());
        }
    }

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

fn expand_path(path: &Path) -> anyhow::Result<PathBuf> {
    let path_str = path.to_string_lossy();
    if path_str.starts_with('~') {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(path_str.replacen('~', &home, 1)))
    } else {
        Ok(path.to_path_buf())
    }
}

fn load_cli_config(cli: &Cli) -> anyhow::Result<(PathBuf, CliConfig)> {
    let data_dir = expand_path(&cli.data_dir)?;
    let config_path = CliConfig::path_in(&data_dir);

    if !config_path.exists() {
        anyhow::bail!(
            "No deployment at {}. Run 'synthmint init' first.",
            data_dir.display()
        );
    }

    let mut config = CliConfig::load(&config_path)?;
    config.apply_env();
    config.validate()?;

    Ok((data_dir, config))
}

fn open_engine(cli: &Cli) -> anyhow::Result<(SynthEngine<FileStore>, CliConfig, PathBuf)> {
    let (data_dir, config) = load_cli_config(cli)?;

    let feed = StaticFeed::with_description(config.feed_answer(), "config feed");
    let store = FileStore::new(&data_dir)?;
    let engine = SynthEngine::open(store, Box::new(feed))?;

    Ok((engine, config, data_dir))
}

fn acting_account(cli: &Cli, config: &CliConfig) -> anyhow::Result<AccountId> {
    match &cli.acting {
        Some(hex) => parse_account(hex),
        None => Ok(config.account),
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn parse_account(hex: &str) -> anyhow::Result<AccountId> {
    AccountId::from_hex(hex).map_err(|e| anyhow::anyhow!("Invalid account: {}", e))
}

fn parse_reserve(s: &str) -> anyhow::Result<ReserveAmount> {
    s.parse::<ReserveAmount>()
        .map_err(|e| anyhow::anyhow!("Invalid amount '{}': {}", s, e))
}

/// Parse a feed value in reserve units; negative and zero values are allowed
fn parse_feed_value(s: &str) -> anyhow::Result<i64> {
    let value: Decimal = s
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid price '{}': {}", s, e))?;

    let scaled = value
        .checked_mul(Decimal::from(PRICE_SCALE))
        .ok_or_else(|| anyhow::anyhow!("Price '{}' is out of range", s))?;

    scaled
        .trunc()
        .to_i64()
        .ok_or_else(|| anyhow::anyhow!("Price '{}' is out of range", s))
}

fn format_price(price: u64) -> String {
    ReserveAmount::from_micros(price).to_string()
}

fn format_timestamp(ts: u64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}
