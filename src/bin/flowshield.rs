//! FlowShield CLI
//!
//! Deposit into and withdraw from the privacy pool, manage secret notes and
//! read pool and account analytics.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Arg, ArgAction, ArgMatches, Command};

use flowshield::analytics::{export_user_data, fetch_pool_stats, fetch_user_analytics};
use flowshield::client::{
    write_note, DepositAmount, DepositFlow, RelayerClient, WithdrawFlow, WithdrawMode,
};
use flowshield::validation::{is_account_address, normalize_address};
use flowshield::{AptosClient, Config, LocalAccount, PrivacyPool, SecretNote};

const PRIVATE_KEY_ENV: &str = "FLOWSHIELD_PRIVATE_KEY";
const RELAYER_URL_ENV: &str = "FLOWSHIELD_RELAYER_URL";
const DEFAULT_RELAYER_URL: &str = "http://127.0.0.1:3000";

fn private_key_arg() -> Arg {
    Arg::new("private-key")
        .short('k')
        .long("private-key")
        .value_name("HEX")
        .help("Ed25519 private key (falls back to FLOWSHIELD_PRIVATE_KEY)")
}

fn address_arg() -> Arg {
    Arg::new("address")
        .value_name("ADDRESS")
        .help("Account address")
        .required(true)
}

fn cli() -> Command {
    Command::new("flowshield")
        .version(env!("CARGO_PKG_VERSION"))
        .about("FlowShield privacy pool CLI")
        .subcommand_required(true)
        .arg(
            Arg::new("node-url")
                .long("node-url")
                .value_name("URL")
                .global(true)
                .help("Fullnode REST URL (overrides APTOS_NODE_URL)"),
        )
        .arg(
            Arg::new("module-address")
                .long("module-address")
                .value_name("ADDRESS")
                .global(true)
                .help("Address the privacy_pool module is published at"),
        )
        .subcommand(
            Command::new("note")
                .about("Create or inspect secret notes")
                .subcommand_required(true)
                .subcommand(
                    Command::new("new")
                        .about("Generate a secret note without depositing")
                        .arg(
                            Arg::new("amount")
                                .short('a')
                                .long("amount")
                                .value_name("APT")
                                .required(true)
                                .help("Amount the note is for"),
                        )
                        .arg(
                            Arg::new("output")
                                .short('o')
                                .long("output")
                                .value_name("FILE")
                                .value_parser(clap::value_parser!(PathBuf))
                                .help("Write the note to a new file"),
                        ),
                )
                .subcommand(
                    Command::new("hash")
                        .about("Print the on-chain secret hash of a note")
                        .arg(Arg::new("note").value_name("NOTE").required(true)),
                ),
        )
        .subcommand(
            Command::new("deposit")
                .about("Deposit into a pool and receive a secret note")
                .arg(
                    Arg::new("pool")
                        .short('p')
                        .long("pool")
                        .value_name("APT")
                        .value_parser(clap::value_parser!(f64))
                        .conflicts_with("amount")
                        .help("Pool denomination: 0.1, 1, 10 or 100"),
                )
                .arg(
                    Arg::new("amount")
                        .short('a')
                        .long("amount")
                        .value_name("APT")
                        .help("Custom amount"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Also write the note to a new file"),
                )
                .arg(private_key_arg()),
        )
        .subcommand(
            Command::new("withdraw")
                .about("Withdraw a deposit to a recipient")
                .arg(
                    Arg::new("note")
                        .short('n')
                        .long("note")
                        .value_name("NOTE")
                        .required(true)
                        .help("Secret note from the deposit"),
                )
                .arg(
                    Arg::new("recipient")
                        .short('r')
                        .long("recipient")
                        .value_name("ADDRESS")
                        .required(true),
                )
                .arg(
                    Arg::new("relayer")
                        .long("relayer")
                        .action(ArgAction::SetTrue)
                        .help("Withdraw through the relayer service (5% fee)"),
                )
                .arg(
                    Arg::new("relayer-url")
                        .long("relayer-url")
                        .value_name("URL")
                        .help("Relayer base URL (falls back to FLOWSHIELD_RELAYER_URL)"),
                )
                .arg(private_key_arg()),
        )
        .subcommand(Command::new("stats").about("Show pool statistics"))
        .subcommand(
            Command::new("analytics")
                .about("Show privacy and wallet analytics for an address")
                .arg(address_arg()),
        )
        .subcommand(
            Command::new("export")
                .about("Export analytics for an address as JSON")
                .arg(address_arg())
                .arg(
                    Arg::new("include-private")
                        .long("include-private")
                        .action(ArgAction::SetTrue)
                        .help("Include recent transactions and interactions"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(url) = matches.get_one::<String>("node-url") {
        config.node_url = url.clone();
    }
    if let Some(address) = matches.get_one::<String>("module-address") {
        config.module_address =
            normalize_address(address).ok_or_else(|| anyhow!("invalid module address {}", address))?;
    }
    Ok(config)
}

fn signer(matches: &ArgMatches) -> Result<LocalAccount> {
    let key = match matches.get_one::<String>("private-key") {
        Some(key) => key.clone(),
        None => env::var(PRIVATE_KEY_ENV)
            .map_err(|_| anyhow!("pass --private-key or set {}", PRIVATE_KEY_ENV))?,
    };
    Ok(LocalAccount::from_private_key_hex(&key)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    let pool = PrivacyPool::new(config.module_address.clone());
    let chain = Arc::new(AptosClient::new(&config.node_url, config.client_config()));

    match matches.subcommand() {
        Some(("note", sub)) => match sub.subcommand() {
            Some(("new", args)) => {
                let note = new_note(args)?;
                println!("note: {}", note.encode());
                println!("secret hash: {}", note.secret_hash());
            }
            Some(("hash", args)) => {
                let text = args
                    .get_one::<String>("note")
                    .ok_or_else(|| anyhow!("note is required"))?;
                let note = SecretNote::parse(text)?;
                println!("{}", note.secret_hash());
            }
            _ => return Err(anyhow!("unknown subcommand")),
        },
        Some(("deposit", args)) => {
            let user = signer(args)?;
            let amount = match (args.get_one::<f64>("pool"), args.get_one::<String>("amount")) {
                (Some(pool), _) => DepositAmount::Pool(*pool),
                (None, Some(custom)) => DepositAmount::Custom(custom.clone()),
                (None, None) => DepositAmount::Custom(String::new()),
            };

            let receipt = DepositFlow::new(pool, chain).deposit(&user, &amount).await?;
            println!("transaction: {}", receipt.transaction_hash);
            println!("note: {}", receipt.note.encode());
            println!("Save this note. It is the only way to withdraw these funds.");
            if let Some(path) = args.get_one::<PathBuf>("output") {
                receipt.save_note(path)?;
                println!("note written to {}", path.display());
            }
        }
        Some(("withdraw", args)) => {
            let note = args.get_one::<String>("note").cloned().unwrap_or_default();
            let recipient = args.get_one::<String>("recipient").cloned().unwrap_or_default();

            let receipt = if args.get_flag("relayer") {
                let url = args
                    .get_one::<String>("relayer-url")
                    .cloned()
                    .or_else(|| env::var(RELAYER_URL_ENV).ok())
                    .unwrap_or_else(|| DEFAULT_RELAYER_URL.to_string());
                let relayer = RelayerClient::new(&url, config.request_timeout.max(Duration::from_secs(60)));
                WithdrawFlow::new(pool, chain)
                    .with_relayer(relayer)
                    .withdraw(&note, &recipient, WithdrawMode::Relayer)
                    .await?
            } else {
                let user = signer(args)?;
                WithdrawFlow::new(pool, chain)
                    .withdraw(&note, &recipient, WithdrawMode::Direct(&user))
                    .await?
            };

            println!("transaction: {}", receipt.transaction_hash);
            println!("{} APT sent to {}", receipt.amount, receipt.recipient);
            if let Some(fee) = receipt.relayer_fee {
                println!("relayer fee: {} APT", fee);
            }
        }
        Some(("stats", _)) => {
            print_json(&fetch_pool_stats(chain.as_ref(), &pool).await)?;
        }
        Some(("analytics", args)) => {
            let address = checked_address(args)?;
            print_json(&fetch_user_analytics(chain.as_ref(), &pool, &address, Utc::now()).await)?;
        }
        Some(("export", args)) => {
            let address = checked_address(args)?;
            let now = Utc::now();
            let analytics = fetch_user_analytics(chain.as_ref(), &pool, &address, now).await;
            println!("{}", export_user_data(&analytics, args.get_flag("include-private"), now)?);
        }
        _ => return Err(anyhow!("unknown subcommand")),
    }

    Ok(())
}

/// Generate a note for `note new`, writing it to `--output` when given
fn new_note(args: &ArgMatches) -> Result<SecretNote> {
    let amount = args
        .get_one::<String>("amount")
        .map(|a| DepositAmount::Custom(a.clone()))
        .ok_or_else(|| anyhow!("amount is required"))?
        .resolve()?;
    let note = SecretNote::generate(amount);
    if let Some(path) = args.get_one::<PathBuf>("output") {
        write_note(&note, path).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(note)
}

fn checked_address(args: &ArgMatches) -> Result<String> {
    let address = args
        .get_one::<String>("address")
        .ok_or_else(|| anyhow!("address is required"))?;
    if !is_account_address(address) {
        return Err(anyhow!("Invalid address {}", address));
    }
    Ok(address.clone())
}
