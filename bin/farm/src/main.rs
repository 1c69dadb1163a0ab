#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::too_many_lines)]

mod config;

use std::{fs, path::Path, str::FromStr};

use alloy_primitives::Address;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use farm_core::{
    backup::FarmBackup,
    context::{ExecutionContext, SenderAuthorizer},
    events::FarmEvent,
    farm::Farm,
    receipts::RollupReceipt,
    signing::permission_message,
    sol::PermissionInput,
    verifier::{PermissionCertificate, SignatureVerifier},
};
use farm_utils::{init_logger, LogFormat};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

use crate::config::Settings;

/// The CLI application that defines all available commands.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides the configured farm state file.
    #[arg(long, global = true)]
    state: Option<String>,
    /// Overrides the configured log format.
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Deploy a new farm and write its state file.
    Init {
        /// Replace an existing state file.
        #[arg(long)]
        force: bool,
    },
    /// Set the admin and start accruing rewards.
    Start(StartArgs),
    /// Dispatch a deposit.
    Deposit(DepositArgs),
    /// Dispatch a full withdrawal.
    Withdraw(ActionArgs),
    /// Dispatch a reward claim.
    Claim(ActionArgs),
    /// Fold pending actions into a new root.
    Rollup(RollupArgs),
    /// Update the reward per block with a signed permission.
    UpdateRate(UpdateRateArgs),
    /// Sign a height-bounded permission to update the reward rate.
    SignPermission(SignPermissionArgs),
    /// Print the committed farm state.
    Status,
}

/// The arguments for the `start` command.
#[derive(Debug, Clone, Parser)]
struct StartArgs {
    /// The new admin.
    #[arg(long)]
    admin: Address,
    /// The current block height.
    #[arg(long)]
    height: u32,
}

/// The arguments shared by user actions.
#[derive(Debug, Clone, Parser)]
struct ActionArgs {
    /// The private key of the sender.
    #[arg(long)]
    private_key: String,
    /// The account the action is for, defaults to the sender.
    #[arg(long)]
    account: Option<Address>,
    /// The current block height.
    #[arg(long)]
    height: u32,
}

/// The arguments for the `deposit` command.
#[derive(Debug, Clone, Parser)]
struct DepositArgs {
    #[command(flatten)]
    action: ActionArgs,
    /// The amount to stake.
    #[arg(long)]
    amount: u64,
}

/// The arguments for the `rollup` command.
#[derive(Debug, Clone, Parser)]
struct RollupArgs {
    /// The current block height.
    #[arg(long)]
    height: u32,
    /// Keep rolling up until nothing is pending.
    #[arg(long)]
    all: bool,
}

/// The arguments for the `update-rate` command.
#[derive(Debug, Clone, Parser)]
struct UpdateRateArgs {
    /// Path to a certificate written by `sign-permission`.
    #[arg(long)]
    certificate: String,
    /// The new reward per block.
    #[arg(long)]
    rate: u64,
    /// The current block height.
    #[arg(long)]
    height: u32,
    /// The account allowed to grant permissions, defaults to the admin.
    #[arg(long)]
    authority: Option<Address>,
}

/// The arguments for the `sign-permission` command.
#[derive(Debug, Clone, Parser)]
struct SignPermissionArgs {
    /// The private key of the authority.
    #[arg(long)]
    private_key: String,
    /// The height below which the permission is valid.
    #[arg(long)]
    until: u32,
    /// Where to write the certificate.
    #[arg(long)]
    out: String,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct DelegatorRow {
    #[tabled(rename = "Delegator")]
    address: String,
    #[tabled(rename = "Balance")]
    balance: u64,
    #[tabled(rename = "Reward Per Share Start")]
    start: u64,
}

/// The main entry point for the CLI.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new().context("failed to load settings")?;
    init_logger(cli.log_format.unwrap_or(settings.log_format))?;

    let state_path = cli.state.clone().unwrap_or_else(|| settings.state_path.clone());
    let path = Path::new(&state_path);

    match cli.command {
        Command::Init { force } => {
            if path.exists() && !force {
                return Err(anyhow!("{} already exists, pass --force to replace it", path.display()));
            }
            let farm = Farm::new(settings.farm_settings(), SenderAuthorizer);
            farm.backup().save(path)?;
            println!("deployed farm at root {}", farm.checkpoint().root);
        }
        Command::Start(args) => {
            let mut farm = load(path)?;
            let ctx = ExecutionContext::new(args.height, args.admin);
            farm.start_farm(&ctx, args.admin)?;
            farm.backup().save(path)?;
            println!("farm started by {} at height {}", args.admin, args.height);
        }
        Command::Deposit(args) => {
            let mut farm = load(path)?;
            let (ctx, account) = action_context(&args.action)?;
            let head = farm.deposit(&ctx, account, args.amount)?;
            farm.backup().save(path)?;
            println!("dispatched deposit of {} for {account}, actions hash {head}", args.amount);
        }
        Command::Withdraw(args) => {
            let mut farm = load(path)?;
            let (ctx, account) = action_context(&args)?;
            let head = farm.withdraw(&ctx, account)?;
            farm.backup().save(path)?;
            println!("dispatched withdrawal for {account}, actions hash {head}");
        }
        Command::Claim(args) => {
            let mut farm = load(path)?;
            let (ctx, account) = action_context(&args)?;
            let head = farm.claim(&ctx, account)?;
            farm.backup().save(path)?;
            println!("dispatched claim for {account}, actions hash {head}");
        }
        Command::Rollup(args) => {
            let mut farm = load(path)?;
            let ctx = ExecutionContext::new(args.height, farm.admin());
            let mut events: Vec<FarmEvent> = Vec::new();
            let mut rollups = 0;
            while let Some(receipt) = farm.rollup(&ctx, &mut events)? {
                rollups += 1;
                print_receipt(&receipt);
                if !args.all {
                    break;
                }
            }
            farm.backup().save(path)?;
            if rollups == 0 {
                println!("nothing to roll up");
            }
            for event in &events {
                info!("event: {:?}", event);
            }
        }
        Command::UpdateRate(args) => {
            let mut farm = load(path)?;
            let json = fs::read_to_string(&args.certificate)
                .with_context(|| format!("failed to read {}", args.certificate))?;
            let certificate: PermissionCertificate = serde_json::from_str(&json)?;
            let verifier = SignatureVerifier::new(args.authority.unwrap_or(farm.admin()));
            let ctx = ExecutionContext::new(args.height, certificate.input.account);
            farm.update_rewards_per_block(&ctx, &verifier, &certificate, args.rate)?;
            farm.backup().save(path)?;
            println!("reward per block is now {}", args.rate);
        }
        Command::SignPermission(args) => {
            let signer = parse_signer(&args.private_key)?;
            let input =
                PermissionInput { permissionUntilBlockHeight: args.until, account: signer.address() };
            let signature = signer.sign_message_sync(&permission_message(&input))?;
            let certificate = PermissionCertificate { input, proof: signature.as_bytes().to_vec() };
            fs::write(&args.out, serde_json::to_string_pretty(&certificate)?)?;
            println!(
                "signed permission for {} until height {}: 0x{}",
                signer.address(),
                args.until,
                hex::encode(&certificate.proof)
            );
        }
        Command::Status => {
            let farm = load(path)?;
            print_status(&farm)?;
        }
    }

    Ok(())
}

/// Restores the farm kept at `path`.
fn load(path: &Path) -> Result<Farm> {
    let backup = FarmBackup::load(path)
        .with_context(|| format!("failed to load farm from {}", path.display()))?;
    Ok(Farm::restore(backup, SenderAuthorizer)?)
}

fn parse_signer(private_key: &str) -> Result<PrivateKeySigner> {
    PrivateKeySigner::from_str(private_key).map_err(|err| anyhow!("invalid private key: {err}"))
}

/// The execution context of a user action and the account it is for.
fn action_context(args: &ActionArgs) -> Result<(ExecutionContext, Address)> {
    let signer = parse_signer(&args.private_key)?;
    let account = args.account.unwrap_or(signer.address());
    Ok((ExecutionContext::new(args.height, signer.address()), account))
}

fn print_receipt(receipt: &RollupReceipt) {
    println!(
        "rolled up {} action(s) at height {}: root {} -> {}",
        receipt.actions.len(),
        receipt.height,
        receipt.old.root,
        receipt.new.root
    );
    for action in &receipt.actions {
        println!(
            "  {:?}: reward {}, balance {}, pool {}",
            action.action, action.user_reward, action.balance, action.total_staked_balance
        );
    }
}

fn print_status(farm: &Farm) -> Result<()> {
    let checkpoint = farm.checkpoint();
    let pending = farm.pending_actions()?;
    let mut rows = vec![
        StatusRow { name: "Admin".to_string(), value: farm.admin().to_string() },
        StatusRow { name: "Root".to_string(), value: checkpoint.root.to_string() },
        StatusRow { name: "Actions Hash".to_string(), value: checkpoint.actions_hash.to_string() },
        StatusRow {
            name: "Reward Per Block".to_string(),
            value: farm.reward_per_block().to_string(),
        },
        StatusRow {
            name: "Last Update Height".to_string(),
            value: farm.last_update_height().to_string(),
        },
        StatusRow { name: "Pending Actions".to_string(), value: pending.len().to_string() },
    ];
    if let Some(farm_data) = farm.farm_data() {
        rows.push(StatusRow {
            name: "Accumulated Rewards Per Share".to_string(),
            value: farm_data.accumulatedRewardsPerShare.to_string(),
        });
        rows.push(StatusRow {
            name: "Total Staked Balance".to_string(),
            value: farm_data.totalStakedBalance.to_string(),
        });
    }

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{table}");

    if let Some(store) = farm.store() {
        let delegators: Vec<_> = store
            .delegators()
            .map(|(address, record)| DelegatorRow {
                address: address.to_string(),
                balance: record.balance,
                start: record.accumulatedRewardPerShareStart,
            })
            .collect();
        if !delegators.is_empty() {
            let mut table = Table::new(delegators);
            table.with(Style::modern());
            println!("{table}");
        }
    }
    Ok(())
}
