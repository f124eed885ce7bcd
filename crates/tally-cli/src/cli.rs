use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally: split a bill across payment methods and settle it",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Catalog and session configuration (TOML)
    #[arg(short, long, global = true, default_value = "tally.toml")]
    pub config: PathBuf,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List payment methods and the account each resolves to
    Methods(MethodsArgs),
    /// Show which account would receive a method's payments
    Resolve(ResolveArgs),
    /// Show the 25% / 50% / 75% / Full shortcut amounts
    Quick(QuickArgs),
    /// Settle a target amount across one or more payments
    Settle(SettleArgs),
    /// Re-check settlements recorded in a JSON-lines file
    Audit(AuditArgs),
}

#[derive(Args)]
pub struct MethodsArgs {
    /// Only show methods that currently resolve to an account
    #[arg(long)]
    pub usable: bool,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub method: String,
}

#[derive(Args)]
pub struct QuickArgs {
    #[arg(long)]
    pub target: String,
    /// Amount already paid
    #[arg(long)]
    pub paid: Option<String>,
}

#[derive(Args)]
pub struct SettleArgs {
    #[arg(long)]
    pub target: String,
    /// `method[=amount][:reference]`; omit the amount to pay what remains
    #[arg(long = "pay", value_parser = parse_payment)]
    pub payments: Vec<PaymentArg>,
    #[arg(long)]
    pub customer: Option<String>,
    #[arg(long)]
    pub customer_name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Append the settlement to this JSON-lines file
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Give up on the settlement sink after this many milliseconds
    #[arg(long, default_value = "5000")]
    pub timeout_ms: u64,
}

#[derive(Args)]
pub struct AuditArgs {
    pub file: PathBuf,
}

/// One `--pay` argument, before amounts are parsed in the session currency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentArg {
    pub method: String,
    pub amount: Option<String>,
    pub reference: Option<String>,
}

pub fn parse_payment(input: &str) -> Result<PaymentArg, String> {
    let (method, rest) = match input.split_once('=') {
        Some((method, rest)) => (method, Some(rest)),
        None => (input, None),
    };
    let method = method.trim();
    if method.is_empty() {
        return Err(format!("missing payment method in '{input}'"));
    }

    let (amount, reference) = match rest.map(|rest| rest.split_once(':').unwrap_or((rest, ""))) {
        Some((amount, reference)) => (amount.trim(), reference),
        None => ("", ""),
    };

    Ok(PaymentArg {
        method: method.to_string(),
        amount: (!amount.is_empty()).then(|| amount.to_string()),
        reference: (!reference.is_empty()).then(|| reference.to_string()),
    })
}
