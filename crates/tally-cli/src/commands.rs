use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use serde::Serialize;
use tally_catalog::{CatalogSource, CompatibilityResolver};
use tally_ledger::{LedgerError, LedgerReport, LedgerValidator, QuickAmount, QuickFraction, SettlementLedger};
use tally_session::{
    settlement_digest, DraftEntry, JsonLinesSink, RecordingSink, SessionContext, SettlementSession,
    SettlementSink,
};
use tally_types::{Amount, MethodId, MethodKind};

use crate::cli::*;
use crate::config::TallyFile;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Methods(args) => cmd_methods(&cli.config, args, format),
        Command::Resolve(args) => cmd_resolve(&cli.config, args, format),
        Command::Quick(args) => cmd_quick(&cli.config, args, format),
        Command::Settle(args) => cmd_settle(&cli.config, args, format).await,
        Command::Audit(args) => cmd_audit(&cli.config, args, format).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct MethodRow {
    id: String,
    name: String,
    kind: MethodKind,
    requires_reference: bool,
    reference_hint: Option<String>,
    account_id: Option<String>,
    account_name: Option<String>,
}

fn cmd_methods(config: &Path, args: MethodsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = TallyFile::load(config)?.catalog()?;
    let accounts = catalog.list_accounts()?;
    let rows: Vec<MethodRow> = catalog
        .list_methods()?
        .iter()
        .map(|method| {
            let account = CompatibilityResolver::resolve_in(method, &accounts);
            MethodRow {
                id: method.id.to_string(),
                name: method.name.clone(),
                kind: method.kind,
                requires_reference: method.requires_reference,
                reference_hint: method.reference_format.as_ref().map(|f| f.hint()),
                account_id: account.map(|a| a.id.to_string()),
                account_name: account.map(|a| a.name.clone()),
            }
        })
        .filter(|row| !args.usable || row.account_id.is_some())
        .collect();

    if let OutputFormat::Json = format {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("{}", LedgerError::CatalogEmpty.to_string().yellow());
        return Ok(());
    }
    for row in &rows {
        let target = match (&row.account_name, &row.account_id) {
            (Some(name), Some(id)) => format!("{} ({})", name, id.dimmed()),
            _ => "no compatible account".red().to_string(),
        };
        println!(
            "  {:<12} {:<18} {:<14} → {}",
            row.id.bold(),
            row.name,
            row.kind.to_string().cyan(),
            target
        );
        if row.requires_reference {
            let hint = row.reference_hint.as_deref().unwrap_or("any non-blank text");
            println!("  {:<12} reference: {}", "", hint.dimmed());
        }
    }
    Ok(())
}

fn cmd_resolve(config: &Path, args: ResolveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = TallyFile::load(config)?.catalog()?;
    let method_id = MethodId::new(args.method);
    let method = catalog
        .method(&method_id)?
        .ok_or_else(|| LedgerError::UnknownMethod {
            method: method_id.clone(),
        })?;
    let account = CompatibilityResolver::resolve(&catalog, &method)?.ok_or_else(|| {
        LedgerError::NoCompatibleAccount {
            method: method_id.clone(),
        }
    })?;

    if let OutputFormat::Json = format {
        return print_json(&serde_json::json!({ "method": method, "account": account }));
    }
    println!(
        "{} {} → {} ({})",
        "✓".green().bold(),
        method.name.bold(),
        account.name.yellow(),
        account.id
    );
    Ok(())
}

fn cmd_quick(config: &Path, args: QuickArgs, format: OutputFormat) -> anyhow::Result<()> {
    // Quick amounts need only the currency, so the file is optional here.
    let file = if config.exists() {
        TallyFile::load(config)?
    } else {
        TallyFile::default()
    };
    let currency = &file.session.currency;
    let target = currency.parse(&args.target)?;
    let paid = match &args.paid {
        Some(paid) => currency.parse(paid)?,
        None => Amount::ZERO,
    };
    if !target.is_positive() {
        bail!(LedgerError::InvalidTarget(currency.money(target)));
    }
    let remaining = target - paid;
    if remaining.is_negative() {
        bail!(
            "paid {} exceeds target {}",
            currency.format(paid),
            currency.format(target)
        );
    }

    let quick: Vec<QuickAmount> = QuickFraction::ALL
        .into_iter()
        .map(|fraction| QuickAmount {
            fraction,
            label: fraction.label().to_string(),
            amount: fraction.apply(target, remaining),
        })
        .collect();

    if let OutputFormat::Json = format {
        return print_json(&quick);
    }
    println!("Remaining: {}", currency.format(remaining).bold());
    for q in &quick {
        println!("  {:>5}  {}", q.label.cyan(), currency.format(q.amount));
    }
    Ok(())
}

async fn cmd_settle(config: &Path, args: SettleArgs, format: OutputFormat) -> anyhow::Result<()> {
    if args.payments.is_empty() {
        bail!("add at least one --pay method[=amount][:reference]");
    }
    let file = TallyFile::load(config)?;
    let catalog = file.catalog()?;
    let currency = file.session.currency.clone();
    let target = currency
        .parse(&args.target)
        .with_context(|| format!("invalid target '{}'", args.target))?;

    let context = SessionContext {
        customer_id: args.customer,
        customer_name: args.customer_name,
        description: args.description,
    };
    let mut session = SettlementSession::start(target, context, file.session, Arc::new(catalog))?;

    for payment in &args.payments {
        let mut draft = DraftEntry::new(payment.method.as_str());
        if let Some(amount) = &payment.amount {
            draft = draft.amount(
                currency
                    .parse(amount)
                    .with_context(|| format!("invalid amount for {}", payment.method))?,
            );
        }
        if let Some(reference) = &payment.reference {
            draft = draft.reference(reference.as_str());
        }
        let entry = session
            .add_draft(&draft)
            .with_context(|| format!("cannot add {} payment", payment.method))?;

        if let OutputFormat::Text = format {
            println!(
                "{} {} {} → {}   remaining {} ({}%)",
                "+".green().bold(),
                entry.method_name.bold(),
                currency.format_plain(entry.amount),
                entry.account_name,
                currency.format(session.remaining()).yellow(),
                session.progress_percent()
            );
        }
    }

    let sink: Box<dyn SettlementSink> = match &args.out {
        Some(path) => Box::new(JsonLinesSink::new(path)),
        None => Box::new(RecordingSink::new()),
    };
    let ticket = session.begin_submit().context("settlement is not ready to submit")?;
    let timeout = Duration::from_millis(args.timeout_ms);
    match tokio::time::timeout(timeout, sink.submit(ticket.settlement())).await {
        Ok(result) => session.complete_submit(&ticket, result)?,
        Err(_) => {
            session.abort_submit()?;
            bail!("settlement sink did not answer within {}ms", args.timeout_ms);
        }
    }
    let settlement = ticket.into_settlement();

    if let OutputFormat::Json = format {
        return print_json(&settlement);
    }
    println!(
        "{} Settlement submitted (attempt {})",
        "✓".green().bold(),
        settlement.attempt
    );
    println!("  {}", session.snapshot().summary());
    let change = settlement.change_due();
    if change.is_positive() {
        println!("  Change due: {}", currency.format(change).yellow());
    }
    println!("  Digest: {}", settlement.digest[..16].dimmed());
    match &args.out {
        Some(path) => println!("  Written to {}", path.display()),
        None => println!("  {}", "dry run: no --out file given".dimmed()),
    }
    Ok(())
}

#[derive(Serialize)]
struct AuditRow {
    session_id: String,
    attempt: u32,
    digest_matches: bool,
    report: LedgerReport,
}

async fn cmd_audit(config: &Path, args: AuditArgs, format: OutputFormat) -> anyhow::Result<()> {
    let file = TallyFile::load(config)?;
    let catalog = file.catalog()?;
    let settlements = JsonLinesSink::new(&args.file)
        .read_all()
        .await
        .with_context(|| format!("cannot read settlements from {}", args.file.display()))?;

    let mut rows = Vec::with_capacity(settlements.len());
    for settlement in settlements {
        let ledger = SettlementLedger::restore(
            settlement.target,
            settlement.currency.clone(),
            settlement.entries.clone(),
        )?;
        let report = LedgerValidator::validate(&ledger, &catalog)?;
        let digest_matches =
            settlement_digest(settlement.target, &settlement.entries)? == settlement.digest;
        rows.push(AuditRow {
            session_id: settlement.session_id.to_string(),
            attempt: settlement.attempt,
            digest_matches,
            report,
        });
    }
    let failed = rows
        .iter()
        .filter(|r| !r.digest_matches || !r.report.is_valid())
        .count();

    if let OutputFormat::Json = format {
        print_json(&rows)?;
    } else {
        let currency = &file.session.currency;
        for row in &rows {
            let ok = row.digest_matches && row.report.is_valid();
            let mark = if ok { "✓".green().bold() } else { "✗".red().bold() };
            println!(
                "{} {} (attempt {}): {} entries, {} of {}",
                mark,
                row.session_id[..8].yellow(),
                row.attempt,
                row.report.entry_count,
                currency.format_plain(row.report.total_paid),
                currency.format_plain(row.report.target)
            );
            if !row.digest_matches {
                println!("    {}", "digest does not match entries".red());
            }
            for violation in &row.report.violations {
                println!("    {:?}: {}", violation.kind, violation.description);
            }
        }
        println!("{} settlement(s) audited, {} failed", rows.len(), failed);
    }

    if failed > 0 {
        bail!("{failed} settlement(s) failed audit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    const SHOP: &str = r#"
        [[methods]]
        id = "cash"
        name = "Cash"
        type = "cash"

        [[methods]]
        id = "mpesa"
        name = "M-Pesa"
        type = "mobile_money"
        reference_format = { min_len = 10, max_len = 10, charset = "alphanumeric", uppercase = true }

        [[methods]]
        id = "bank"
        name = "Bank Transfer"
        type = "bank"
        requires_reference = true

        [[accounts]]
        id = "till-1"
        name = "Till #1"
        type = "cash"

        [[accounts]]
        id = "mpesa-till"
        name = "M-Pesa Till"
        type = "mobile_money"
    "#;

    fn workspace() -> (tempfile::TempDir, String, String) {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("tally.toml");
        std::fs::write(&config, SHOP).unwrap();
        let out = dir.path().join("settlements.jsonl");
        let config = config.to_string_lossy().into_owned();
        let out = out.to_string_lossy().into_owned();
        (dir, config, out)
    }

    async fn run(args: &[&str]) -> anyhow::Result<()> {
        run_command(Cli::try_parse_from(args).unwrap()).await
    }

    #[tokio::test]
    async fn settle_then_audit() {
        let (_dir, config, out) = workspace();
        run(&[
            "tally", "--config", &config, "settle", "--target", "1,500.00",
            "--pay", "cash=500", "--pay", "mpesa=:qhx4k2l9pz", "--out", &out,
        ])
        .await
        .unwrap();

        let stored = JsonLinesSink::new(&out).read_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].entries[1].amount, Amount::from_minor(100_000));
        assert_eq!(stored[0].entries[1].reference.as_deref(), Some("QHX4K2L9PZ"));

        run(&["tally", "--config", &config, "audit", &out]).await.unwrap();
    }

    #[tokio::test]
    async fn settle_reports_underpayment() {
        let (_dir, config, out) = workspace();
        let err = run(&[
            "tally", "--config", &config, "settle", "--target", "100",
            "--pay", "cash=40", "--out", &out,
        ])
        .await
        .unwrap_err();
        assert!(format!("{err:#}")
            .contains("remaining balance TZS 60.00 does not satisfy the at_least_covered policy"));
        assert!(!Path::new(&out).exists());
    }

    #[tokio::test]
    async fn settle_reports_overpayment_in_currency_units() {
        let (_dir, config, _out) = workspace();
        let err = run(&[
            "tally", "--config", &config, "settle", "--target", "40", "--pay", "cash=50",
        ])
        .await
        .unwrap_err();
        assert!(format!("{err:#}")
            .contains("amount TZS 50.00 exceeds the remaining balance TZS 40.00"));
    }

    #[tokio::test]
    async fn settle_rejects_unusable_method() {
        let (_dir, config, _out) = workspace();
        let err = run(&[
            "tally", "--config", &config, "settle", "--target", "100", "--pay", "bank=100:SLIP-1",
        ])
        .await
        .unwrap_err();
        assert!(format!("{err:#}").contains("no compatible account"));
    }

    #[tokio::test]
    async fn resolve_and_methods() {
        let (_dir, config, _out) = workspace();
        run(&["tally", "--config", &config, "resolve", "mpesa"]).await.unwrap();
        assert!(run(&["tally", "--config", &config, "resolve", "bank"]).await.is_err());
        assert!(run(&["tally", "--config", &config, "resolve", "amex"]).await.is_err());
        run(&["tally", "--config", &config, "--format", "json", "methods", "--usable"])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn quick_without_config() {
        run(&["tally", "--config", "/nonexistent/tally.toml", "quick", "--target", "100", "--paid", "40"])
            .await
            .unwrap();
        assert!(run(&["tally", "--config", "/nonexistent/tally.toml", "quick", "--target", "100", "--paid", "140"])
            .await
            .is_err());
    }
}
