//! Subcommand handlers.
//!
//! Each handler takes the shared [`AppContext`] and prints to stdout.
//! Failures are returned to `main`, which renders them.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use creditline_core::gateways::{TransactionFile, DEFAULT_BANK_LIMIT};
use creditline_core::models::{
    Bank, CityTier, LoanForm, LoanRecord, LoginRequest, Registration, UserProfile,
};
use creditline_core::utils::{format_currency, format_date, format_percent, format_phone, truncate_string};
use creditline_core::views::{
    AcceptanceRate, BehaviorView, CachedLoan, LoanBook, LoanSummary, ThreadRandom,
};
use creditline_core::{AppContext, Config, SessionState};
use tracing::{debug, warn};

/// Width of the name column in tables.
const NAME_WIDTH: usize = 28;

fn require_user(ctx: &AppContext) -> Result<UserProfile> {
    ctx.session
        .user()
        .ok_or_else(|| anyhow::anyhow!("Not signed in. Run `creditline login` first."))
}

// ============================================================================
// Session
// ============================================================================

pub async fn login(ctx: &AppContext, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => crate::prompt::required("Email", config.last_email.as_deref())?,
    };
    let password = crate::prompt::password("Password")?;

    let user = ctx.session.login(&LoginRequest::new(email.clone(), password)).await?;
    println!("Signed in as {}", user.display_name());

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

pub async fn register(ctx: &AppContext, config: &mut Config) -> Result<()> {
    let full_name = crate::prompt::required("Full name", None)?;
    let email = crate::prompt::required("Email", None)?;
    let phone = crate::prompt::required("Phone", None)?;
    let city_tier: CityTier = crate::prompt::parsed("City tier (1, 2 or 3)")?;
    let password = crate::prompt::password("Password")?;
    let confirm = crate::prompt::password("Confirm password")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let registration = Registration {
        full_name,
        email: email.clone(),
        phone,
        city_tier,
        password,
    };
    let user = ctx.session.register(&registration).await?;
    println!("Welcome, {}! Your account is ready.", user.display_name());

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
    Ok(())
}

pub fn logout(ctx: &AppContext) {
    let was_signed_in = ctx.session.state() != SessionState::Unauthenticated;
    ctx.session.logout();
    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
}

pub fn status(ctx: &AppContext, config: &Config) {
    println!("Backend:  {}", config.api_url());
    println!("Session:  {}", ctx.session.state().label());
    if let Some(user) = ctx.session.user() {
        println!("Name:     {}", user.display_name());
        if let Some(email) = &user.email {
            println!("Email:    {}", email);
        }
        if let Some(phone) = &user.phone {
            println!("Phone:    {}", format_phone(phone));
        }
        if let Some(tier) = &user.city_tier {
            println!("City:     {}", tier);
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

pub async fn dashboard(ctx: &AppContext) -> Result<()> {
    let user = require_user(ctx)?;

    let (loans, behavior) = futures::join!(
        ctx.loans.user_loans(&user.id),
        ctx.transactions.analyze(&user.id),
    );

    println!("Welcome back, {}", user.display_name());
    println!();

    match loans {
        Ok(records) => {
            let summary = LoanSummary::from_records(&records);
            println!("Applications:     {}", summary.total_applications);
            println!("Total requested:  {}", format_currency(summary.total_requested));
            println!("Active loans:     {}", summary.active);
        }
        Err(e) => println!("Loans unavailable: {}", e.message()),
    }
    println!();

    match behavior {
        Ok(payload) => {
            let view = BehaviorView::from_payload(&payload);
            if view.has_data {
                println!(
                    "Behavior score:   {:.1} / {:.0} ({})",
                    view.total_score,
                    view.max_score,
                    view.rating_label()
                );
            } else {
                println!("Behavior score:   no statements uploaded yet");
            }
        }
        Err(e) => println!("Behavior score unavailable: {}", e.message()),
    }
    Ok(())
}

// ============================================================================
// Loans
// ============================================================================

const LOAN_HEADER: [&str; 6] = ["ID", "AMOUNT", "TERM", "STATUS", "ACCEPTANCE", "APPLIED"];

/// Acceptance rate of a loan fetched from the backend, shown as reported.
fn reported_rate_label(record: &LoanRecord) -> String {
    record
        .acceptance_rate
        .map(format_percent)
        .unwrap_or_else(|| "-".to_string())
}

/// Acceptance rate of an application made in this run. A placeholder is
/// marked as an estimate.
fn cached_rate_label(loan: &CachedLoan) -> String {
    match loan.acceptance_rate {
        AcceptanceRate::Reported(value) => format_percent(value),
        AcceptanceRate::Placeholder(value) => format!("{}% (est.)", value),
    }
}

fn loan_row(cells: [&str; 6]) -> String {
    format!(
        "{:<8} {:>14} {:>6} {:<12} {:>12} {}",
        cells[0], cells[1], cells[2], cells[3], cells[4], cells[5]
    )
}

fn record_row(record: &LoanRecord, rate: &str) -> String {
    let amount = record.amount_requested.map(format_currency).unwrap_or_default();
    let term = record.loan_duration.map(|d| format!("{}m", d)).unwrap_or_default();
    let applied = record.created_at.as_deref().map(format_date).unwrap_or_default();
    loan_row([
        record.id.as_deref().unwrap_or("-"),
        &amount,
        &term,
        record.status.as_deref().unwrap_or("unknown"),
        rate,
        &applied,
    ])
}

pub async fn loans(ctx: &AppContext) -> Result<()> {
    let user = require_user(ctx)?;
    let records = ctx.loans.user_loans(&user.id).await?;
    if records.is_empty() {
        println!("No loan applications yet. Run `creditline apply` to start one.");
        return Ok(());
    }

    println!("{}", loan_row(LOAN_HEADER));
    for record in &records {
        println!("{}", record_row(record, &reported_rate_label(record)));
    }

    let summary = LoanSummary::from_records(&records);
    println!();
    println!(
        "{} applications, {} requested, {} active",
        summary.total_applications,
        format_currency(summary.total_requested),
        summary.active
    );
    Ok(())
}

pub async fn loan(ctx: &AppContext, loan_id: &str) -> Result<()> {
    require_user(ctx)?;
    let record = ctx.loans.loan(loan_id).await?;

    println!("Loan {}", record.id.as_deref().unwrap_or(loan_id));
    if let Some(amount) = record.amount_requested {
        println!("  Amount:      {}", format_currency(amount));
    }
    if let Some(duration) = record.loan_duration {
        println!("  Duration:    {} months", duration);
    }
    println!("  Status:      {}", record.status.as_deref().unwrap_or("unknown"));
    println!("  Acceptance:  {}", reported_rate_label(&record));
    if let Some(created) = &record.created_at {
        println!("  Applied:     {}", format_date(created));
    }
    Ok(())
}

pub async fn apply(ctx: &AppContext) -> Result<()> {
    require_user(ctx)?;

    let form = LoanForm {
        loan_amount: crate::prompt::parsed("Loan amount")?,
        loan_duration: crate::prompt::parsed("Duration (months)")?,
        monthly_income: crate::prompt::parsed("Monthly income")?,
        total_assets: crate::prompt::parsed("Total assets")?,
        existing_debts_count: crate::prompt::parsed("Existing debts")?,
        total_debt_amount: crate::prompt::parsed("Total debt amount")?,
        monthly_emi: crate::prompt::parsed("Monthly EMI")?,
        city_tier: crate::prompt::parsed("City tier (1, 2 or 3)")?,
    };
    debug!(?form, "Submitting loan application");

    let record = ctx.loans.apply(&form.into()).await?;
    let mut book = LoanBook::new(Arc::new(ThreadRandom));
    let loan = book.record(record);

    println!("Application submitted.");
    println!("{}", loan_row(LOAN_HEADER));
    println!("{}", record_row(&loan.record, &cached_rate_label(loan)));
    Ok(())
}

// ============================================================================
// Behavior
// ============================================================================

fn print_behavior(view: &BehaviorView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    if !view.has_data {
        println!("No behavior data yet. Upload a statement with `creditline upload <file> <monthly_income>`.");
        return Ok(());
    }

    println!(
        "Score:        {:.1} / {:.0}  ({} to go)",
        view.total_score,
        view.max_score,
        view.remaining_score()
    );
    println!("Rating:       {}", view.rating_label());
    if let Some(summary) = view.rating.summary() {
        println!("              {}", summary);
    }
    println!("Inflow:       {}", view.stability_label());
    if !view.cash_inflow_pattern.is_empty() {
        println!("Pattern:      {}", view.cash_inflow_pattern);
    }
    println!("Liquidity:    {:.0} days", view.liquidity_resilience_days);
    println!("History:      {:.0} days", view.transaction_depth_days);
    println!();

    println!(
        "{:<width$} {:>12} {:>8} {:>8}  TARGET",
        "CATEGORY",
        "SPENT",
        "SHARE",
        "LIMIT",
        width = NAME_WIDTH
    );
    for row in view.categories.threshold_comparison() {
        println!(
            "{:<width$} {:>12} {:>8} {:>8}  {}",
            truncate_string(&row.label, NAME_WIDTH),
            format_currency(row.spending),
            format_percent(row.percentage),
            format_percent(row.threshold),
            if row.meets_target { "met" } else { "-" },
            width = NAME_WIDTH
        );
    }
    println!(
        "{} of {} targets met",
        view.categories.targets_met(),
        view.categories.threshold_comparison().len()
    );

    let slices = view.categories.distribution();
    if !slices.is_empty() {
        println!();
        println!("Spending distribution:");
        for slice in slices {
            println!(
                "  {:<width$} {:>6}",
                truncate_string(&slice.label, NAME_WIDTH),
                format_percent(slice.share * 100.0),
                width = NAME_WIDTH
            );
        }
    }
    Ok(())
}

pub async fn behavior(ctx: &AppContext, json: bool) -> Result<()> {
    let user = require_user(ctx)?;
    let payload = ctx.transactions.analyze(&user.id).await?;
    print_behavior(&BehaviorView::from_payload(&payload), json)
}

pub async fn upload(ctx: &AppContext, path: &str, monthly_income: &str, json: bool) -> Result<()> {
    require_user(ctx)?;
    let monthly_income: f64 = monthly_income
        .parse()
        .with_context(|| format!("Invalid monthly income: {}", monthly_income))?;
    let file = TransactionFile::from_path(Path::new(path))?;

    if !json {
        println!("Uploading {}...", file.file_name);
    }
    let payload = ctx.transactions.upload(file, monthly_income).await?;
    print_behavior(&BehaviorView::from_payload(&payload), json)
}

// ============================================================================
// Banks
// ============================================================================

pub async fn banks(ctx: &AppContext, kind: Option<&str>, limit: Option<&str>) -> Result<()> {
    let limit = match limit {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("Invalid limit: {}", raw))?,
        None => DEFAULT_BANK_LIMIT,
    };

    let banks: Vec<Bank> = match kind.unwrap_or("all") {
        "all" => ctx.banks.all().await?,
        "top" => ctx.banks.top(limit).await?,
        "trusted" => ctx.banks.trusted(limit).await?,
        other => anyhow::bail!("Unknown bank list '{}'. Use all, top or trusted.", other),
    };

    if banks.is_empty() {
        println!("No banks found.");
        return Ok(());
    }

    println!("{:<width$} {:>10} {:>8}", "BANK", "RATE", "TRUST", width = NAME_WIDTH);
    for bank in &banks {
        println!(
            "{:<width$} {:>10} {:>8}",
            truncate_string(bank.display_name(), NAME_WIDTH),
            bank.interest_rate.map(format_percent).unwrap_or_else(|| "-".to_string()),
            bank.trust_score.map(|s| format!("{:.0}", s)).unwrap_or_else(|| "-".to_string()),
            width = NAME_WIDTH
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use creditline_core::views::RandomSource;

    struct FixedRandom(u8);

    impl RandomSource for FixedRandom {
        fn uniform_inclusive(&self, _low: u8, _high: u8) -> u8 {
            self.0
        }
    }

    fn record(json: serde_json::Value) -> LoanRecord {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_fetched_loan_without_rate_shows_dash() {
        let stored = record(serde_json::json!({"id": 4, "status": "processing"}));
        assert_eq!(reported_rate_label(&stored), "-");
        assert!(record_row(&stored, &reported_rate_label(&stored)).contains(" - "));
    }

    #[test]
    fn test_fetched_loan_rate_is_shown_as_reported() {
        let stored = record(serde_json::json!({"id": 5, "acceptance_rate": 67.5}));
        assert_eq!(reported_rate_label(&stored), "67.5%");
    }

    #[test]
    fn test_new_application_placeholder_is_marked() {
        let mut book = LoanBook::new(Arc::new(FixedRandom(55)));
        let loan = book.record(record(serde_json::json!({"id": 6})));
        assert_eq!(cached_rate_label(loan), "55% (est.)");
    }
}
