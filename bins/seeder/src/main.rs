//! Demo data seeder for timebill development and testing.
//!
//! Seeds clients, contracts, projects, categories, time entries and payments
//! into the configured storage, plus the bootstrap admin. Runs once: a store
//! that already has clients is left untouched.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use timebill_core::ledger::{
    Book, CategoryInput, ClientInput, LedgerError, LedgerService, NewContract, NewPayment,
    PaymentType, ProjectInput, Target, TimeEntryInput,
};
use timebill_db::{CollectionStore, Repositories, bootstrap};
use timebill_shared::types::{CategoryId, ClientId, ContractId, ProjectId};
use timebill_shared::{AppConfig, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    println!("Opening {} storage...", config.storage.name());
    let store = CollectionStore::from_provider(&config.storage)?;
    let repos = Repositories::new(store, Arc::new(SystemClock));

    println!("Bootstrapping admin...");
    match bootstrap(&repos, &config.bootstrap).await? {
        Some(admin) => println!("  Created admin '{}'", admin.username),
        None => println!("  Users already exist or no admin password set, skipping..."),
    }

    if !repos.ledger.read().await?.clients.is_empty() {
        println!("Ledger already has clients, skipping demo data.");
        return Ok(());
    }

    println!("Seeding demo ledger...");
    let summary = repos.ledger.mutate(seed_demo).await?;
    println!(
        "  {} clients, {} contracts, {} projects, {} time entries, {} payments",
        summary.clients.len(),
        summary.contracts.len(),
        summary.projects.len(),
        summary.time_entries.len(),
        summary.payments.len()
    );

    println!("Seeding complete!");
    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn client(
    book: &mut Book,
    name: &str,
    email: &str,
    company: &str,
    now: DateTime<Utc>,
) -> Result<ClientId, LedgerError> {
    let input = ClientInput {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        company: Some(company.to_string()),
        ..ClientInput::default()
    };
    Ok(LedgerService::create_client(book, input, now)?.id)
}

fn contract(
    book: &mut Book,
    client_id: ClientId,
    number: &str,
    hours: Decimal,
    rate: Decimal,
    now: DateTime<Utc>,
) -> Result<ContractId, LedgerError> {
    let input = NewContract {
        client_id,
        contract_number: number.to_string(),
        description: Some(format!("Support hours bundle {number}")),
        total_hours: hours,
        hourly_rate: rate,
        status: None,
        start_date: Some(date(2026, 1, 1)),
        end_date: Some(date(2026, 12, 31)),
    };
    Ok(LedgerService::create_contract(book, input, now)?.id)
}

fn entry(
    contract_id: Option<ContractId>,
    project_id: Option<ProjectId>,
    category_id: Option<CategoryId>,
    description: &str,
    hours: Decimal,
    on: NaiveDate,
) -> TimeEntryInput {
    TimeEntryInput {
        contract_id,
        project_id,
        category_id,
        description: description.to_string(),
        hours_used: hours,
        entry_date: on,
    }
}

/// Builds the demo ledger; returns the book for the summary line.
fn seed_demo(book: &mut Book, now: DateTime<Utc>) -> Result<Book, LedgerError> {
    let development = LedgerService::create_category(
        book,
        CategoryInput {
            name: Some("Development".to_string()),
            color: Some("#2563EB".to_string()),
            description: Some("Building features".to_string()),
            is_active: None,
        },
        now,
    )?
    .id;
    let meetings = LedgerService::create_category(
        book,
        CategoryInput {
            name: Some("Meetings".to_string()),
            color: Some("#F59E0B".to_string()),
            description: None,
            is_active: None,
        },
        now,
    )?
    .id;

    let acme = client(book, "Acme Corp", "billing@acme.example", "Acme Corporation", now)?;
    let globex = client(book, "Globex", "finance@globex.example", "Globex Inc.", now)?;

    let acme_support = contract(book, acme, "ACME-2026-01", dec!(40), dec!(85), now)?;
    let globex_retainer = contract(book, globex, "GLX-2026-01", dec!(20), dec!(120), now)?;

    let portal = LedgerService::create_project(
        book,
        ProjectInput {
            name: Some("Customer portal".to_string()),
            contract_id: Some(acme_support),
            estimated_hours: Some(dec!(24)),
            ..ProjectInput::default()
        },
        now,
    )?
    .id;
    let landing = LedgerService::create_project(
        book,
        ProjectInput {
            name: Some("Landing page".to_string()),
            is_independent: Some(true),
            hourly_rate: Some(dec!(60)),
            client_name: Some("Initech".to_string()),
            estimated_hours: Some(dec!(15)),
            ..ProjectInput::default()
        },
        now,
    )?
    .id;

    let entries = [
        entry(Some(acme_support), None, Some(meetings), "Kickoff", dec!(1.5), date(2026, 2, 3)),
        entry(Some(acme_support), None, Some(development), "SSO integration", dec!(6), date(2026, 2, 5)),
        entry(None, Some(portal), Some(development), "Portal dashboard", dec!(4), date(2026, 2, 9)),
        entry(Some(globex_retainer), None, None, "Monthly review", dec!(2), date(2026, 2, 12)),
        entry(None, Some(landing), Some(development), "Hero section", dec!(3.5), date(2026, 2, 16)),
        entry(None, None, Some(meetings), "Internal planning", dec!(1), date(2026, 2, 17)),
    ];
    for input in entries {
        LedgerService::record_time_entry(book, input, now)?;
    }

    LedgerService::record_payment(
        book,
        NewPayment {
            target: Target::Contract(acme_support),
            amount: None,
            payment_date: Some(date(2026, 2, 1)),
            payment_type: Some(PaymentType::Advance),
            percentage: Some(dec!(25)),
            notes: Some("Advance invoice".to_string()),
        },
        now,
    )?;
    LedgerService::record_payment(
        book,
        NewPayment {
            target: Target::Contract(globex_retainer),
            amount: Some(dec!(1200)),
            payment_date: Some(date(2026, 2, 20)),
            payment_type: None,
            percentage: None,
            notes: None,
        },
        now,
    )?;

    Ok(book.clone())
}
