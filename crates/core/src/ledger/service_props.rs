//! Property-based tests for LedgerService.
//!
//! - Hour budget: no sequence of entry writes pushes a contract past its hours.
//! - Running totals: delta-maintained totals always equal a fresh recompute.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::{contract_hours_used, recomputed_total, stored_total};
use super::book::Book;
use super::service::LedgerService;
use super::types::{
    ClientInput, NewContract, NewPayment, PaymentPatch, ProjectInput, Target, TimeEntryInput,
};
use timebill_shared::types::{ContractId, ProjectId};

/// Strategy to generate positive hours (0.25 to 8.00).
fn hours() -> impl Strategy<Value = Decimal> {
    (1i64..=32).prop_map(|quarters| Decimal::new(quarters * 25, 2))
}

/// Strategy to generate positive amounts (0.01 to 2,000.00).
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..200_000).prop_map(|cents| Decimal::new(cents, 2))
}

#[derive(Debug, Clone)]
enum EntryOp {
    Record(Decimal),
    Update(usize, Decimal),
    Delete(usize),
}

fn entry_op() -> impl Strategy<Value = EntryOp> {
    prop_oneof![
        3 => hours().prop_map(EntryOp::Record),
        2 => (any::<usize>(), hours()).prop_map(|(i, h)| EntryOp::Update(i, h)),
        1 => any::<usize>().prop_map(EntryOp::Delete),
    ]
}

#[derive(Debug, Clone)]
enum MoneyOp {
    Pay(bool, Decimal),
    Adjust(usize, Decimal),
    Refund(usize),
    Bill(Decimal),
    Rebill(usize, Decimal),
    Unbill(usize),
}

fn money_op() -> impl Strategy<Value = MoneyOp> {
    prop_oneof![
        3 => (any::<bool>(), amount()).prop_map(|(c, a)| MoneyOp::Pay(c, a)),
        2 => (any::<usize>(), amount()).prop_map(|(i, a)| MoneyOp::Adjust(i, a)),
        1 => any::<usize>().prop_map(MoneyOp::Refund),
        3 => hours().prop_map(MoneyOp::Bill),
        2 => (any::<usize>(), hours()).prop_map(|(i, h)| MoneyOp::Rebill(i, h)),
        1 => any::<usize>().prop_map(MoneyOp::Unbill),
    ]
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

/// Book with one client, one 40h contract at 75/h, and one independent project at 30/h.
fn seeded() -> (Book, ContractId, ProjectId) {
    let mut book = Book::from_collections(vec![], vec![], vec![], vec![], vec![], vec![], now());
    let client = LedgerService::create_client(
        &mut book,
        ClientInput {
            name: Some("Acme".to_string()),
            email: Some("ops@acme.io".to_string()),
            ..ClientInput::default()
        },
        now(),
    )
    .unwrap();
    let contract = LedgerService::create_contract(
        &mut book,
        NewContract {
            client_id: client.id,
            contract_number: "C-1".to_string(),
            description: None,
            total_hours: Decimal::from(40),
            hourly_rate: Decimal::from(75),
            status: None,
            start_date: None,
            end_date: None,
        },
        now(),
    )
    .unwrap();
    let project = LedgerService::create_project(
        &mut book,
        ProjectInput {
            name: Some("Side job".to_string()),
            is_independent: Some(true),
            hourly_rate: Some(Decimal::from(30)),
            client_name: Some("Walk-in".to_string()),
            estimated_hours: Some(Decimal::from(100)),
            ..ProjectInput::default()
        },
        now(),
    )
    .unwrap();
    (book, contract.id, project.id)
}

fn entry(contract_id: Option<ContractId>, project_id: Option<ProjectId>, hours: Decimal) -> TimeEntryInput {
    TimeEntryInput {
        contract_id,
        project_id,
        category_id: None,
        description: "Work".to_string(),
        hours_used: hours,
        entry_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of entry writes, used hours never exceed the contract's budget,
    /// and a rejected write leaves the used hours unchanged.
    #[test]
    fn prop_contract_hours_never_exceeded(ops in prop::collection::vec(entry_op(), 1..40)) {
        let (mut book, contract, _) = seeded();
        let total = book.contract(contract).unwrap().total_hours;

        for op in ops {
            let before = contract_hours_used(&book.time_entries, contract);
            let ids: Vec<_> = book.time_entries.iter().map(|e| e.id).collect();
            let result = match op {
                EntryOp::Record(h) => {
                    LedgerService::record_time_entry(&mut book, entry(Some(contract), None, h), now()).map(|_| ())
                }
                EntryOp::Update(i, h) if !ids.is_empty() => {
                    let id = ids[i % ids.len()];
                    LedgerService::update_time_entry(&mut book, id, entry(Some(contract), None, h), now()).map(|_| ())
                }
                EntryOp::Delete(i) if !ids.is_empty() => {
                    LedgerService::delete_time_entry(&mut book, ids[i % ids.len()], now()).map(|_| ())
                }
                _ => Ok(()),
            };

            let after = contract_hours_used(&book.time_entries, contract);
            prop_assert!(after <= total, "used {} exceeds budget {}", after, total);
            if result.is_err() {
                prop_assert_eq!(before, after);
            }
        }
    }

    /// *For any* mix of payments and billed entries, the stored running totals
    /// equal the totals recomputed from leaf records.
    #[test]
    fn prop_running_totals_match_recompute(ops in prop::collection::vec(money_op(), 1..50)) {
        let (mut book, contract, project) = seeded();

        for op in ops {
            let payments: Vec<_> = book.payments.iter().map(|p| p.id).collect();
            let entries: Vec<_> = book.time_entries.iter().map(|e| e.id).collect();
            match op {
                MoneyOp::Pay(to_contract, a) => {
                    let target = if to_contract { Target::Contract(contract) } else { Target::Project(project) };
                    let input = NewPayment {
                        target,
                        amount: Some(a),
                        payment_date: None,
                        payment_type: None,
                        percentage: None,
                        notes: None,
                    };
                    LedgerService::record_payment(&mut book, input, now()).unwrap();
                }
                MoneyOp::Adjust(i, a) if !payments.is_empty() => {
                    let patch = PaymentPatch { amount: Some(a), ..PaymentPatch::default() };
                    LedgerService::update_payment(&mut book, payments[i % payments.len()], patch, now()).unwrap();
                }
                MoneyOp::Refund(i) if !payments.is_empty() => {
                    LedgerService::delete_payment(&mut book, payments[i % payments.len()], now()).unwrap();
                }
                MoneyOp::Bill(h) => {
                    LedgerService::record_time_entry(&mut book, entry(None, Some(project), h), now()).unwrap();
                }
                MoneyOp::Rebill(i, h) if !entries.is_empty() => {
                    let id = entries[i % entries.len()];
                    LedgerService::update_time_entry(&mut book, id, entry(None, Some(project), h), now()).unwrap();
                }
                MoneyOp::Unbill(i) if !entries.is_empty() => {
                    LedgerService::delete_time_entry(&mut book, entries[i % entries.len()], now()).unwrap();
                }
                _ => {}
            }

            for target in [Target::Contract(contract), Target::Project(project)] {
                prop_assert_eq!(stored_total(&book, target), Some(recomputed_total(&book, target)));
            }
        }

        prop_assert!(LedgerService::resync_balances(&mut book, now()).is_empty());
    }
}
