//! Maintenance routes.

use axum::{Router, extract::State, routing::post};
use timebill_core::ledger::{BalanceCorrection, LedgerService};
use tracing::{info, warn};

use crate::{AppState, error::ApiResult, extractors::Envelope, middleware::CurrentUser};

/// Creates the maintenance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/maintenance/resync", post(resync_balances))
}

/// POST /maintenance/resync - Recompute billed and paid totals from payments and entries.
///
/// Returns the totals that had drifted.
async fn resync_balances(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Envelope<Vec<BalanceCorrection>>> {
    user.require_maintenance()?;
    let corrections = state
        .repos
        .ledger
        .mutate(|book, now| Ok(LedgerService::resync_balances(book, now)))
        .await?;

    for c in &corrections {
        warn!(target_record = ?c.target, previous = %c.previous, recomputed = %c.recomputed, "running total corrected");
    }
    info!(corrections = corrections.len(), by = %user.user_id(), "balances resynced");
    let message = format!("{} running totals corrected", corrections.len());
    Ok(Envelope::with_message(corrections, message))
}
