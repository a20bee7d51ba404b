//! Wallet settlement and the session payment ledger
//!
//! All mutations here run inside the owning session's critical section.
//! A completed transaction means the amount left the wallet and entered
//! session revenue exactly once.

use chrono::{DateTime, Utc};
use jukevote_common::{Error, Result};
use serde::Serialize;
use uuid::Uuid;

use super::session::SessionState;

/// Settlement lifecycle of one payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Refunded,
}

/// One ledger entry tying a listener payment to a request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub listener_id: Uuid,
    pub request_id: Uuid,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub method: &'static str,
}

/// Settle a paid request against the listener's wallet.
///
/// Called exactly once per paid request, by submission. Deducts the wallet,
/// credits session revenue, and records a completed transaction as one
/// step; the balance check keeps the non-negative wallet invariant local
/// even though the caller validated it already.
pub fn settle(
    session: &mut SessionState,
    listener_id: Uuid,
    request_id: Uuid,
    amount: f64,
) -> Result<()> {
    let listener = session
        .listeners
        .get_mut(&listener_id)
        .ok_or(Error::ListenerNotFound(listener_id))?;
    if listener.wallet_balance < amount {
        return Err(Error::InsufficientFunds {
            balance: listener.wallet_balance,
            required: amount,
        });
    }
    listener.wallet_balance -= amount;
    listener.total_spent += amount;
    session.revenue += amount;
    session.transactions.push(PaymentTransaction {
        id: Uuid::new_v4(),
        listener_id,
        request_id,
        amount,
        timestamp: Utc::now(),
        status: TransactionStatus::Completed,
        method: "wallet",
    });
    Ok(())
}

/// Credit a listener's wallet; returns the new balance
pub fn add_funds(session: &mut SessionState, listener_id: Uuid, amount: f64) -> Result<f64> {
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidPaymentAmount(format!(
            "top-up amount must be positive, got {amount}"
        )));
    }
    let listener = session
        .listeners
        .get_mut(&listener_id)
        .ok_or(Error::ListenerNotFound(listener_id))?;
    listener.wallet_balance += amount;
    listener.touch();
    Ok(listener.wallet_balance)
}

/// Sum of completed transaction amounts; by the conservation law this
/// always equals the session's revenue counter
pub fn settled_total(session: &SessionState) -> f64 {
    session
        .transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Completed)
        .map(|t| t.amount)
        .sum()
}
