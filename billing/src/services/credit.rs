//! Credit service: admin top-ups (single and bulk), employer-initiated
//! credit requests, and the paginated ledger read.
//!
//! Every mutation is one transaction owned here: the wallet increment and
//! its ledger append commit together or not at all.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use worklane_database::models::{LedgerEntry, NewLedgerEntry, PaginatedResult, Pagination};
use worklane_database::repositories::{company, ledger, wallet};
use worklane_models::billing::{LedgerKind, LedgerStatus};
use worklane_models::wallet::{
    AddCreditRequest, BulkAddCreditRequest, BulkCreditResponse, CreditResponse, LedgerQuery,
    RequestCreditRequest,
};

use crate::errors::ServiceError;

pub struct CreditService {
    pool: PgPool,
}

impl CreditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn add_credit_single(
        &self,
        req: &AddCreditRequest,
    ) -> Result<CreditResponse, ServiceError> {
        let mut tx = self.pool.begin().await?;

        if !company::employer_exists(&mut tx, req.employer_id).await? {
            return Err(ServiceError::NotFound(format!(
                "employer {} not found",
                req.employer_id
            )));
        }

        ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: req.employer_id,
                employee_id: None,
                amount: req.amount,
                kind: LedgerKind::Credit.to_string(),
                reference_note: req.reference_note.clone(),
                payment_mode: req.payment_mode.clone(),
                external_transaction_id: req.transaction_id.clone(),
                status: LedgerStatus::Success.to_string(),
                actor_id: req.actor_id,
            },
        )
        .await?;

        let updated = wallet::credit(&mut tx, req.employer_id, req.amount).await?;
        tx.commit().await?;

        info!(
            employer_id = %req.employer_id,
            amount = %req.amount,
            new_balance = %updated.balance,
            "credit added"
        );
        Ok(CreditResponse {
            employer_id: req.employer_id,
            amount: req.amount,
            new_balance: updated.balance,
        })
    }

    /// All-or-nothing across the batch: the membership check runs up
    /// front, and any later failure rolls back every wallet and ledger
    /// write in the batch.
    pub async fn add_credit_bulk(
        &self,
        req: &BulkAddCreditRequest,
    ) -> Result<BulkCreditResponse, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let existing: HashSet<Uuid> = company::existing_employer_ids(&mut tx, &req.employer_ids)
            .await?
            .into_iter()
            .collect();
        let missing: Vec<Uuid> = req
            .employer_ids
            .iter()
            .filter(|id| !existing.contains(id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "unknown employers: {:?}",
                missing
            )));
        }

        let mut results = Vec::with_capacity(req.employer_ids.len());
        for employer_id in &req.employer_ids {
            // Take the row lock before mutating so concurrent top-ups to
            // the same wallet serialize on the wallet row.
            wallet::lock_or_create(&mut tx, *employer_id).await?;

            ledger::append(
                &mut tx,
                &NewLedgerEntry {
                    employer_id: *employer_id,
                    employee_id: None,
                    amount: req.amount,
                    kind: LedgerKind::Credit.to_string(),
                    reference_note: req.reference_note.clone(),
                    payment_mode: req.payment_mode.clone(),
                    external_transaction_id: req.transaction_id.clone(),
                    status: LedgerStatus::Success.to_string(),
                    actor_id: req.actor_id,
                },
            )
            .await?;

            let updated = wallet::credit(&mut tx, *employer_id, req.amount).await?;
            results.push(CreditResponse {
                employer_id: *employer_id,
                amount: req.amount,
                new_balance: updated.balance,
            });
        }

        tx.commit().await?;
        info!(
            employers = req.employer_ids.len(),
            amount = %req.amount,
            "bulk credit applied"
        );
        Ok(BulkCreditResponse { results })
    }

    /// Employer-initiated request: lands in the ledger as `pending`, no
    /// wallet mutation until an admin resolves it.
    pub async fn request_credit(
        &self,
        req: &RequestCreditRequest,
    ) -> Result<LedgerEntry, ServiceError> {
        let mut tx = self.pool.begin().await?;

        if !company::employer_exists(&mut tx, req.employer_id).await? {
            return Err(ServiceError::NotFound(format!(
                "employer {} not found",
                req.employer_id
            )));
        }

        let entry = ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: req.employer_id,
                employee_id: None,
                amount: req.amount,
                kind: LedgerKind::Credit.to_string(),
                reference_note: req.reference_note.clone(),
                payment_mode: req.payment_mode.clone(),
                external_transaction_id: req.transaction_id.clone(),
                status: LedgerStatus::Pending.to_string(),
                actor_id: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    pub async fn approve_credit_request(
        &self,
        entry_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<CreditResponse, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let entry = ledger::find_by_id(&mut tx, entry_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("ledger entry {} not found", entry_id))
            })?;
        if entry.status != LedgerStatus::Pending.as_str() {
            return Err(ServiceError::State(format!(
                "credit request {} is already {}",
                entry_id, entry.status
            )));
        }

        wallet::lock_or_create(&mut tx, entry.employer_id).await?;
        let resolved = ledger::resolve_pending(
            &mut tx,
            entry_id,
            LedgerStatus::Success.as_str(),
            None,
        )
        .await?
        .ok_or_else(|| {
            ServiceError::State(format!("credit request {} is no longer pending", entry_id))
        })?;
        let updated = wallet::credit(&mut tx, resolved.employer_id, resolved.amount).await?;

        tx.commit().await?;
        info!(
            entry_id = %entry_id,
            employer_id = %resolved.employer_id,
            actor_id = ?actor_id,
            "credit request approved"
        );
        Ok(CreditResponse {
            employer_id: resolved.employer_id,
            amount: resolved.amount,
            new_balance: updated.balance,
        })
    }

    pub async fn reject_credit_request(
        &self,
        entry_id: Uuid,
        reason: &str,
        actor_id: Option<Uuid>,
    ) -> Result<LedgerEntry, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let entry = ledger::find_by_id(&mut tx, entry_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("ledger entry {} not found", entry_id))
            })?;
        if entry.status != LedgerStatus::Pending.as_str() {
            return Err(ServiceError::State(format!(
                "credit request {} is already {}",
                entry_id, entry.status
            )));
        }

        let suffix = format!(" | rejected: {}", reason);
        let resolved = ledger::resolve_pending(
            &mut tx,
            entry_id,
            LedgerStatus::Failed.as_str(),
            Some(&suffix),
        )
        .await?
        .ok_or_else(|| {
            ServiceError::State(format!("credit request {} is no longer pending", entry_id))
        })?;

        tx.commit().await?;
        info!(entry_id = %entry_id, actor_id = ?actor_id, "credit request rejected");
        Ok(resolved)
    }

    /// Voids an unsettled entry. Settled entries already moved a wallet
    /// balance and can only be corrected by appending a new entry, so
    /// voiding one is a state error.
    pub async fn void_ledger_entry(&self, entry_id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        let entry = ledger::find_by_id(&mut tx, entry_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("ledger entry {} not found", entry_id))
            })?;
        if entry.status == LedgerStatus::Success.as_str() {
            return Err(ServiceError::State(format!(
                "ledger entry {} is settled and cannot be voided",
                entry_id
            )));
        }

        if !ledger::soft_delete(&mut tx, entry_id).await? {
            return Err(ServiceError::NotFound(format!(
                "ledger entry {} not found",
                entry_id
            )));
        }

        tx.commit().await?;
        info!(entry_id = %entry_id, "ledger entry voided");
        Ok(())
    }

    pub async fn list_ledger(
        &self,
        query: &LedgerQuery,
    ) -> Result<PaginatedResult<LedgerEntry>, ServiceError> {
        if let Some(kind) = &query.kind {
            kind.parse::<LedgerKind>()
                .map_err(ServiceError::Validation)?;
        }

        let pagination = pagination_from(query.page, query.per_page);
        let filter = ledger::LedgerFilter {
            employer_id: query.employer_id,
            kind: query.kind.clone(),
            from: query.from,
            to: query.to,
        };
        Ok(ledger::list(&self.pool, &filter, &pagination).await?)
    }
}

pub(crate) fn pagination_from(page: Option<i64>, per_page: Option<i64>) -> Pagination {
    let per_page = per_page.unwrap_or(20).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    Pagination::page(page, per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_out_of_range_input() {
        let p = pagination_from(None, None);
        assert_eq!((p.limit, p.offset), (20, 0));
        let p = pagination_from(Some(0), Some(1000));
        assert_eq!((p.limit, p.offset), (100, 0));
        let p = pagination_from(Some(4), Some(10));
        assert_eq!((p.limit, p.offset), (10, 30));
    }
}
