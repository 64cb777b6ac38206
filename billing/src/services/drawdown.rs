//! Drawdown service: spends from an employer's wallet to pay a salary, a
//! vendor, or to push credit into an employee's sub-wallet, plus bill
//! payment out of the sub-wallet itself.
//!
//! Every debit path enforces the non-negative floor: a wallet can never
//! be committed below zero, salary included.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use worklane_database::models::NewLedgerEntry;
use worklane_database::repositories::{company, ledger, wallet};
use worklane_models::billing::{LedgerKind, LedgerStatus};
use worklane_models::wallet::{
    AssignCreditRequest, DrawdownResponse, PayBillRequest, PaySalaryRequest, PayVendorRequest,
};

use crate::errors::ServiceError;

pub struct DrawdownService {
    pool: PgPool,
}

impl DrawdownService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pays a salary: debits the employer wallet, credits the employee
    /// sub-wallet, and appends the paired `salary` / `salary_credit`
    /// ledger entries. Four writes, one transaction.
    pub async fn pay_salary(
        &self,
        employee_id: Uuid,
        req: &PaySalaryRequest,
    ) -> Result<DrawdownResponse, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let employee = company::lock_employee(&mut tx, employee_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("employee {} not found", employee_id))
            })?;
        if employee.employer_id != req.employer_id {
            return Err(ServiceError::NotFound(format!(
                "employee {} does not belong to employer {}",
                employee_id, req.employer_id
            )));
        }

        let current = wallet::lock_or_create(&mut tx, req.employer_id).await?;
        if current.balance < req.amount {
            return Err(ServiceError::InsufficientFunds(format!(
                "wallet balance {} is below salary amount {}",
                current.balance, req.amount
            )));
        }

        let updated = wallet::debit(&mut tx, req.employer_id, req.amount).await?;
        let note = match &req.notes {
            Some(notes) => format!("salary {}: {}", req.period, notes),
            None => format!("salary {}", req.period),
        };
        let debit_entry = ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: req.employer_id,
                employee_id: Some(employee_id),
                amount: req.amount,
                kind: LedgerKind::Salary.to_string(),
                reference_note: Some(note.clone()),
                payment_mode: None,
                external_transaction_id: None,
                status: LedgerStatus::Success.to_string(),
                actor_id: req.actor_id,
            },
        )
        .await?;

        company::credit_employee(&mut tx, employee_id, req.amount).await?;
        ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: req.employer_id,
                employee_id: Some(employee_id),
                amount: req.amount,
                kind: LedgerKind::SalaryCredit.to_string(),
                reference_note: Some(note),
                payment_mode: None,
                external_transaction_id: None,
                status: LedgerStatus::Success.to_string(),
                actor_id: req.actor_id,
            },
        )
        .await?;

        tx.commit().await?;
        info!(
            employer_id = %req.employer_id,
            employee_id = %employee_id,
            amount = %req.amount,
            period = %req.period,
            "salary paid"
        );
        Ok(DrawdownResponse {
            employer_id: req.employer_id,
            amount: req.amount,
            new_balance: updated.balance,
            ledger_entry_id: debit_entry.id,
        })
    }

    /// Pays a vendor: debits the employer wallet and settles the vendor;
    /// vendors carry no sub-wallet, so there is no credit side.
    pub async fn pay_vendor(
        &self,
        vendor_id: Uuid,
        req: &PayVendorRequest,
    ) -> Result<DrawdownResponse, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let vendor = company::find_vendor(&mut tx, vendor_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("vendor {} not found", vendor_id)))?;
        if vendor.employer_id != req.employer_id {
            return Err(ServiceError::NotFound(format!(
                "vendor {} does not belong to employer {}",
                vendor_id, req.employer_id
            )));
        }

        let current = wallet::lock_or_create(&mut tx, req.employer_id).await?;
        if current.balance < req.amount {
            return Err(ServiceError::InsufficientFunds(format!(
                "wallet balance {} is below payment amount {}",
                current.balance, req.amount
            )));
        }

        let updated = wallet::debit(&mut tx, req.employer_id, req.amount).await?;
        let entry = ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: req.employer_id,
                employee_id: None,
                amount: req.amount,
                kind: LedgerKind::VendorPayment.to_string(),
                reference_note: Some(format!("vendor payment: {}", vendor.name)),
                payment_mode: req.payment_method.clone(),
                external_transaction_id: req.reference.clone(),
                status: LedgerStatus::Success.to_string(),
                actor_id: req.actor_id,
            },
        )
        .await?;
        company::mark_vendor_settled(&mut tx, vendor_id).await?;

        tx.commit().await?;
        info!(
            employer_id = %req.employer_id,
            vendor_id = %vendor_id,
            amount = %req.amount,
            "vendor paid"
        );
        Ok(DrawdownResponse {
            employer_id: req.employer_id,
            amount: req.amount,
            new_balance: updated.balance,
            ledger_entry_id: entry.id,
        })
    }

    /// Moves credit from the employer wallet into an employee sub-wallet,
    /// appending a debit entry for the payer and a credit entry for the
    /// payee.
    pub async fn assign_credit_to_employee(
        &self,
        employee_id: Uuid,
        req: &AssignCreditRequest,
    ) -> Result<DrawdownResponse, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let employee = company::lock_employee(&mut tx, employee_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("employee {} not found", employee_id))
            })?;
        if employee.employer_id != req.employer_id {
            return Err(ServiceError::NotFound(format!(
                "employee {} does not belong to employer {}",
                employee_id, req.employer_id
            )));
        }

        let current = wallet::lock_or_create(&mut tx, req.employer_id).await?;
        if current.balance < req.amount {
            return Err(ServiceError::InsufficientFunds(format!(
                "wallet balance {} is below requested credit {}",
                current.balance, req.amount
            )));
        }

        let updated = wallet::debit(&mut tx, req.employer_id, req.amount).await?;
        let entry = ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: req.employer_id,
                employee_id: Some(employee_id),
                amount: req.amount,
                kind: LedgerKind::Debit.to_string(),
                reference_note: req.reason.clone(),
                payment_mode: None,
                external_transaction_id: None,
                status: LedgerStatus::Success.to_string(),
                actor_id: req.actor_id,
            },
        )
        .await?;

        company::credit_employee(&mut tx, employee_id, req.amount).await?;
        ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: req.employer_id,
                employee_id: Some(employee_id),
                amount: req.amount,
                kind: LedgerKind::Credit.to_string(),
                reference_note: req.reason.clone(),
                payment_mode: None,
                external_transaction_id: None,
                status: LedgerStatus::Success.to_string(),
                actor_id: req.actor_id,
            },
        )
        .await?;

        tx.commit().await?;
        info!(
            employer_id = %req.employer_id,
            employee_id = %employee_id,
            amount = %req.amount,
            "credit assigned to employee"
        );
        Ok(DrawdownResponse {
            employer_id: req.employer_id,
            amount: req.amount,
            new_balance: updated.balance,
            ledger_entry_id: entry.id,
        })
    }

    /// Pays a bill out of the employee's own sub-wallet.
    pub async fn pay_bill(
        &self,
        employee_id: Uuid,
        req: &PayBillRequest,
    ) -> Result<DrawdownResponse, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let bill = company::find_bill(&mut tx, req.bill_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("bill {} not found", req.bill_id)))?;
        if bill.employee_id != employee_id {
            return Err(ServiceError::NotFound(format!(
                "bill {} does not belong to employee {}",
                req.bill_id, employee_id
            )));
        }
        if bill.status == "paid" {
            return Err(ServiceError::State(format!(
                "bill {} is already paid",
                req.bill_id
            )));
        }

        let employee = company::lock_employee(&mut tx, employee_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("employee {} not found", employee_id))
            })?;
        if employee.credit_balance < bill.amount {
            return Err(ServiceError::InsufficientFunds(format!(
                "sub-wallet balance {} is below bill amount {}",
                employee.credit_balance, bill.amount
            )));
        }

        let updated = company::debit_employee(&mut tx, employee_id, bill.amount).await?;
        company::mark_bill_paid(&mut tx, req.bill_id).await?;
        let entry = ledger::append(
            &mut tx,
            &NewLedgerEntry {
                employer_id: employee.employer_id,
                employee_id: Some(employee_id),
                amount: bill.amount,
                kind: LedgerKind::BillPayment.to_string(),
                reference_note: bill.description.clone(),
                payment_mode: None,
                external_transaction_id: None,
                status: LedgerStatus::Success.to_string(),
                actor_id: req.actor_id,
            },
        )
        .await?;

        tx.commit().await?;
        info!(
            employee_id = %employee_id,
            bill_id = %req.bill_id,
            amount = %bill.amount,
            "bill paid"
        );
        Ok(DrawdownResponse {
            employer_id: employee.employer_id,
            amount: bill.amount,
            new_balance: updated.credit_balance,
            ledger_entry_id: entry.id,
        })
    }
}
