use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::LoanError;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a company (the borrower)
pub type CompanyId = Uuid;

/// transaction types recorded against a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// funds sent to the borrower
    Advance,
    /// funds received from the borrower
    Repayment,
    /// signed correction to principal, interest or fees
    Adjustment,
    /// account-level fee, not part of the loan balance
    Fee,
    /// credit returned to the borrower, not part of the loan balance
    CreditToUser,
}

/// loan record as consumed by the balance calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub company_id: CompanyId,
    pub amount: Money,
    /// unset until the loan is funded
    pub origination_date: Option<NaiveDate>,
    pub adjusted_maturity_date: NaiveDate,
    pub closed_at: Option<DateTime<Utc>>,
}

/// a single ledger entry against a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub loan_id: LoanId,
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub to_principal: Money,
    pub to_interest: Money,
    pub to_fees: Money,
    /// settlement date
    pub effective_date: NaiveDate,
}

impl Transaction {
    pub fn new(
        loan_id: LoanId,
        transaction_type: TransactionType,
        to_principal: Money,
        to_interest: Money,
        to_fees: Money,
        effective_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            transaction_type,
            amount: to_principal + to_interest + to_fees,
            to_principal,
            to_interest,
            to_fees,
            effective_date,
        }
    }

    /// amount equals the sum of its parts
    pub fn is_well_formed(&self) -> bool {
        self.amount == self.to_principal + self.to_interest + self.to_fees
    }

    pub fn is_advance(&self) -> bool {
        self.transaction_type == TransactionType::Advance
    }

    pub fn is_repayment(&self) -> bool {
        self.transaction_type == TransactionType::Repayment
    }

    pub fn is_adjustment(&self) -> bool {
        self.transaction_type == TransactionType::Adjustment
    }
}

/// parent payment of a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    /// when funds count as received for the customer-visible balance
    pub deposit_date: NaiveDate,
    /// when funds clear
    pub settlement_date: NaiveDate,
}

impl Payment {
    pub fn new(deposit_date: NaiveDate, settlement_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            deposit_date,
            settlement_date,
        }
    }
}

/// transaction paired with the payment it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedTransaction {
    pub transaction: Transaction,
    pub payment: Payment,
}

impl AugmentedTransaction {
    pub fn new(transaction: Transaction, payment: Payment) -> Self {
        Self { transaction, payment }
    }

    /// advance that settles on `date`
    pub fn advance(loan_id: LoanId, amount: Money, date: NaiveDate) -> Self {
        Self::new(
            Transaction::new(
                loan_id,
                TransactionType::Advance,
                amount,
                Money::ZERO,
                Money::ZERO,
                date,
            ),
            Payment::new(date, date),
        )
    }

    /// repayment deposited on `deposit_date` and settling on `settlement_date`
    pub fn repayment(
        loan_id: LoanId,
        to_principal: Money,
        to_interest: Money,
        to_fees: Money,
        deposit_date: NaiveDate,
        settlement_date: NaiveDate,
    ) -> Self {
        Self::new(
            Transaction::new(
                loan_id,
                TransactionType::Repayment,
                to_principal,
                to_interest,
                to_fees,
                settlement_date,
            ),
            Payment::new(deposit_date, settlement_date),
        )
    }

    pub fn settlement_date(&self) -> NaiveDate {
        self.transaction.effective_date
    }

    pub fn deposit_date(&self) -> NaiveDate {
        self.payment.deposit_date
    }
}

/// balances produced for a loan, rounded to cents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanUpdate {
    pub loan_id: LoanId,
    pub adjusted_maturity_date: NaiveDate,
    pub outstanding_principal: Money,
    pub outstanding_principal_for_interest: Money,
    pub outstanding_interest: Money,
    pub outstanding_fees: Money,
}

impl LoanUpdate {
    pub fn total_outstanding(&self) -> Money {
        self.outstanding_principal + self.outstanding_interest + self.outstanding_fees
    }
}

/// first day cumulative repayments reached the factoring fee threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThresholdInfo {
    pub day_threshold_met: Option<NaiveDate>,
}

/// period a contractual minimum fee is measured over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimumFeeDuration {
    Monthly,
    Quarterly,
    Annually,
}

impl MinimumFeeDuration {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinimumFeeDuration::Monthly => "monthly",
            MinimumFeeDuration::Quarterly => "quarterly",
            MinimumFeeDuration::Annually => "annually",
        }
    }
}

impl fmt::Display for MinimumFeeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinimumFeeDuration {
    type Err = LoanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(MinimumFeeDuration::Monthly),
            "quarterly" => Ok(MinimumFeeDuration::Quarterly),
            "annually" => Ok(MinimumFeeDuration::Annually),
            _ => Err(LoanError::InvalidDuration {
                duration: s.to_string(),
            }),
        }
    }
}
