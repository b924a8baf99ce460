use chrono::NaiveDate;
use thiserror::Error;

use crate::types::LoanId;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("loan {loan_id} has no origination date and cannot have a balance")]
    LoanNotFunded {
        loan_id: LoanId,
    },

    #[error("no contract covers {date}")]
    NoContractForDate {
        date: NaiveDate,
    },

    #[error("contract is missing {field}")]
    MissingContractField {
        field: String,
    },

    #[error("no interest rate period covers {date}")]
    NoInterestRateForDate {
        date: NaiveDate,
    },

    #[error("no late fee tier covers {days_past_due} days past due")]
    NoLateFeeTier {
        days_past_due: i64,
    },

    #[error("invalid minimum fee duration: {duration}")]
    InvalidDuration {
        duration: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error(
        "{} error(s) computing balance for loan {loan_id}: {}",
        .errors.len(),
        join_errors(.errors)
    )]
    BalanceCalculation {
        loan_id: LoanId,
        errors: Vec<LoanError>,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn join_errors(errors: &[LoanError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, LoanError>;
