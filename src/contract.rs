use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{ContractTerms, MinimumAmountOwed};
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};

/// the contract terms in force for a span of dates
pub trait Contract {
    fn start_date(&self) -> NaiveDate;

    /// inclusive
    fn end_date(&self) -> NaiveDate;

    /// daily interest rate on `date`
    fn get_interest_rate(&self, date: NaiveDate) -> Result<Rate>;

    /// late fee multiplier applied on top of interest
    fn get_fee_multiplier(&self, days_past_due: i64) -> Result<Decimal>;

    fn get_factoring_fee_threshold(&self) -> Result<Option<Money>>;

    fn get_discounted_interest_rate_due_to_factoring_fee(&self) -> Result<Rate>;

    fn get_minimum_amount_owed_per_duration(&self) -> Result<Option<MinimumAmountOwed>>;

    fn covers(&self, date: NaiveDate) -> bool {
        self.start_date() <= date && date <= self.end_date()
    }
}

impl Contract for ContractTerms {
    fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    fn get_interest_rate(&self, date: NaiveDate) -> Result<Rate> {
        // configured periods replace the flat rate entirely
        match (&self.dynamic_interest_rate, self.interest_rate) {
            (Some(dynamic), _) => dynamic
                .rate_on(date)
                .ok_or(LoanError::NoInterestRateForDate { date }),
            (None, Some(rate)) => Ok(rate),
            (None, None) => Err(LoanError::MissingContractField {
                field: "interest_rate".to_string(),
            }),
        }
    }

    fn get_fee_multiplier(&self, days_past_due: i64) -> Result<Decimal> {
        if days_past_due <= 0 {
            return Ok(Decimal::ZERO);
        }
        self.late_fee_structure
            .as_ref()
            .ok_or(LoanError::MissingContractField {
                field: "late_fee_structure".to_string(),
            })?
            .multiplier(days_past_due)
    }

    fn get_factoring_fee_threshold(&self) -> Result<Option<Money>> {
        Ok(self.factoring_fee_threshold.filter(|t| t.is_positive()))
    }

    fn get_discounted_interest_rate_due_to_factoring_fee(&self) -> Result<Rate> {
        self.adjusted_factoring_fee_percentage
            .ok_or(LoanError::MissingContractField {
                field: "adjusted_factoring_fee_percentage".to_string(),
            })
    }

    fn get_minimum_amount_owed_per_duration(&self) -> Result<Option<MinimumAmountOwed>> {
        self.minimum_amount_owed()
    }
}

/// resolves which of a company's contracts is in force on a date
#[derive(Debug, Clone)]
pub struct ContractHelper<C: Contract = ContractTerms> {
    contracts: Vec<C>,
}

impl<C: Contract> ContractHelper<C> {
    /// sort contracts by start date, rejecting inverted or overlapping spans
    pub fn build(mut contracts: Vec<C>) -> Result<Self> {
        contracts.sort_by_key(|c| c.start_date());

        for contract in &contracts {
            if contract.end_date() < contract.start_date() {
                return Err(LoanError::InvalidConfiguration {
                    message: format!(
                        "contract ends {} before it starts {}",
                        contract.end_date(),
                        contract.start_date()
                    ),
                });
            }
        }

        for pair in contracts.windows(2) {
            if pair[1].start_date() <= pair[0].end_date() {
                return Err(LoanError::InvalidConfiguration {
                    message: format!(
                        "contracts starting {} and {} overlap",
                        pair[0].start_date(),
                        pair[1].start_date()
                    ),
                });
            }
        }

        Ok(Self { contracts })
    }

    /// single contract covering all dates it spans
    pub fn single(contract: C) -> Result<Self> {
        Self::build(vec![contract])
    }

    pub fn get_contract(&self, date: NaiveDate) -> Result<&C> {
        self.contracts
            .iter()
            .find(|c| c.covers(date))
            .ok_or(LoanError::NoContractForDate { date })
    }

    pub fn contracts(&self) -> &[C] {
        &self.contracts
    }
}
