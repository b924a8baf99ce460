use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use log::{debug, trace, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::ContractTerms;
use crate::contract::{Contract, ContractHelper};
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::fees::{AccrualSink, DailyAccrual};
use crate::interest::ranges::{BalanceRange, BalanceRangeTracker};
use crate::types::{AugmentedTransaction, Loan, LoanUpdate, ThresholdInfo};

/// contract inputs resolved for one simulated day
#[derive(Debug, Clone, Copy)]
struct DayTerms {
    contract_start_date: NaiveDate,
    contract_end_date: NaiveDate,
    interest_rate: Rate,
    fee_multiplier: Decimal,
    /// set once the factoring fee threshold was met on an earlier day
    discounted_rate: Option<Rate>,
}

/// principal charged at the standard rate and at the discounted rate
#[derive(Debug, Clone, Copy)]
struct PrincipalSplit {
    below_threshold: Money,
    above_threshold: Money,
}

impl PrincipalSplit {
    fn new(principal_for_interest: Money, discounted: bool) -> Self {
        if discounted {
            Self {
                below_threshold: Money::ZERO,
                above_threshold: principal_for_interest,
            }
        } else {
            Self {
                below_threshold: principal_for_interest,
                above_threshold: Money::ZERO,
            }
        }
    }

    fn interest(&self, terms: &DayTerms) -> Money {
        let discounted_rate = terms.discounted_rate.unwrap_or(Rate::ZERO);
        self.below_threshold * terms.interest_rate + self.above_threshold * discounted_rate
    }
}

/// running balances of the simulation
#[derive(Debug, Clone, Copy, Default)]
struct Balances {
    outstanding_principal: Money,
    outstanding_principal_for_interest: Money,
    outstanding_interest: Money,
    outstanding_fees: Money,
}

/// replays a loan's transactions day by day into its outstanding balances
pub struct LoanCalculator<'a, C: Contract = ContractTerms> {
    contract_helper: &'a ContractHelper<C>,
    ranges: BalanceRangeTracker,
}

impl<'a, C: Contract> LoanCalculator<'a, C> {
    pub fn new(contract_helper: &'a ContractHelper<C>) -> Self {
        Self {
            contract_helper,
            ranges: BalanceRangeTracker::default(),
        }
    }

    /// balances of `loan` at the start of `today`
    ///
    /// Advances post on their settlement date. Repayments reduce the
    /// customer-visible principal, interest and fees on their deposit date,
    /// and the interest-bearing principal on their settlement date, so
    /// interest keeps accruing while a payment clears.
    ///
    /// Every simulated day from origination is recorded into `accumulator`,
    /// so each report date needs a fresh one. Loans of one company may
    /// share an accumulator for the same report date.
    ///
    /// Contract errors for a day skip that day's accrual and are collected;
    /// if any occurred the whole calculation fails with all of them.
    pub fn calculate_loan_balance<A: AccrualSink>(
        &mut self,
        threshold_info: &ThresholdInfo,
        loan: &Loan,
        augmented_transactions: &[AugmentedTransaction],
        today: NaiveDate,
        accumulator: &mut A,
    ) -> Result<LoanUpdate> {
        let origination_date = loan
            .origination_date
            .ok_or(LoanError::LoanNotFunded { loan_id: loan.id })?;

        let days_out = (today - origination_date).num_days().max(0) as usize;

        let mut by_settlement: HashMap<NaiveDate, Vec<&AugmentedTransaction>> = HashMap::new();
        let mut by_deposit: HashMap<NaiveDate, Vec<&AugmentedTransaction>> = HashMap::new();
        for tx in augmented_transactions {
            by_settlement.entry(tx.settlement_date()).or_default().push(tx);
            by_deposit.entry(tx.deposit_date()).or_default().push(tx);
        }

        self.ranges = BalanceRangeTracker::default();
        let mut balances = Balances::default();
        let mut errors = Vec::new();
        let mut last_date = None;

        for cur_date in origination_date.iter_days().take(days_out) {
            let settling = by_settlement.get(&cur_date).map(Vec::as_slice).unwrap_or(&[]);

            for aug in settling {
                let tx = &aug.transaction;
                if tx.is_advance() || tx.is_adjustment() {
                    balances.outstanding_principal += tx.to_principal;
                    balances.outstanding_principal_for_interest += tx.to_principal;
                    balances.outstanding_interest += tx.to_interest;
                    balances.outstanding_fees += tx.to_fees;
                }
            }

            match self.day_terms(cur_date, loan.adjusted_maturity_date, threshold_info) {
                Ok(terms) => {
                    self.accrue_day(loan, cur_date, &terms, &mut balances, accumulator)
                }
                Err(err) => {
                    debug!("loan {}: skipping accrual on {}: {}", loan.id, cur_date, err);
                    errors.push(err);
                }
            }

            if let Some(depositing) = by_deposit.get(&cur_date) {
                for aug in depositing {
                    let tx = &aug.transaction;
                    if tx.is_repayment() {
                        balances.outstanding_principal -= tx.to_principal;
                        balances.outstanding_interest -= tx.to_interest;
                        balances.outstanding_fees -= tx.to_fees;
                    }
                }
            }

            for aug in settling {
                let tx = &aug.transaction;
                if tx.is_repayment() {
                    balances.outstanding_principal_for_interest -= tx.to_principal;
                }
            }

            last_date = Some(cur_date);
        }

        if let Some(last_date) = last_date {
            self.ranges.close(last_date);
        }

        if !errors.is_empty() {
            return Err(LoanError::BalanceCalculation {
                loan_id: loan.id,
                errors,
            });
        }

        debug!(
            "loan {} as of {}: principal {}, principal for interest {}, interest {}, fees {}",
            loan.id,
            today,
            balances.outstanding_principal,
            balances.outstanding_principal_for_interest,
            balances.outstanding_interest,
            balances.outstanding_fees
        );

        Ok(LoanUpdate {
            loan_id: loan.id,
            adjusted_maturity_date: loan.adjusted_maturity_date,
            outstanding_principal: balances.outstanding_principal.round_currency(),
            outstanding_principal_for_interest: balances
                .outstanding_principal_for_interest
                .round_currency(),
            outstanding_interest: balances.outstanding_interest.round_currency(),
            outstanding_fees: balances.outstanding_fees.round_currency(),
        })
    }

    /// as [`Self::calculate_loan_balance`], taking today from a time provider
    pub fn calculate_loan_balance_at<A: AccrualSink>(
        &mut self,
        threshold_info: &ThresholdInfo,
        loan: &Loan,
        augmented_transactions: &[AugmentedTransaction],
        time_provider: &SafeTimeProvider,
        accumulator: &mut A,
    ) -> Result<LoanUpdate> {
        let today = time_provider.now().date_naive();
        self.calculate_loan_balance(
            threshold_info,
            loan,
            augmented_transactions,
            today,
            accumulator,
        )
    }

    /// principal history of the last calculation
    pub fn balance_ranges(&self) -> &[BalanceRange] {
        self.ranges.ranges()
    }

    pub fn summary(&self) -> String {
        self.ranges.summary()
    }

    fn day_terms(
        &self,
        cur_date: NaiveDate,
        adjusted_maturity_date: NaiveDate,
        threshold_info: &ThresholdInfo,
    ) -> Result<DayTerms> {
        let contract = self.contract_helper.get_contract(cur_date)?;
        let interest_rate = contract.get_interest_rate(cur_date)?;

        // the maturity date itself is not late
        let fee_multiplier = if cur_date > adjusted_maturity_date {
            contract.get_fee_multiplier((cur_date - adjusted_maturity_date).num_days())?
        } else {
            Decimal::ZERO
        };

        let discounted_rate = match (
            contract.get_factoring_fee_threshold()?,
            threshold_info.day_threshold_met,
        ) {
            (Some(_), Some(day_met)) if cur_date > day_met => {
                Some(contract.get_discounted_interest_rate_due_to_factoring_fee()?)
            }
            _ => None,
        };

        Ok(DayTerms {
            contract_start_date: contract.start_date(),
            contract_end_date: contract.end_date(),
            interest_rate,
            fee_multiplier,
            discounted_rate,
        })
    }

    fn accrue_day<A: AccrualSink>(
        &mut self,
        loan: &Loan,
        cur_date: NaiveDate,
        terms: &DayTerms,
        balances: &mut Balances,
        accumulator: &mut A,
    ) {
        let principal_for_interest = balances.outstanding_principal_for_interest;

        let interest_due_for_day = if principal_for_interest.is_positive() {
            PrincipalSplit::new(principal_for_interest, terms.discounted_rate.is_some())
                .interest(terms)
        } else {
            if principal_for_interest.is_negative() {
                warn!(
                    "loan {}: principal for interest is negative ({}) on {}, accruing no interest",
                    loan.id, principal_for_interest, cur_date
                );
            } else {
                trace!("loan {}: no principal for interest on {}", loan.id, cur_date);
            }
            Money::ZERO
        };

        let fee_due_for_day = interest_due_for_day * terms.fee_multiplier;

        balances.outstanding_interest += interest_due_for_day;
        balances.outstanding_fees += fee_due_for_day;

        accumulator.record(&DailyAccrual {
            date: cur_date,
            contract_start_date: terms.contract_start_date,
            contract_end_date: terms.contract_end_date,
            interest: interest_due_for_day,
            fees: fee_due_for_day,
        });

        self.ranges.note_today(
            cur_date,
            balances.outstanding_principal,
            terms.interest_rate,
            terms.fee_multiplier,
        );

        trace!(
            "loan {} {}: principal {}, interest {} at {}, fee multiplier {}",
            loan.id,
            cur_date,
            balances.outstanding_principal,
            interest_due_for_day,
            terms.interest_rate,
            terms.fee_multiplier
        );
    }
}
