use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::Money;
use crate::types::MinimumFeeDuration;

/// days after contract start that count toward the annual minimum
const CONTRACT_YEAR_DAYS: u64 = 365;

/// one simulated day's accrual, with the span of the contract in force
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAccrual {
    pub date: NaiveDate,
    pub contract_start_date: NaiveDate,
    pub contract_end_date: NaiveDate,
    pub interest: Money,
    pub fees: Money,
}

/// receives each day's accrual from the loan calculator
pub trait AccrualSink {
    fn record(&mut self, accrual: &DailyAccrual);
}

/// calendar month bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// calendar quarter bucket, quarters numbered 1 to 4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuarterKey {
    pub year: i32,
    pub quarter: u32,
}

impl QuarterKey {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / 3 + 1,
        }
    }
}

/// interest and fees accrued within one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccumulatedAmount {
    pub interest_amount: Money,
    pub fees_amount: Money,
}

impl AccumulatedAmount {
    /// new value with the day's amounts added
    pub fn plus(self, interest: Money, fees: Money) -> Self {
        Self {
            interest_amount: self.interest_amount + interest,
            fees_amount: self.fees_amount + fees,
        }
    }

    pub fn total(&self) -> Money {
        self.interest_amount + self.fees_amount
    }
}

/// interest accrued per calendar month for a single loan
#[derive(Debug, Clone, Default)]
pub struct MonthlyInterestAccumulator {
    month_to_amounts: BTreeMap<MonthKey, Money>,
}

impl MonthlyInterestAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, interest_for_day: Money, day: NaiveDate) {
        let key = MonthKey::for_date(day);
        let current = self.month_to_amounts.get(&key).copied().unwrap_or(Money::ZERO);
        self.month_to_amounts.insert(key, current + interest_for_day);
    }

    pub fn get_month_to_amounts(&self) -> &BTreeMap<MonthKey, Money> {
        &self.month_to_amounts
    }
}

impl AccrualSink for MonthlyInterestAccumulator {
    fn record(&mut self, accrual: &DailyAccrual) {
        self.accumulate(accrual.interest, accrual.date);
    }
}

/// interest and fees accrued per month, quarter and first contract year,
/// compared against contractual minimum fees
#[derive(Debug, Clone, Default)]
pub struct FeeAccumulator {
    month_to_amounts: BTreeMap<MonthKey, AccumulatedAmount>,
    quarter_to_amounts: BTreeMap<QuarterKey, AccumulatedAmount>,
    year_amount: AccumulatedAmount,
}

impl FeeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// days outside the contract's span are dropped
    pub fn accumulate(
        &mut self,
        contract_start_date: NaiveDate,
        contract_end_date: NaiveDate,
        interest_for_day: Money,
        fees_for_day: Money,
        day: NaiveDate,
    ) {
        if day < contract_start_date || day > contract_end_date {
            return;
        }

        let month = MonthKey::for_date(day);
        let updated = self
            .month_to_amounts
            .get(&month)
            .copied()
            .unwrap_or_default()
            .plus(interest_for_day, fees_for_day);
        self.month_to_amounts.insert(month, updated);

        let quarter = QuarterKey::for_date(day);
        let updated = self
            .quarter_to_amounts
            .get(&quarter)
            .copied()
            .unwrap_or_default()
            .plus(interest_for_day, fees_for_day);
        self.quarter_to_amounts.insert(quarter, updated);

        let within_first_year = contract_start_date
            .checked_add_days(Days::new(CONTRACT_YEAR_DAYS))
            .map_or(true, |year_end| day < year_end);
        if within_first_year {
            self.year_amount = self.year_amount.plus(interest_for_day, fees_for_day);
        }
    }

    pub fn month_amounts(&self, day: NaiveDate) -> AccumulatedAmount {
        self.month_to_amounts
            .get(&MonthKey::for_date(day))
            .copied()
            .unwrap_or_default()
    }

    pub fn quarter_amounts(&self, day: NaiveDate) -> AccumulatedAmount {
        self.quarter_to_amounts
            .get(&QuarterKey::for_date(day))
            .copied()
            .unwrap_or_default()
    }

    pub fn year_amounts(&self) -> AccumulatedAmount {
        self.year_amount
    }

    /// interest plus fees accrued in the bucket `duration` selects for `day`
    pub fn get_amount_accrued_by_duration(
        &self,
        duration: MinimumFeeDuration,
        day: NaiveDate,
    ) -> Money {
        match duration {
            MinimumFeeDuration::Monthly => self.month_amounts(day).total(),
            MinimumFeeDuration::Quarterly => self.quarter_amounts(day).total(),
            MinimumFeeDuration::Annually => self.year_amounts().total(),
        }
    }

    pub fn get_month_to_amounts(&self) -> &BTreeMap<MonthKey, AccumulatedAmount> {
        &self.month_to_amounts
    }

    pub fn get_quarter_to_amounts(&self) -> &BTreeMap<QuarterKey, AccumulatedAmount> {
        &self.quarter_to_amounts
    }
}

impl AccrualSink for FeeAccumulator {
    fn record(&mut self, accrual: &DailyAccrual) {
        self.accumulate(
            accrual.contract_start_date,
            accrual.contract_end_date,
            accrual.interest,
            accrual.fees,
            accrual.date,
        );
    }
}
