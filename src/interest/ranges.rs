use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

use crate::decimal::{Money, Rate};

/// contiguous days over which outstanding principal did not change
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRange {
    pub start_date: NaiveDate,
    /// set once principal changes or the simulation ends
    pub end_date: Option<NaiveDate>,
    pub outstanding_principal: Money,
    pub interest_rates: Vec<Rate>,
    pub fee_multipliers: Vec<Decimal>,
}

impl BalanceRange {
    fn open(start_date: NaiveDate, outstanding_principal: Money) -> Self {
        Self {
            start_date,
            end_date: None,
            outstanding_principal,
            interest_rates: Vec::new(),
            fee_multipliers: Vec::new(),
        }
    }

    pub fn num_days(&self) -> usize {
        self.interest_rates.len()
    }
}

fn distinct<T: PartialEq + Copy>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for v in values {
        if out.last() != Some(v) {
            out.push(*v);
        }
    }
    out
}

impl fmt::Display for BalanceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self
            .end_date
            .map_or_else(|| "open".to_string(), |d| d.to_string());
        let rates = distinct(&self.interest_rates)
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        let multipliers = distinct(&self.fee_multipliers)
            .iter()
            .map(|m| m.normalize().to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        write!(
            f,
            "{} to {} ({} days): principal {:.2}, interest rate {}, fee multiplier {}",
            self.start_date,
            end,
            self.num_days(),
            self.outstanding_principal.as_decimal(),
            rates,
            multipliers
        )
    }
}

/// builds the balance range history one simulated day at a time
#[derive(Debug, Clone, Default)]
pub(crate) struct BalanceRangeTracker {
    ranges: Vec<BalanceRange>,
}

impl BalanceRangeTracker {
    pub fn note_today(
        &mut self,
        cur_date: NaiveDate,
        outstanding_principal: Money,
        interest_rate: Rate,
        fee_multiplier: Decimal,
    ) {
        let principal_changed = self
            .ranges
            .last()
            .map_or(true, |r| r.outstanding_principal != outstanding_principal);

        if principal_changed {
            self.close(cur_date.pred_opt().unwrap_or(cur_date));
            self.ranges.push(BalanceRange::open(cur_date, outstanding_principal));
        }

        if let Some(range) = self.ranges.last_mut() {
            range.interest_rates.push(interest_rate);
            range.fee_multipliers.push(fee_multiplier);
        }
    }

    /// close the open range, if any
    pub fn close(&mut self, end_date: NaiveDate) {
        if let Some(range) = self.ranges.last_mut() {
            if range.end_date.is_none() {
                range.end_date = Some(end_date);
            }
        }
    }

    pub fn ranges(&self) -> &[BalanceRange] {
        &self.ranges
    }

    pub fn summary(&self) -> String {
        self.ranges
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
