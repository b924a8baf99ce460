use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{LoanError, Result};
use crate::types::MinimumFeeDuration;

/// days a full annual minimum fee is measured over
const DAYS_PER_CONTRACT_YEAR: i64 = 365;

/// share of a minimum fee owed for the period containing a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProratedFeeInfo {
    pub numerator: i64,
    pub denominator: i64,
    pub fraction: Decimal,
    pub day_to_pay: NaiveDate,
}

impl ProratedFeeInfo {
    fn new(numerator: i64, denominator: i64, day_to_pay: NaiveDate) -> Self {
        Self {
            numerator,
            denominator,
            fraction: Decimal::from(numerator) / Decimal::from(denominator),
            day_to_pay,
        }
    }
}

/// calendar quarter containing a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuarterHelper {
    pub year: i32,
    pub quarter: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl QuarterHelper {
    pub fn new(today: NaiveDate) -> Result<Self> {
        let quarter = (today.month() - 1) / 3 + 1;
        let first_month = (quarter - 1) * 3 + 1;
        let start_date = ymd(today.year(), first_month, 1)?;
        let end_date = last_day_of_month(today.year(), first_month + 2)?;

        Ok(Self {
            year: today.year(),
            quarter,
            start_date,
            end_date,
        })
    }

    pub fn num_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// days from `date` through quarter end, inclusive
    pub fn days_remaining_from(&self, date: NaiveDate) -> i64 {
        (self.end_date - date).num_days() + 1
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| LoanError::InvalidDate {
        message: format!("{}-{}-{} is not a calendar date", year, month, day),
    })
}

pub(crate) fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let first_of_next = if month == 12 {
        ymd(year + 1, 1, 1)?
    } else {
        ymd(year, month + 1, 1)?
    };
    first_of_next.pred_opt().ok_or_else(|| LoanError::InvalidDate {
        message: format!("no last day for {}-{}", year, month),
    })
}

/// share of the minimum fee owed for the period containing `today`,
/// reduced when the contract started partway through that period
pub fn prorated_fee_info(
    duration: MinimumFeeDuration,
    contract_start_date: NaiveDate,
    today: NaiveDate,
) -> Result<ProratedFeeInfo> {
    match duration {
        MinimumFeeDuration::Monthly => {
            let day_to_pay = last_day_of_month(today.year(), today.month())?;
            let num_days_in_month = day_to_pay.day() as i64;
            let started_this_month = contract_start_date.year() == today.year()
                && contract_start_date.month() == today.month();
            let numerator = if started_this_month {
                num_days_in_month - contract_start_date.day().max(1) as i64 + 1
            } else {
                num_days_in_month
            };
            Ok(ProratedFeeInfo::new(numerator, num_days_in_month, day_to_pay))
        }
        MinimumFeeDuration::Quarterly => {
            let quarter = QuarterHelper::new(today)?;
            let numerator = if quarter.contains(contract_start_date) {
                quarter.days_remaining_from(contract_start_date)
            } else {
                quarter.num_days()
            };
            Ok(ProratedFeeInfo::new(numerator, quarter.num_days(), quarter.end_date))
        }
        MinimumFeeDuration::Annually => {
            let day_to_pay = contract_start_date
                .checked_add_months(Months::new(12))
                .ok_or_else(|| LoanError::InvalidDate {
                    message: format!(
                        "no anniversary for contract starting {}",
                        contract_start_date
                    ),
                })?;
            Ok(ProratedFeeInfo::new(DAYS_PER_CONTRACT_YEAR, DAYS_PER_CONTRACT_YEAR, day_to_pay))
        }
    }
}

/// as [`prorated_fee_info`], taking the duration as configured text
pub fn get_prorated_fee_info(
    duration: &str,
    contract_start_date: NaiveDate,
    today: NaiveDate,
) -> Result<ProratedFeeInfo> {
    prorated_fee_info(duration.parse()?, contract_start_date, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_partial_first_month() {
        let info = get_prorated_fee_info("monthly", date(2021, 1, 15), date(2021, 1, 31)).unwrap();

        assert_eq!(info.numerator, 17);
        assert_eq!(info.denominator, 31);
        assert_eq!(info.fraction, Decimal::from(17) / Decimal::from(31));
        assert_eq!(info.day_to_pay, date(2021, 1, 31));
    }

    #[test]
    fn test_monthly_full_month() {
        let info = get_prorated_fee_info("monthly", date(2021, 1, 15), date(2021, 2, 10)).unwrap();

        assert_eq!(info.numerator, 28);
        assert_eq!(info.denominator, 28);
        assert_eq!(info.fraction, Decimal::ONE);
        assert_eq!(info.day_to_pay, date(2021, 2, 28));

        // same month number, different year
        let info = get_prorated_fee_info("monthly", date(2020, 2, 15), date(2021, 2, 10)).unwrap();
        assert_eq!(info.numerator, 28);
    }

    #[test]
    fn test_monthly_leap_february() {
        let info = get_prorated_fee_info("monthly", date(2024, 2, 1), date(2024, 2, 29)).unwrap();
        assert_eq!(info.numerator, 29);
        assert_eq!(info.denominator, 29);
    }

    #[test]
    fn test_quarter_helper() {
        let q = QuarterHelper::new(date(2021, 5, 17)).unwrap();
        assert_eq!(q.quarter, 2);
        assert_eq!(q.start_date, date(2021, 4, 1));
        assert_eq!(q.end_date, date(2021, 6, 30));
        assert_eq!(q.num_days(), 91);

        let q = QuarterHelper::new(date(2021, 12, 31)).unwrap();
        assert_eq!(q.quarter, 4);
        assert_eq!(q.end_date, date(2021, 12, 31));
        assert_eq!(q.num_days(), 92);

        let q = QuarterHelper::new(date(2024, 1, 1)).unwrap();
        assert_eq!(q.num_days(), 91); // leap year q1
    }

    #[test]
    fn test_quarterly_partial_first_quarter() {
        let info = get_prorated_fee_info("quarterly", date(2021, 2, 1), date(2021, 3, 15)).unwrap();

        // feb 1 through mar 31
        assert_eq!(info.numerator, 59);
        assert_eq!(info.denominator, 90);
        assert_eq!(info.day_to_pay, date(2021, 3, 31));
    }

    #[test]
    fn test_quarterly_full_quarter() {
        let info = get_prorated_fee_info("quarterly", date(2021, 2, 1), date(2021, 8, 15)).unwrap();

        assert_eq!(info.numerator, 92);
        assert_eq!(info.denominator, 92);
        assert_eq!(info.fraction, Decimal::ONE);
        assert_eq!(info.day_to_pay, date(2021, 9, 30));
    }

    #[test]
    fn test_annual_never_prorated() {
        let info = get_prorated_fee_info("annually", date(2021, 3, 10), date(2021, 3, 11)).unwrap();

        assert_eq!(info.numerator, 365);
        assert_eq!(info.denominator, 365);
        assert_eq!(info.fraction, dec!(1));
        assert_eq!(info.day_to_pay, date(2022, 3, 10));

        let info =
            prorated_fee_info(MinimumFeeDuration::Annually, date(2020, 2, 29), date(2020, 6, 1))
                .unwrap();
        assert_eq!(info.day_to_pay, date(2021, 2, 28));
    }

    #[test]
    fn test_unknown_duration() {
        let result = get_prorated_fee_info("biweekly", date(2021, 1, 1), date(2021, 1, 2));
        assert!(matches!(result, Err(LoanError::InvalidDuration { .. })));
    }
}
