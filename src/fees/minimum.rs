use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::contract::{Contract, ContractHelper};
use crate::decimal::Money;
use crate::errors::Result;
use crate::fees::accumulator::FeeAccumulator;
use crate::fees::proration::{prorated_fee_info, ProratedFeeInfo};
use crate::types::MinimumFeeDuration;

/// minimum fee owed for the period containing a date, against what has accrued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimumFeeInfo {
    pub minimum_amount: Money,
    pub amount_accrued: Money,
    pub amount_short: Money,
    pub duration: Option<MinimumFeeDuration>,
    pub prorated_info: Option<ProratedFeeInfo>,
}

impl MinimumFeeInfo {
    /// contract has no minimum fee clause
    pub fn none() -> Self {
        Self {
            minimum_amount: Money::ZERO,
            amount_accrued: Money::ZERO,
            amount_short: Money::ZERO,
            duration: None,
            prorated_info: None,
        }
    }

    pub fn is_short(&self) -> bool {
        self.amount_short.is_positive()
    }
}

/// compare the contract's prorated minimum fee for `today` with what the
/// accumulator has recorded for the same month, quarter or contract year
pub fn get_cur_minimum_fees<C: Contract>(
    contract_helper: &ContractHelper<C>,
    today: NaiveDate,
    fee_accumulator: &FeeAccumulator,
) -> Result<MinimumFeeInfo> {
    let contract = contract_helper.get_contract(today)?;

    let minimum = match contract.get_minimum_amount_owed_per_duration()? {
        Some(minimum) => minimum,
        None => return Ok(MinimumFeeInfo::none()),
    };

    let prorated_info = prorated_fee_info(minimum.duration, contract.start_date(), today)?;
    let minimum_amount = minimum.amount * prorated_info.fraction;
    let amount_accrued = fee_accumulator.get_amount_accrued_by_duration(minimum.duration, today);
    let amount_short = (minimum_amount - amount_accrued).max(Money::ZERO);

    debug!(
        "{} minimum fee on {}: due {}, accrued {}, short {}",
        minimum.duration, today, minimum_amount, amount_accrued, amount_short
    );

    Ok(MinimumFeeInfo {
        minimum_amount: minimum_amount.round_currency(),
        amount_accrued: amount_accrued.round_currency(),
        amount_short: amount_short.round_currency(),
        duration: Some(minimum.duration),
        prorated_info: Some(prorated_info),
    })
}

/// as [`get_cur_minimum_fees`], taking today from a time provider
pub fn get_cur_minimum_fees_at<C: Contract>(
    contract_helper: &ContractHelper<C>,
    fee_accumulator: &FeeAccumulator,
    time_provider: &SafeTimeProvider,
) -> Result<MinimumFeeInfo> {
    get_cur_minimum_fees(contract_helper, time_provider.now().date_naive(), fee_accumulator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractTerms;
    use crate::decimal::Rate;
    use crate::errors::LoanError;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_helper() -> ContractHelper {
        ContractHelper::single(ContractTerms::inventory_financing(
            date(2021, 1, 15),
            date(2021, 12, 31),
            Rate::from_bps(5),
            Money::from_major(1_000),
        ))
        .unwrap()
    }

    #[test]
    fn test_prorated_shortfall() {
        let helper = monthly_helper();
        let mut acc = FeeAccumulator::new();
        acc.accumulate(
            date(2021, 1, 15),
            date(2021, 12, 31),
            Money::from_major(100),
            Money::ZERO,
            date(2021, 1, 20),
        );

        let info = get_cur_minimum_fees(&helper, date(2021, 1, 31), &acc).unwrap();

        assert_eq!(info.duration, Some(MinimumFeeDuration::Monthly));
        assert_eq!(info.prorated_info.unwrap().numerator, 17);
        assert_eq!(info.minimum_amount, Money::from(dec!(548.39)));
        assert_eq!(info.amount_accrued, Money::from_major(100));
        assert_eq!(info.amount_short, Money::from(dec!(448.39)));
        assert!(info.is_short());
    }

    #[test]
    fn test_no_shortfall_when_accrued_exceeds_minimum() {
        let helper = monthly_helper();
        let mut acc = FeeAccumulator::new();
        acc.accumulate(
            date(2021, 1, 15),
            date(2021, 12, 31),
            Money::from_major(900),
            Money::from_major(200),
            date(2021, 2, 3),
        );

        let info = get_cur_minimum_fees(&helper, date(2021, 2, 28), &acc).unwrap();

        assert_eq!(info.minimum_amount, Money::from_major(1_000));
        assert_eq!(info.amount_accrued, Money::from_major(1_100));
        assert_eq!(info.amount_short, Money::ZERO);
        assert!(!info.is_short());
    }

    #[test]
    fn test_no_minimum_clause() {
        let helper = ContractHelper::single(ContractTerms::line_of_credit(
            date(2021, 1, 1),
            date(2021, 12, 31),
            Rate::from_bps(5),
        ))
        .unwrap();

        let info =
            get_cur_minimum_fees(&helper, date(2021, 6, 30), &FeeAccumulator::new()).unwrap();
        assert_eq!(info, MinimumFeeInfo::none());
    }

    #[test]
    fn test_no_contract_is_an_error() {
        let helper = monthly_helper();
        let result = get_cur_minimum_fees(&helper, date(2022, 1, 31), &FeeAccumulator::new());
        assert!(matches!(result, Err(LoanError::NoContractForDate { .. })));
    }

    #[test]
    fn test_annual_minimum_with_time_provider() {
        let mut terms =
            ContractTerms::line_of_credit(date(2021, 1, 1), date(2021, 12, 31), Rate::from_bps(5));
        terms.minimum_annual_fee = Some(Money::from_major(12_000));
        let helper = ContractHelper::single(terms).unwrap();

        let mut acc = FeeAccumulator::new();
        acc.accumulate(
            date(2021, 1, 1),
            date(2021, 12, 31),
            Money::from_major(5_000),
            Money::ZERO,
            date(2021, 3, 1),
        );
        acc.accumulate(
            date(2021, 1, 1),
            date(2021, 12, 31),
            Money::from_major(4_000),
            Money::ZERO,
            date(2021, 9, 1),
        );

        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2021, 10, 1, 0, 0, 0).unwrap()
        ));

        let info = get_cur_minimum_fees_at(&helper, &acc, &time).unwrap();

        assert_eq!(info.minimum_amount, Money::from_major(12_000));
        assert_eq!(info.amount_accrued, Money::from_major(9_000));
        assert_eq!(info.amount_short, Money::from_major(3_000));
        assert_eq!(info.prorated_info.unwrap().day_to_pay, date(2022, 1, 1));
    }
}
