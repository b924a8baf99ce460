use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::MinimumFeeDuration;

/// contract configuration for one contiguous span of a company's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    pub start_date: NaiveDate,
    /// adjusted end date, inclusive
    pub end_date: NaiveDate,
    /// flat daily interest rate
    pub interest_rate: Option<Rate>,
    /// dated daily rates; when set they replace the flat rate and every
    /// accrual day must fall inside a period
    pub dynamic_interest_rate: Option<DynamicInterestRate>,
    pub late_fee_structure: Option<LateFeeStructure>,
    /// cumulative repayments after which the discounted rate applies
    pub factoring_fee_threshold: Option<Money>,
    /// discounted daily rate once the threshold is met
    pub adjusted_factoring_fee_percentage: Option<Rate>,
    pub minimum_monthly_fee: Option<Money>,
    pub minimum_quarterly_fee: Option<Money>,
    pub minimum_annual_fee: Option<Money>,
}

/// one dated interest rate period, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rate: Rate,
}

/// variable rate schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DynamicInterestRate(Vec<RatePeriod>);

impl DynamicInterestRate {
    pub fn new(mut periods: Vec<RatePeriod>) -> Result<Self> {
        periods.sort_by_key(|p| p.start_date);
        for period in &periods {
            if period.end_date < period.start_date {
                return Err(LoanError::InvalidConfiguration {
                    message: format!(
                        "interest rate period ends {} before it starts {}",
                        period.end_date, period.start_date
                    ),
                });
            }
        }
        for pair in periods.windows(2) {
            if pair[1].start_date <= pair[0].end_date {
                return Err(LoanError::InvalidConfiguration {
                    message: format!(
                        "interest rate periods starting {} and {} overlap",
                        pair[0].start_date, pair[1].start_date
                    ),
                });
            }
        }
        Ok(Self(periods))
    }

    pub fn rate_on(&self, date: NaiveDate) -> Option<Rate> {
        self.0
            .iter()
            .find(|p| p.start_date <= date && date <= p.end_date)
            .map(|p| p.rate)
    }

    pub fn periods(&self) -> &[RatePeriod] {
        &self.0
    }
}

/// late fee multiplier for a band of days past due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateFeeTier {
    pub start_day: i64,
    /// `None` for the open-ended last tier
    pub end_day: Option<i64>,
    pub multiplier: Decimal,
}

impl LateFeeTier {
    fn covers(&self, days_past_due: i64) -> bool {
        days_past_due >= self.start_day && self.end_day.map_or(true, |end| days_past_due <= end)
    }

    fn parse_key(key: &str) -> Result<(i64, Option<i64>)> {
        let invalid = || LoanError::InvalidConfiguration {
            message: format!("invalid late fee range '{}'", key),
        };
        let key = key.trim();
        if let Some(start) = key.strip_suffix('+') {
            let start = start.trim().parse::<i64>().map_err(|_| invalid())?;
            return Ok((start, None));
        }
        let (start, end) = key.split_once('-').ok_or_else(invalid)?;
        let start = start.trim().parse::<i64>().map_err(|_| invalid())?;
        let end = end.trim().parse::<i64>().map_err(|_| invalid())?;
        if end < start {
            return Err(invalid());
        }
        Ok((start, Some(end)))
    }

    fn key(&self) -> String {
        match self.end_day {
            Some(end) => format!("{}-{}", self.start_day, end),
            None => format!("{}+", self.start_day),
        }
    }
}

/// days-past-due bands mapped to fee multipliers, e.g. `{"1-14": "0.25", "30+": "1.0"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Decimal>", into = "BTreeMap<String, Decimal>")]
pub struct LateFeeStructure {
    tiers: Vec<LateFeeTier>,
}

impl LateFeeStructure {
    pub fn new(mut tiers: Vec<LateFeeTier>) -> Result<Self> {
        tiers.sort_by_key(|t| t.start_day);
        if let Some(first) = tiers.first() {
            if first.start_day < 1 {
                return Err(LoanError::InvalidConfiguration {
                    message: "late fee tiers start at 1 day past due".to_string(),
                });
            }
        }
        for pair in tiers.windows(2) {
            match pair[0].end_day {
                Some(end) if end < pair[1].start_day => {}
                _ => {
                    return Err(LoanError::InvalidConfiguration {
                        message: format!(
                            "late fee ranges '{}' and '{}' overlap",
                            pair[0].key(),
                            pair[1].key()
                        ),
                    });
                }
            }
        }
        Ok(Self { tiers })
    }

    /// multiplier applied to a day's interest when the loan is `days_past_due` late
    pub fn multiplier(&self, days_past_due: i64) -> Result<Decimal> {
        if days_past_due <= 0 {
            return Ok(Decimal::ZERO);
        }
        self.tiers
            .iter()
            .find(|t| t.covers(days_past_due))
            .map(|t| t.multiplier)
            .ok_or(LoanError::NoLateFeeTier { days_past_due })
    }

    pub fn tiers(&self) -> &[LateFeeTier] {
        &self.tiers
    }

    /// 25% for the first two weeks, 50% to day 29, 100% after
    pub fn standard() -> Self {
        Self {
            tiers: vec![
                LateFeeTier { start_day: 1, end_day: Some(14), multiplier: dec!(0.25) },
                LateFeeTier { start_day: 15, end_day: Some(29), multiplier: dec!(0.5) },
                LateFeeTier { start_day: 30, end_day: None, multiplier: dec!(1.0) },
            ],
        }
    }
}

impl TryFrom<BTreeMap<String, Decimal>> for LateFeeStructure {
    type Error = LoanError;

    fn try_from(map: BTreeMap<String, Decimal>) -> Result<Self> {
        let tiers = map
            .into_iter()
            .map(|(key, multiplier)| {
                let (start_day, end_day) = LateFeeTier::parse_key(&key)?;
                Ok(LateFeeTier { start_day, end_day, multiplier })
            })
            .collect::<Result<Vec<_>>>()?;
        LateFeeStructure::new(tiers)
    }
}

impl From<LateFeeStructure> for BTreeMap<String, Decimal> {
    fn from(structure: LateFeeStructure) -> Self {
        structure
            .tiers
            .iter()
            .map(|t| (t.key(), t.multiplier))
            .collect()
    }
}

/// minimum fee clause of a contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimumAmountOwed {
    pub duration: MinimumFeeDuration,
    pub amount: Money,
}

impl ContractTerms {
    /// parse and validate contract terms from json
    pub fn from_json(json: &str) -> Result<Self> {
        let terms: ContractTerms = serde_json::from_str(json)?;
        terms.validate()?;
        Ok(terms)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn builder() -> ContractTermsBuilder {
        ContractTermsBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(LoanError::InvalidConfiguration {
                message: format!(
                    "contract ends {} before it starts {}",
                    self.end_date, self.start_date
                ),
            });
        }
        if self.interest_rate.is_none() && self.dynamic_interest_rate.is_none() {
            return Err(LoanError::MissingContractField {
                field: "interest_rate".to_string(),
            });
        }
        if let Some(rate) = self.interest_rate {
            if rate.as_decimal() < Decimal::ZERO {
                return Err(LoanError::InvalidConfiguration {
                    message: format!("negative interest rate {}", rate),
                });
            }
        }
        if let Some(dynamic) = &self.dynamic_interest_rate {
            DynamicInterestRate::new(dynamic.periods().to_vec())?;
        }
        self.minimum_amount_owed()?;
        Ok(())
    }

    /// the configured minimum fee, if any; more than one is a misconfiguration
    pub fn minimum_amount_owed(&self) -> Result<Option<MinimumAmountOwed>> {
        let configured: Vec<MinimumAmountOwed> = [
            (MinimumFeeDuration::Monthly, self.minimum_monthly_fee),
            (MinimumFeeDuration::Quarterly, self.minimum_quarterly_fee),
            (MinimumFeeDuration::Annually, self.minimum_annual_fee),
        ]
        .into_iter()
        .filter_map(|(duration, amount)| {
            amount.map(|amount| MinimumAmountOwed { duration, amount })
        })
        .collect();

        match configured.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            _ => Err(LoanError::InvalidConfiguration {
                message: "only one of minimum monthly, quarterly or annual fee may be set"
                    .to_string(),
            }),
        }
    }

    /// revolving line of credit with the standard late fee schedule
    pub fn line_of_credit(start_date: NaiveDate, end_date: NaiveDate, interest_rate: Rate) -> Self {
        Self {
            start_date,
            end_date,
            interest_rate: Some(interest_rate),
            dynamic_interest_rate: None,
            late_fee_structure: Some(LateFeeStructure::standard()),
            factoring_fee_threshold: None,
            adjusted_factoring_fee_percentage: None,
            minimum_monthly_fee: None,
            minimum_quarterly_fee: None,
            minimum_annual_fee: None,
        }
    }

    /// inventory financing with a monthly minimum fee
    pub fn inventory_financing(
        start_date: NaiveDate,
        end_date: NaiveDate,
        interest_rate: Rate,
        minimum_monthly_fee: Money,
    ) -> Self {
        Self {
            minimum_monthly_fee: Some(minimum_monthly_fee),
            ..Self::line_of_credit(start_date, end_date, interest_rate)
        }
    }
}

/// builder for contract terms
#[derive(Debug, Default)]
pub struct ContractTermsBuilder {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    interest_rate: Option<Rate>,
    rate_periods: Vec<RatePeriod>,
    late_fee_structure: Option<LateFeeStructure>,
    factoring_fee_threshold: Option<Money>,
    discounted_rate: Option<Rate>,
    minimum_fee: Option<MinimumAmountOwed>,
}

impl ContractTermsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn end_date(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn interest_rate(mut self, rate: Rate) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    pub fn rate_period(mut self, start_date: NaiveDate, end_date: NaiveDate, rate: Rate) -> Self {
        self.rate_periods.push(RatePeriod { start_date, end_date, rate });
        self
    }

    pub fn late_fee_structure(mut self, structure: LateFeeStructure) -> Self {
        self.late_fee_structure = Some(structure);
        self
    }

    pub fn factoring_fee_threshold(mut self, threshold: Money, discounted_rate: Rate) -> Self {
        self.factoring_fee_threshold = Some(threshold);
        self.discounted_rate = Some(discounted_rate);
        self
    }

    pub fn minimum_fee(mut self, duration: MinimumFeeDuration, amount: Money) -> Self {
        self.minimum_fee = Some(MinimumAmountOwed { duration, amount });
        self
    }

    pub fn build(self) -> Result<ContractTerms> {
        let start_date = self.start_date.ok_or(LoanError::InvalidConfiguration {
            message: "start date required".to_string(),
        })?;

        let end_date = self.end_date.ok_or(LoanError::InvalidConfiguration {
            message: "end date required".to_string(),
        })?;

        let dynamic_interest_rate = if self.rate_periods.is_empty() {
            None
        } else {
            Some(DynamicInterestRate::new(self.rate_periods)?)
        };

        let minimum_for = |duration: MinimumFeeDuration| {
            self.minimum_fee
                .filter(|m| m.duration == duration)
                .map(|m| m.amount)
        };

        let terms = ContractTerms {
            start_date,
            end_date,
            interest_rate: self.interest_rate,
            dynamic_interest_rate,
            late_fee_structure: self.late_fee_structure,
            factoring_fee_threshold: self.factoring_fee_threshold,
            adjusted_factoring_fee_percentage: self.discounted_rate,
            minimum_monthly_fee: minimum_for(MinimumFeeDuration::Monthly),
            minimum_quarterly_fee: minimum_for(MinimumFeeDuration::Quarterly),
            minimum_annual_fee: minimum_for(MinimumFeeDuration::Annually),
        };
        terms.validate()?;
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_late_fee_tiers() {
        let structure = LateFeeStructure::standard();

        assert_eq!(structure.multiplier(-3).unwrap(), Decimal::ZERO);
        assert_eq!(structure.multiplier(0).unwrap(), Decimal::ZERO);
        assert_eq!(structure.multiplier(1).unwrap(), dec!(0.25));
        assert_eq!(structure.multiplier(14).unwrap(), dec!(0.25));
        assert_eq!(structure.multiplier(15).unwrap(), dec!(0.5));
        assert_eq!(structure.multiplier(30).unwrap(), dec!(1.0));
        assert_eq!(structure.multiplier(400).unwrap(), dec!(1.0));
    }

    #[test]
    fn test_late_fee_gap_is_an_error() {
        let structure = LateFeeStructure::new(vec![LateFeeTier {
            start_day: 1,
            end_day: Some(10),
            multiplier: dec!(0.1),
        }])
        .unwrap();

        assert!(matches!(
            structure.multiplier(11),
            Err(LoanError::NoLateFeeTier { days_past_due: 11 })
        ));
    }

    #[test]
    fn test_overlapping_late_fee_ranges_rejected() {
        let json = r#"{"1-14": "0.25", "10+": "1.0"}"#;
        let result: std::result::Result<LateFeeStructure, _> = serde_json::from_str(json);
        assert!(result.is_err());

        let json = r#"{"fourteen": "0.25"}"#;
        let result: std::result::Result<LateFeeStructure, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_contract_from_json() {
        let json = r#"{
            "start_date": "2021-01-01",
            "end_date": "2021-12-31",
            "interest_rate": "0.0005",
            "dynamic_interest_rate": [
                {"start_date": "2021-06-01", "end_date": "2021-12-31", "rate": "0.0004"}
            ],
            "late_fee_structure": {"1-14": "0.25", "15-29": "0.5", "30+": "1.0"},
            "factoring_fee_threshold": "100000",
            "adjusted_factoring_fee_percentage": "0.0002",
            "minimum_quarterly_fee": "2500"
        }"#;

        let terms = ContractTerms::from_json(json).unwrap();

        assert_eq!(terms.interest_rate, Some(Rate::from_bps(5)));
        assert_eq!(terms.late_fee_structure, Some(LateFeeStructure::standard()));
        assert_eq!(terms.factoring_fee_threshold, Some(Money::from_major(100_000)));
        assert_eq!(
            terms.minimum_amount_owed().unwrap(),
            Some(MinimumAmountOwed {
                duration: MinimumFeeDuration::Quarterly,
                amount: Money::from_major(2_500),
            })
        );

        let dynamic = terms.dynamic_interest_rate.as_ref().unwrap();
        assert_eq!(dynamic.rate_on(date(2021, 7, 4)), Some(Rate::from_bps(4)));
        assert_eq!(dynamic.rate_on(date(2021, 3, 1)), None);
    }

    #[test]
    fn test_contract_json_round_trip() {
        let terms = ContractTerms::inventory_financing(
            date(2021, 1, 1),
            date(2021, 12, 31),
            Rate::from_bps(5),
            Money::from_major(1_000),
        );

        let json = terms.to_json().unwrap();
        assert_eq!(ContractTerms::from_json(&json).unwrap(), terms);
    }

    #[test]
    fn test_contract_without_rate_rejected() {
        let json = r#"{"start_date": "2021-01-01", "end_date": "2021-12-31"}"#;
        assert!(matches!(
            ContractTerms::from_json(json),
            Err(LoanError::MissingContractField { .. })
        ));
    }

    #[test]
    fn test_multiple_minimum_fees_rejected() {
        let mut terms =
            ContractTerms::line_of_credit(date(2021, 1, 1), date(2021, 12, 31), Rate::from_bps(5));
        terms.minimum_monthly_fee = Some(Money::from_major(100));
        terms.minimum_annual_fee = Some(Money::from_major(1_000));

        assert!(terms.minimum_amount_owed().is_err());
        assert!(terms.validate().is_err());
    }

    #[test]
    fn test_builder() {
        let terms = ContractTerms::builder()
            .start_date(date(2021, 1, 1))
            .end_date(date(2021, 12, 31))
            .interest_rate(Rate::from_bps(5))
            .rate_period(date(2021, 7, 1), date(2021, 12, 31), Rate::from_bps(4))
            .factoring_fee_threshold(Money::from_major(50_000), Rate::from_bps(3))
            .minimum_fee(MinimumFeeDuration::Annually, Money::from_major(12_000))
            .build()
            .unwrap();

        assert_eq!(terms.minimum_annual_fee, Some(Money::from_major(12_000)));
        assert_eq!(terms.minimum_monthly_fee, None);
        assert_eq!(terms.adjusted_factoring_fee_percentage, Some(Rate::from_bps(3)));
        assert!(terms.dynamic_interest_rate.is_some());
    }

    #[test]
    fn test_builder_rejects_bad_dates() {
        let result = ContractTerms::builder()
            .start_date(date(2021, 6, 1))
            .end_date(date(2021, 1, 1))
            .interest_rate(Rate::from_bps(5))
            .build();
        assert!(result.is_err());

        let result = ContractTerms::builder()
            .start_date(date(2021, 1, 1))
            .interest_rate(Rate::from_bps(5))
            .build();
        assert!(result.is_err());
    }
}
