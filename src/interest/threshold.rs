use log::debug;

use crate::config::ContractTerms;
use crate::contract::{Contract, ContractHelper};
use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{ThresholdInfo, Transaction};

/// finds the first settlement date on which cumulative principal repaid
/// reaches the factoring fee threshold of the contract then in force
pub struct ThresholdAccumulator<'a, C: Contract = ContractTerms> {
    contract_helper: &'a ContractHelper<C>,
    transactions: Vec<Transaction>,
}

impl<'a, C: Contract> ThresholdAccumulator<'a, C> {
    pub fn new(contract_helper: &'a ContractHelper<C>) -> Self {
        Self {
            contract_helper,
            transactions: Vec::new(),
        }
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn add_transactions<I: IntoIterator<Item = Transaction>>(&mut self, txs: I) {
        self.transactions.extend(txs);
    }

    /// the crossing is sticky: later repayments are never examined
    pub fn compute_threshold_info(&self) -> Result<ThresholdInfo> {
        let mut repayments: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|tx| tx.is_repayment())
            .collect();
        repayments.sort_by_key(|tx| tx.effective_date);

        let mut repaid = Money::ZERO;
        for tx in repayments {
            let contract = self.contract_helper.get_contract(tx.effective_date)?;
            let threshold = contract.get_factoring_fee_threshold()?;

            repaid += tx.to_principal;

            if let Some(threshold) = threshold {
                if repaid >= threshold {
                    debug!(
                        "factoring fee threshold {} met on {} with {} repaid",
                        threshold, tx.effective_date, repaid
                    );
                    return Ok(ThresholdInfo {
                        day_threshold_met: Some(tx.effective_date),
                    });
                }
            }
        }

        Ok(ThresholdInfo::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::errors::LoanError;
    use crate::types::TransactionType;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repayment(principal: i64, on: NaiveDate) -> Transaction {
        Transaction::new(
            Uuid::nil(),
            TransactionType::Repayment,
            Money::from_major(principal),
            Money::from_major(1),
            Money::ZERO,
            on,
        )
    }

    fn threshold_helper(threshold: i64) -> ContractHelper {
        let terms = ContractTerms::builder()
            .start_date(date(2021, 1, 1))
            .end_date(date(2021, 12, 31))
            .interest_rate(Rate::from_bps(5))
            .factoring_fee_threshold(Money::from_major(threshold), Rate::from_bps(3))
            .build()
            .unwrap();
        ContractHelper::single(terms).unwrap()
    }

    #[test]
    fn test_first_crossing_date() {
        let helper = threshold_helper(1_000);
        let mut acc = ThresholdAccumulator::new(&helper);

        acc.add_transaction(repayment(400, date(2021, 3, 1)));
        acc.add_transaction(repayment(600, date(2021, 4, 1)));
        acc.add_transaction(repayment(5_000, date(2021, 5, 1)));

        let info = acc.compute_threshold_info().unwrap();
        assert_eq!(info.day_threshold_met, Some(date(2021, 4, 1)));
    }

    #[test]
    fn test_order_independent() {
        let helper = threshold_helper(1_000);
        let txs = vec![
            repayment(600, date(2021, 4, 1)),
            repayment(5_000, date(2021, 5, 1)),
            repayment(400, date(2021, 3, 1)),
        ];

        let mut forward = ThresholdAccumulator::new(&helper);
        forward.add_transactions(txs.clone());

        let mut reversed = ThresholdAccumulator::new(&helper);
        reversed.add_transactions(txs.into_iter().rev());

        let first = forward.compute_threshold_info().unwrap();
        assert_eq!(first, reversed.compute_threshold_info().unwrap());
        assert_eq!(first, forward.compute_threshold_info().unwrap());
        assert_eq!(first.day_threshold_met, Some(date(2021, 4, 1)));
    }

    #[test]
    fn test_only_repayment_principal_counts() {
        let helper = threshold_helper(1_000);
        let mut acc = ThresholdAccumulator::new(&helper);

        acc.add_transaction(Transaction::new(
            Uuid::nil(),
            TransactionType::Advance,
            Money::from_major(5_000),
            Money::ZERO,
            Money::ZERO,
            date(2021, 2, 1),
        ));
        // interest and fee portions never count
        acc.add_transaction(Transaction::new(
            Uuid::nil(),
            TransactionType::Repayment,
            Money::from_major(999),
            Money::from_major(500),
            Money::from_major(500),
            date(2021, 3, 1),
        ));

        assert_eq!(acc.compute_threshold_info().unwrap().day_threshold_met, None);
    }

    #[test]
    fn test_no_threshold_configured() {
        let helper = ContractHelper::single(ContractTerms::line_of_credit(
            date(2021, 1, 1),
            date(2021, 12, 31),
            Rate::from_bps(5),
        ))
        .unwrap();
        let mut acc = ThresholdAccumulator::new(&helper);
        acc.add_transaction(repayment(1_000_000, date(2021, 3, 1)));

        assert_eq!(acc.compute_threshold_info().unwrap(), ThresholdInfo::default());
    }

    #[test]
    fn test_repayments_under_unthresholded_contract_still_count() {
        let first =
            ContractTerms::line_of_credit(date(2021, 1, 1), date(2021, 6, 30), Rate::from_bps(5));
        let second = ContractTerms::builder()
            .start_date(date(2021, 7, 1))
            .end_date(date(2021, 12, 31))
            .interest_rate(Rate::from_bps(5))
            .factoring_fee_threshold(Money::from_major(1_000), Rate::from_bps(3))
            .build()
            .unwrap();
        let helper = ContractHelper::build(vec![first, second]).unwrap();

        let mut acc = ThresholdAccumulator::new(&helper);
        acc.add_transaction(repayment(900, date(2021, 2, 1)));
        acc.add_transaction(repayment(100, date(2021, 7, 15)));

        assert_eq!(
            acc.compute_threshold_info().unwrap().day_threshold_met,
            Some(date(2021, 7, 15))
        );
    }

    #[test]
    fn test_missing_contract_propagates() {
        let helper = threshold_helper(1_000);
        let mut acc = ThresholdAccumulator::new(&helper);
        acc.add_transaction(repayment(10, date(2022, 1, 5)));

        assert!(matches!(
            acc.compute_threshold_info(),
            Err(LoanError::NoContractForDate { .. })
        ));
    }
}
