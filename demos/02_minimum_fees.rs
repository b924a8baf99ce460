/// minimum fees - two loans of one company against a monthly minimum,
/// with a factoring fee threshold discount
use loan_balance_rs::chrono::NaiveDate;
use loan_balance_rs::{
    get_cur_minimum_fees, AugmentedTransaction, ContractHelper, ContractTerms, FeeAccumulator,
    Loan, LoanCalculator, MinimumFeeDuration, Money, Rate, ThresholdAccumulator, Uuid,
};

type DemoResult<T> = Result<T, Box<dyn std::error::Error>>;

fn date(y: i32, m: u32, d: u32) -> DemoResult<NaiveDate> {
    Ok(NaiveDate::from_ymd_opt(y, m, d).ok_or("bad date")?)
}

fn main() -> DemoResult<()> {
    let terms = ContractTerms::builder()
        .start_date(date(2021, 1, 15)?)
        .end_date(date(2021, 12, 31)?)
        .interest_rate(Rate::from_bps(5))
        .factoring_fee_threshold(Money::from_major(1_500), Rate::from_bps(3))
        .minimum_fee(MinimumFeeDuration::Monthly, Money::from_major(250))
        .build()?;
    let helper = ContractHelper::single(terms)?;

    let company_id = Uuid::new_v4();
    let loans: Vec<(Loan, Vec<AugmentedTransaction>)> = [(1_000, 15), (2_000, 20)]
        .into_iter()
        .map(|(amount, day)| -> DemoResult<(Loan, Vec<AugmentedTransaction>)> {
            let origination = date(2021, 1, day)?;
            let loan = Loan {
                id: Uuid::new_v4(),
                company_id,
                amount: Money::from_major(amount),
                origination_date: Some(origination),
                adjusted_maturity_date: date(2021, 3, 15)?,
                closed_at: None,
            };
            let txs = vec![
                AugmentedTransaction::advance(loan.id, loan.amount, origination),
                AugmentedTransaction::repayment(
                    loan.id,
                    Money::from_major(amount / 2),
                    Money::ZERO,
                    Money::ZERO,
                    date(2021, 1, 25)?,
                    date(2021, 1, 27)?,
                ),
            ];
            Ok((loan, txs))
        })
        .collect::<Result<_, _>>()?;

    let mut threshold = ThresholdAccumulator::new(&helper);
    for (_, txs) in &loans {
        threshold.add_transactions(txs.iter().map(|t| t.transaction.clone()));
    }
    let threshold_info = threshold.compute_threshold_info()?;
    println!("threshold met: {:?}", threshold_info.day_threshold_met);

    let today = date(2021, 1, 31)?;
    let mut fees = FeeAccumulator::new();
    for (loan, txs) in &loans {
        let update = LoanCalculator::new(&helper)
            .calculate_loan_balance(&threshold_info, loan, txs, today, &mut fees)?;
        println!("{}", serde_json::to_string(&update)?);
    }

    let minimum = get_cur_minimum_fees(&helper, today, &fees)?;
    println!("{}", serde_json::to_string_pretty(&minimum)?);
    Ok(())
}
