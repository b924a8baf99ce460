/// quick start - one advance, nine days of interest
use loan_balance_rs::chrono::NaiveDate;
use loan_balance_rs::{
    AugmentedTransaction, ContractHelper, ContractTerms, FeeAccumulator, Loan, LoanCalculator,
    Money, Rate, ThresholdInfo, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).ok_or("bad date")?;
    let end = NaiveDate::from_ymd_opt(2021, 12, 31).ok_or("bad date")?;
    let terms = ContractTerms::line_of_credit(start, end, Rate::from_bps(5));
    let helper = ContractHelper::single(terms)?;

    let loan = Loan {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        amount: Money::from_major(1_000),
        origination_date: Some(start),
        adjusted_maturity_date: NaiveDate::from_ymd_opt(2021, 3, 31).ok_or("bad date")?,
        closed_at: None,
    };
    let txs = vec![AugmentedTransaction::advance(loan.id, loan.amount, start)];

    let mut fees = FeeAccumulator::new();
    let mut calculator = LoanCalculator::new(&helper);
    let today = NaiveDate::from_ymd_opt(2021, 1, 10).ok_or("bad date")?;
    let update = calculator.calculate_loan_balance(
        &ThresholdInfo::default(),
        &loan,
        &txs,
        today,
        &mut fees,
    )?;

    println!("{}", serde_json::to_string_pretty(&update)?);
    println!("january: {:?}", fees.month_amounts(today));
    Ok(())
}
