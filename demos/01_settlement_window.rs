/// settlement window - the customer balance drops on deposit,
/// interest keeps accruing until the payment settles
use loan_balance_rs::chrono::{Duration, NaiveDate, TimeZone, Utc};
use loan_balance_rs::{
    AugmentedTransaction, ContractHelper, ContractTerms, Loan, LoanCalculator, Money,
    MonthlyInterestAccumulator, Rate, SafeTimeProvider, ThresholdInfo, TimeSource, Uuid,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2021, 1, 1).ok_or("bad date")?;
    let end = NaiveDate::from_ymd_opt(2021, 12, 31).ok_or("bad date")?;
    let terms = ContractTerms::line_of_credit(start, end, Rate::from_bps(5));
    let helper = ContractHelper::single(terms)?;

    let loan = Loan {
        id: Uuid::new_v4(),
        company_id: Uuid::new_v4(),
        amount: Money::from_major(100),
        origination_date: Some(start),
        adjusted_maturity_date: start + Duration::days(30),
        closed_at: None,
    };
    let txs = vec![
        AugmentedTransaction::advance(loan.id, loan.amount, start),
        AugmentedTransaction::repayment(
            loan.id,
            Money::from_major(100),
            Money::ZERO,
            Money::ZERO,
            start + Duration::days(5),
            start + Duration::days(10),
        ),
    ];

    // drive the report date forward one day at a time
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
    ));
    let control = time.test_control().unwrap();

    let mut calculator = LoanCalculator::new(&helper);

    for _ in 0..12 {
        control.advance(Duration::days(1));
        // each report date replays from origination into a fresh accumulator
        let mut interest = MonthlyInterestAccumulator::new();
        let update = calculator.calculate_loan_balance_at(
            &ThresholdInfo::default(),
            &loan,
            &txs,
            &time,
            &mut interest,
        )?;
        println!(
            "{}: principal {:>6}, principal for interest {:>6}, interest {:>5}",
            time.now().date_naive(),
            update.outstanding_principal,
            update.outstanding_principal_for_interest,
            update.outstanding_interest
        );
    }

    println!("\n{}", calculator.summary());
    Ok(())
}
