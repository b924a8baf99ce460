pub mod calculator;
pub mod ranges;
pub mod threshold;

pub use calculator::LoanCalculator;
pub use ranges::BalanceRange;
pub use threshold::ThresholdAccumulator;
