pub mod config;
pub mod contract;
pub mod decimal;
pub mod errors;
pub mod fees;
pub mod interest;
pub mod types;

// re-export key types
pub use config::{ContractTerms, ContractTermsBuilder, LateFeeStructure, MinimumAmountOwed};
pub use contract::{Contract, ContractHelper};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use fees::{
    get_cur_minimum_fees, get_prorated_fee_info, AccrualSink, FeeAccumulator, MinimumFeeInfo,
    MonthlyInterestAccumulator, ProratedFeeInfo, QuarterHelper,
};
pub use interest::{BalanceRange, LoanCalculator, ThresholdAccumulator};
pub use types::{
    AugmentedTransaction, CompanyId, Loan, LoanId, LoanUpdate, MinimumFeeDuration, Payment,
    ThresholdInfo, Transaction, TransactionType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
