pub mod accumulator;
pub mod minimum;
pub mod proration;

pub use accumulator::{
    AccrualSink, AccumulatedAmount, DailyAccrual, FeeAccumulator, MonthKey,
    MonthlyInterestAccumulator, QuarterKey,
};
pub use minimum::{get_cur_minimum_fees, get_cur_minimum_fees_at, MinimumFeeInfo};
pub use proration::{get_prorated_fee_info, prorated_fee_info, ProratedFeeInfo, QuarterHelper};
