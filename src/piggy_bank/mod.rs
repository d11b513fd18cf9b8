//! The piggy bank: the running balance a user deposits into and withdraws
//! from while saving toward a goal.

mod adjust_endpoint;
mod core;
mod create_endpoint;
mod user_endpoint;

pub use adjust_endpoint::adjust_balance_endpoint;
pub use core::{
    PiggyBank, create_piggy_bank, create_piggy_bank_table, deposit, get_piggy_bank,
    get_piggy_bank_with_goal_for_user, withdraw,
};
pub use create_endpoint::create_piggy_bank_endpoint;
pub use user_endpoint::get_user_piggy_bank_endpoint;
