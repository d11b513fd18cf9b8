//! The savings goal a user is putting money toward.

mod core;
mod set_endpoint;

pub use core::{
    Goal, PLACEHOLDER_GOAL_NAME, create_goal_table, get_goal, insert_placeholder_goal, update_goal,
};
pub use set_endpoint::set_goal_endpoint;
