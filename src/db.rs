//! Database initialization for the application's domain models.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, goal::create_goal_table, piggy_bank::create_piggy_bank_table, user::create_user_table,
};

/// Create the tables for all domain models.
///
/// The tables are created in one exclusive transaction so that a failure
/// part-way through leaves no partial schema behind.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_piggy_bank_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
