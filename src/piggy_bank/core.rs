use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use serde::Serialize;

use crate::{
    Error,
    database_id::DatabaseId,
    goal::{Goal, insert_placeholder_goal},
    user::UserId,
};

/// The balance record tied to a savings goal.
///
/// The balance is never negative. All mutation goes through [deposit] and
/// [withdraw], which adjust the stored balance with a single conditional
/// update so that concurrent withdrawals cannot drive it below zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PiggyBank {
    /// The id for the piggy bank.
    pub id: DatabaseId,
    /// The user who owns the piggy bank.
    pub user_id: UserId,
    /// The goal the piggy bank is saving toward.
    pub goal_id: DatabaseId,
    /// The current balance.
    #[serde(rename = "money")]
    pub balance: f64,
}

pub fn create_piggy_bank_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    // goal_id is UNIQUE: exactly one piggy bank references a given goal.
    // The CHECK is a backstop; the withdraw statement already refuses to
    // overdraw.
    connection.execute(
        "CREATE TABLE IF NOT EXISTS piggy_bank (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id),
            goal_id INTEGER NOT NULL UNIQUE REFERENCES goal(id),
            balance REAL NOT NULL CHECK (balance >= 0)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_piggy_bank(row: &Row) -> Result<PiggyBank, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let goal_id = row.get(2)?;
    let balance = row.get(3)?;

    Ok(PiggyBank {
        id,
        user_id: UserId::new(user_id),
        goal_id,
        balance,
    })
}

/// Create a piggy bank for `user_id` holding `initial_amount`, together with
/// the placeholder goal it points at.
///
/// Both rows are inserted in one transaction; a failure leaves neither a
/// goal without a piggy bank nor the reverse.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `initial_amount` is negative or not
/// finite, otherwise an [Error::SqlError] if an SQL related error occurred.
pub fn create_piggy_bank(
    connection: &Connection,
    user_id: UserId,
    initial_amount: f64,
) -> Result<PiggyBank, Error> {
    if !initial_amount.is_finite() || initial_amount < 0.0 {
        return Err(Error::InvalidAmount);
    }

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Deferred)?;

    let goal = insert_placeholder_goal(&transaction, user_id)?;

    transaction.execute(
        "INSERT INTO piggy_bank (user_id, goal_id, balance) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), goal.id, initial_amount),
    )?;
    let id = transaction.last_insert_rowid();

    transaction.commit()?;

    Ok(PiggyBank {
        id,
        user_id,
        goal_id: goal.id,
        balance: initial_amount,
    })
}

/// Get the piggy bank that has the specified `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no such piggy bank exists.
pub fn get_piggy_bank(connection: &Connection, id: DatabaseId) -> Result<PiggyBank, Error> {
    let piggy_bank = connection
        .prepare("SELECT id, user_id, goal_id, balance FROM piggy_bank WHERE id = ?1")?
        .query_row([id], map_row_to_piggy_bank)?;

    Ok(piggy_bank)
}

/// Get the most recently created piggy bank owned by `user_id` along with its
/// goal.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user has no piggy bank.
pub fn get_piggy_bank_with_goal_for_user(
    connection: &Connection,
    user_id: UserId,
) -> Result<(PiggyBank, Goal), Error> {
    let pair = connection
        .prepare(
            "SELECT p.id, p.user_id, p.goal_id, p.balance,
                    g.id, g.user_id, g.name, g.description, g.price, g.picture
             FROM piggy_bank p
             JOIN goal g ON g.id = p.goal_id
             WHERE p.user_id = ?1
             ORDER BY p.id DESC
             LIMIT 1",
        )?
        .query_row([user_id.as_i64()], |row| {
            let piggy_bank = map_row_to_piggy_bank(row)?;
            let goal = Goal {
                id: row.get(4)?,
                user_id: UserId::new(row.get(5)?),
                name: row.get(6)?,
                description: row.get(7)?,
                price: row.get(8)?,
                picture: row.get(9)?,
            };

            Ok((piggy_bank, goal))
        })?;

    Ok(pair)
}

/// Add `amount` to the balance of the piggy bank with the specified `id` and
/// return the new balance.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] if `amount` is zero, negative, or not
/// finite, or [Error::NotFound] if no such piggy bank exists.
pub fn deposit(connection: &Connection, id: DatabaseId, amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount);
    }

    let new_balance = connection
        .prepare("UPDATE piggy_bank SET balance = balance + ?1 WHERE id = ?2 RETURNING balance")?
        .query_row((amount, id), |row| row.get(0))?;

    Ok(new_balance)
}

/// Subtract `amount` from the balance of the piggy bank with the specified
/// `id` and return the new balance.
///
/// The check and the update are a single conditional statement, so two
/// concurrent withdrawals can never both pass the funds check against a stale
/// balance: whichever commits second finds the balance already reduced and
/// fails.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidAmount] if `amount` is zero, negative, or not finite.
/// - [Error::InsufficientFunds] if `amount` exceeds the current balance. The
///   balance is left unchanged.
/// - [Error::NotFound] if no such piggy bank exists.
pub fn withdraw(connection: &Connection, id: DatabaseId, amount: f64) -> Result<f64, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount);
    }

    let result = connection
        .prepare(
            "UPDATE piggy_bank SET balance = balance - ?1
             WHERE id = ?2 AND balance >= ?1
             RETURNING balance",
        )?
        .query_row((amount, id), |row| row.get(0));

    match result {
        Ok(new_balance) => Ok(new_balance),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            // No row updated: either the piggy bank is missing or the funds
            // check failed.
            let exists: bool = connection
                .prepare("SELECT EXISTS (SELECT 1 FROM piggy_bank WHERE id = ?1)")?
                .query_row([id], |row| row.get(0))?;

            if exists {
                Err(Error::InsufficientFunds)
            } else {
                Err(Error::NotFound)
            }
        }
        Err(error) => Err(error.into()),
    }
}
