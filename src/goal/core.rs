use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, database_id::DatabaseId, user::UserId};

/// The name given to a goal before the user fills in its details.
pub const PLACEHOLDER_GOAL_NAME: &str = "New Goal";

/// The target item or amount a user is saving toward.
///
/// A goal starts as a placeholder (name [PLACEHOLDER_GOAL_NAME], price 0)
/// when its piggy bank is created, and is filled in by [update_goal]. Once
/// finalized its price is greater than zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// The id for the goal.
    pub id: DatabaseId,
    /// The user who owns the goal.
    pub user_id: UserId,
    /// What the user is saving for.
    pub name: String,
    /// Free-form description of the goal.
    pub description: Option<String>,
    /// The target price. Zero only while the goal is a placeholder.
    pub price: f64,
    /// URL of an image of the goal, if one was uploaded.
    pub picture: Option<String>,
}

pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS goal (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id),
            name TEXT NOT NULL,
            description TEXT,
            price REAL NOT NULL,
            picture TEXT
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_goal(row: &Row) -> Result<Goal, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let name = row.get(2)?;
    let description = row.get(3)?;
    let price = row.get(4)?;
    let picture = row.get(5)?;

    Ok(Goal {
        id,
        user_id: UserId::new(user_id),
        name,
        description,
        price,
        picture,
    })
}

/// Insert the placeholder goal that a new piggy bank points at.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn insert_placeholder_goal(connection: &Connection, user_id: UserId) -> Result<Goal, Error> {
    connection.execute(
        "INSERT INTO goal (user_id, name, price) VALUES (?1, ?2, 0)",
        (user_id.as_i64(), PLACEHOLDER_GOAL_NAME),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Goal {
        id,
        user_id,
        name: PLACEHOLDER_GOAL_NAME.to_owned(),
        description: None,
        price: 0.0,
        picture: None,
    })
}

/// Get the goal that has the specified `id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if no such goal exists.
pub fn get_goal(connection: &Connection, id: DatabaseId) -> Result<Goal, Error> {
    let goal = connection
        .prepare("SELECT id, user_id, name, description, price, picture FROM goal WHERE id = ?1")?
        .query_row([id], map_row_to_goal)?;

    Ok(goal)
}

/// Fill in the details of the goal with the specified `id` and return the
/// updated goal.
///
/// The caller is responsible for validating `name` and `price`; this function
/// writes whatever it is given.
///
/// # Errors
///
/// Returns [Error::NotFound] if no such goal exists.
pub fn update_goal(
    connection: &Connection,
    id: DatabaseId,
    name: &str,
    description: Option<&str>,
    price: f64,
    picture: Option<&str>,
) -> Result<Goal, Error> {
    let rows_changed = connection.execute(
        "UPDATE goal SET name = ?1, description = ?2, price = ?3, picture = ?4 WHERE id = ?5",
        (name, description, price, picture, id),
    )?;

    if rows_changed == 0 {
        return Err(Error::NotFound);
    }

    get_goal(connection, id)
}

#[cfg(test)]
mod goal_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, user::UserId};

    use super::{PLACEHOLDER_GOAL_NAME, get_goal, insert_placeholder_goal, update_goal};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO user (username, email, password) VALUES ('alice', 'alice@example.com', 'hash')",
                (),
            )
            .unwrap();

        connection
    }

    #[test]
    fn placeholder_goal_has_zero_price_and_no_picture() {
        let connection = get_test_connection();

        let goal = insert_placeholder_goal(&connection, UserId::new(1)).unwrap();

        assert_eq!(PLACEHOLDER_GOAL_NAME, goal.name);
        assert_eq!(0.0, goal.price);
        assert_eq!(None, goal.picture);
        assert_eq!(goal, get_goal(&connection, goal.id).unwrap());
    }

    #[test]
    fn update_goal_fills_in_details() {
        let connection = get_test_connection();
        let goal = insert_placeholder_goal(&connection, UserId::new(1)).unwrap();

        let updated = update_goal(
            &connection,
            goal.id,
            "Laptop",
            Some("A new laptop"),
            1200.0,
            Some("/media/goal-images/Laptop.png"),
        )
        .unwrap();

        assert_eq!("Laptop", updated.name);
        assert_eq!(Some("A new laptop".to_owned()), updated.description);
        assert_eq!(1200.0, updated.price);
        assert_eq!(
            Some("/media/goal-images/Laptop.png".to_owned()),
            updated.picture
        );
        assert_eq!(updated, get_goal(&connection, goal.id).unwrap());
    }

    #[test]
    fn update_missing_goal_fails() {
        let connection = get_test_connection();

        let result = update_goal(&connection, 42, "Laptop", None, 1200.0, None);

        assert_eq!(Err(Error::NotFound), result);
    }
}
