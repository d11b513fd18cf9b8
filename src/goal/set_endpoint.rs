//! Defines the endpoint for filling in the details of a savings goal.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    database_id::DatabaseId,
    goal::update_goal,
    image_store::ImageStore,
    piggy_bank::get_piggy_bank,
    user::UserId,
};

/// The state needed to set a goal's details.
#[derive(Clone)]
pub struct SetGoalState {
    /// The database connection for managing goals.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The store that turns uploaded goal images into public URLs.
    pub image_store: Arc<dyn ImageStore + Send + Sync>,
}

impl FromRef<AppState> for SetGoalState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            image_store: state.image_store.clone(),
        }
    }
}

/// The fields of the multipart goal form after parsing.
#[derive(Debug, Default)]
struct GoalForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    piggy_bank_id: Option<DatabaseId>,
    image: Option<Vec<u8>>,
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn parse_goal_form(mut multipart: Multipart) -> Result<GoalForm, Response> {
    let mut form = GoalForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| bad_request("Could not parse multipart form"))?
    {
        match field.name() {
            Some("name") => {
                form.name = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| bad_request("Could not parse multipart form"))?,
                );
            }
            Some("description") => {
                form.description = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| bad_request("Could not parse multipart form"))?,
                );
            }
            Some("price") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Could not parse multipart form"))?;
                form.price = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| bad_request("Price must be greater than zero"))?,
                );
            }
            Some("piggyBankId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| bad_request("Could not parse multipart form"))?;
                form.piggy_bank_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| bad_request("Invalid piggy bank ID"))?,
                );
            }
            Some("image") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| bad_request("Could not parse multipart form"))?;
                if !bytes.is_empty() {
                    form.image = Some(bytes.to_vec());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// A route handler for setting the name, description, price, and picture of
/// the goal attached to a piggy bank.
///
/// An uploaded image is stored through the image store and its URL recorded
/// on the goal. A failed upload is logged and the goal saved without a
/// picture; losing the image is preferable to losing the goal.
pub async fn set_goal_endpoint(
    State(state): State<SetGoalState>,
    Extension(user_id): Extension<UserId>,
    multipart: Multipart,
) -> Response {
    let form = match parse_goal_form(multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };

    let name = match form.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_owned(),
        _ => return bad_request("Goal name is required"),
    };

    let price = match form.price {
        Some(price) if price.is_finite() && price > 0.0 => price,
        _ => return bad_request("Price must be greater than zero"),
    };

    let piggy_bank_id = match form.piggy_bank_id {
        Some(piggy_bank_id) => piggy_bank_id,
        None => return bad_request("Invalid piggy bank ID"),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLock.into_response();
        }
    };

    let piggy_bank = match get_piggy_bank(&connection, piggy_bank_id) {
        Ok(piggy_bank) if piggy_bank.user_id == user_id => piggy_bank,
        Ok(_) | Err(Error::NotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Piggy bank not found" })),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    };

    // The upload happens only after the ownership check, so a rejected
    // request leaves no file behind. The file name is prefixed with the goal
    // id: two users saving for a "Laptop" must not share a picture.
    let picture = form.image.and_then(|bytes| {
        let file_name = format!("{}-{name}", piggy_bank.goal_id);
        match state.image_store.store(&file_name, &bytes) {
            Ok(url) => Some(url),
            Err(error) => {
                // The picture is decoration; the goal still gets saved.
                tracing::warn!("Could not store goal image: {error}");
                None
            }
        }
    });

    let description = form.description.as_deref().filter(|text| !text.is_empty());

    match update_goal(
        &connection,
        piggy_bank.goal_id,
        &name,
        description,
        price,
        picture.as_deref(),
    ) {
        Ok(goal) => Json(goal).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod set_goal_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        body::{Body, to_bytes},
        extract::{FromRequest, Multipart, State},
        http::{Request, StatusCode},
        response::Response,
    };
    use rusqlite::Connection;
    use serde_json::Value;

    use crate::{
        Error,
        db::initialize,
        endpoints,
        goal::get_goal,
        image_store::{ImageStore, LocalImageStore},
        piggy_bank::{PiggyBank, create_piggy_bank},
        user::UserId,
    };

    use super::{SetGoalState, set_goal_endpoint};

    /// An image store that always fails, for exercising the degrade-gracefully
    /// path.
    struct BrokenImageStore;

    impl ImageStore for BrokenImageStore {
        fn store(&self, _file_name: &str, _bytes: &[u8]) -> Result<String, Error> {
            Err(Error::ImageUpload("store is offline".to_owned()))
        }
    }

    fn get_test_state(image_store: Arc<dyn ImageStore + Send + Sync>) -> SetGoalState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO user (username, email, password) VALUES ('alice', 'alice@example.com', 'hash')",
                (),
            )
            .unwrap();

        SetGoalState {
            db_connection: Arc::new(Mutex::new(connection)),
            image_store,
        }
    }

    fn get_local_store_state(test_name: &str) -> SetGoalState {
        let media_dir = std::env::temp_dir().join(format!(
            "piggybank_set_goal_{test_name}_{}",
            std::process::id()
        ));

        get_test_state(Arc::new(LocalImageStore::new(media_dir)))
    }

    fn create_test_piggy_bank(state: &SetGoalState) -> PiggyBank {
        let connection = state.db_connection.lock().unwrap();

        create_piggy_bank(&connection, UserId::new(1), 100.0).unwrap()
    }

    async fn must_make_multipart(fields: &[(&str, &str)], image: Option<&str>) -> Multipart {
        let boundary = "MY_BOUNDARY123456789";

        let mut lines: Vec<String> = Vec::new();

        for (name, value) in fields {
            lines.push(format!("--{boundary}"));
            lines.push(format!("Content-Disposition: form-data; name=\"{name}\""));
            lines.push(String::new());
            lines.push((*value).to_owned());
        }

        if let Some(image) = image {
            lines.push(format!("--{boundary}"));
            lines.push(
                "Content-Disposition: form-data; name=\"image\"; filename=\"goal.png\"".to_owned(),
            );
            lines.push("Content-Type: image/png".to_owned());
            lines.push(String::new());
            lines.push(image.to_owned());
        }

        lines.push(format!("--{boundary}--"));

        let data = lines.join("\r\n").into_bytes();

        let request = Request::builder()
            .method("POST")
            .uri(endpoints::GOAL)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(data))
            .unwrap();

        Multipart::from_request(request, &{}).await.unwrap()
    }

    fn goal_fields<'a>(name: &'a str, price: &'a str, piggy_bank_id: &'a str) -> Vec<(&'a str, &'a str)> {
        vec![
            ("name", name),
            ("description", "A new laptop"),
            ("price", price),
            ("piggyBankId", piggy_bank_id),
        ]
    }

    async fn response_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).expect("Response body should be JSON");

        (status, json)
    }

    #[tokio::test]
    async fn set_goal_fills_in_placeholder_goal() {
        let state = get_local_store_state("fills_in");
        let piggy_bank = create_test_piggy_bank(&state);
        let piggy_bank_id = piggy_bank.id.to_string();

        let multipart = must_make_multipart(&goal_fields("Laptop", "1200", &piggy_bank_id), None).await;
        let response =
            set_goal_endpoint(State(state.clone()), Extension(UserId::new(1)), multipart).await;

        let (status, goal) = response_json(response).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Laptop", goal["name"]);
        assert_eq!(1200.0, goal["price"]);

        let connection = state.db_connection.lock().unwrap();
        let stored = get_goal(&connection, piggy_bank.goal_id).unwrap();
        assert_eq!("Laptop", stored.name);
        assert_eq!(1200.0, stored.price);
    }

    #[tokio::test]
    async fn set_goal_stores_uploaded_image() {
        let state = get_local_store_state("stores_image");
        let piggy_bank = create_test_piggy_bank(&state);
        let piggy_bank_id = piggy_bank.id.to_string();

        let multipart = must_make_multipart(
            &goal_fields("Laptop", "1200", &piggy_bank_id),
            Some("FAKEPNGDATA"),
        )
        .await;
        let response =
            set_goal_endpoint(State(state.clone()), Extension(UserId::new(1)), multipart).await;

        let (status, goal) = response_json(response).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("/media/goal-images/1-Laptop.png", goal["picture"]);
    }

    #[tokio::test]
    async fn same_goal_name_for_two_users_gets_distinct_images() {
        let state = get_local_store_state("distinct_images");
        {
            let connection = state.db_connection.lock().unwrap();
            connection
                .execute(
                    "INSERT INTO user (username, email, password) VALUES ('bob', 'bob@example.com', 'hash')",
                    (),
                )
                .unwrap();
        }
        let alices_bank = create_test_piggy_bank(&state);
        let bobs_bank = {
            let connection = state.db_connection.lock().unwrap();
            create_piggy_bank(&connection, UserId::new(2), 100.0).unwrap()
        };

        let multipart = must_make_multipart(
            &goal_fields("Laptop", "1200", &alices_bank.id.to_string()),
            Some("ALICESPNG"),
        )
        .await;
        let response =
            set_goal_endpoint(State(state.clone()), Extension(UserId::new(1)), multipart).await;
        let (_, alices_goal) = response_json(response).await;

        let multipart = must_make_multipart(
            &goal_fields("Laptop", "1200", &bobs_bank.id.to_string()),
            Some("BOBSPNG"),
        )
        .await;
        let response =
            set_goal_endpoint(State(state.clone()), Extension(UserId::new(2)), multipart).await;
        let (_, bobs_goal) = response_json(response).await;

        assert_ne!(alices_goal["picture"], bobs_goal["picture"]);
    }

    #[tokio::test]
    async fn rejected_request_stores_no_image() {
        let media_dir = std::env::temp_dir().join(format!(
            "piggybank_set_goal_no_orphan_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&media_dir);
        let state = get_test_state(Arc::new(LocalImageStore::new(media_dir.clone())));

        let multipart =
            must_make_multipart(&goal_fields("Laptop", "1200", "999"), Some("FAKEPNGDATA")).await;
        let response = set_goal_endpoint(State(state), Extension(UserId::new(1)), multipart).await;

        let (status, _) = response_json(response).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert!(!media_dir.join("goal-images").exists());
    }

    #[tokio::test]
    async fn failed_image_upload_still_saves_goal() {
        let state = get_test_state(Arc::new(BrokenImageStore));
        let piggy_bank = create_test_piggy_bank(&state);
        let piggy_bank_id = piggy_bank.id.to_string();

        let multipart = must_make_multipart(
            &goal_fields("Laptop", "1200", &piggy_bank_id),
            Some("FAKEPNGDATA"),
        )
        .await;
        let response =
            set_goal_endpoint(State(state.clone()), Extension(UserId::new(1)), multipart).await;

        let (status, goal) = response_json(response).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("Laptop", goal["name"]);
        assert!(goal["picture"].is_null());
    }

    #[tokio::test]
    async fn empty_goal_name_is_rejected() {
        let state = get_local_store_state("empty_name");
        let piggy_bank = create_test_piggy_bank(&state);
        let piggy_bank_id = piggy_bank.id.to_string();

        let multipart = must_make_multipart(&goal_fields("   ", "1200", &piggy_bank_id), None).await;
        let response = set_goal_endpoint(State(state), Extension(UserId::new(1)), multipart).await;

        let (status, body) = response_json(response).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("Goal name is required", body["error"]);
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let state = get_local_store_state("bad_price");
        let piggy_bank = create_test_piggy_bank(&state);
        let piggy_bank_id = piggy_bank.id.to_string();

        for price in ["0", "-5", "not a number"] {
            let multipart =
                must_make_multipart(&goal_fields("Laptop", price, &piggy_bank_id), None).await;
            let response =
                set_goal_endpoint(State(state.clone()), Extension(UserId::new(1)), multipart).await;

            let (status, body) = response_json(response).await;
            assert_eq!(StatusCode::BAD_REQUEST, status);
            assert_eq!("Price must be greater than zero", body["error"]);
        }
    }

    #[tokio::test]
    async fn unknown_piggy_bank_is_not_found() {
        let state = get_local_store_state("unknown_bank");

        let multipart = must_make_multipart(&goal_fields("Laptop", "1200", "999"), None).await;
        let response = set_goal_endpoint(State(state), Extension(UserId::new(1)), multipart).await;

        let (status, body) = response_json(response).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("Piggy bank not found", body["error"]);
    }

    #[tokio::test]
    async fn another_users_piggy_bank_is_not_found() {
        let state = get_local_store_state("wrong_owner");
        let piggy_bank = create_test_piggy_bank(&state);
        let piggy_bank_id = piggy_bank.id.to_string();

        let multipart = must_make_multipart(&goal_fields("Laptop", "1200", &piggy_bank_id), None).await;
        let response = set_goal_endpoint(State(state), Extension(UserId::new(2)), multipart).await;

        let (status, body) = response_json(response).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("Piggy bank not found", body["error"]);
    }
}
