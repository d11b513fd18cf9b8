//! Defines the signed session token and how to encode/decode one.

// Code in this module is adapted from https://github.com/ezesundayeze/axum--auth
// and https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserId};

/// The duration for which session tokens are valid.
pub const SESSION_DURATION: Duration = Duration::days(7);

/// The contents of a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token authenticates.
    pub sub: i64,
    /// The time the token was issued as a unix timestamp.
    pub iat: i64,
    /// The expiry time of the token as a unix timestamp.
    pub exp: i64,
}

/// Create a signed session token for `user_id` that expires after
/// [SESSION_DURATION].
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(user_id: UserId, encoding_key: &EncodingKey) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        iat: now.unix_timestamp(),
        exp: (now + SESSION_DURATION).unix_timestamp(),
    };

    encode(&Header::default(), &claims, encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Recover the user ID from a session token.
///
/// # Errors
///
/// Returns [Error::InvalidToken] if the token is malformed, has an invalid
/// signature, or has expired.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<UserId, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| UserId::new(token_data.claims.sub))
        .map_err(|_| Error::InvalidToken)
}

#[cfg(test)]
mod token_tests {
    use jsonwebtoken::{DecodingKey, EncodingKey, Header, encode};
    use time::OffsetDateTime;

    use crate::{Error, user::UserId};

    use super::{Claims, decode_token, encode_token};

    const SECRET: &str = "notaverygoodsecret";

    fn test_keys() -> (EncodingKey, DecodingKey) {
        (
            EncodingKey::from_secret(SECRET.as_ref()),
            DecodingKey::from_secret(SECRET.as_ref()),
        )
    }

    #[test]
    fn decode_recovers_user_id() {
        let (encoding_key, decoding_key) = test_keys();
        let user_id = UserId::new(42);

        let token = encode_token(user_id, &encoding_key).unwrap();

        assert_eq!(Ok(user_id), decode_token(&token, &decoding_key));
    }

    #[test]
    fn decode_rejects_expired_token() {
        let (encoding_key, decoding_key) = test_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: 42,
            iat: now - 3600,
            exp: now - 1800,
        };
        let token = encode(&Header::default(), &claims, &encoding_key).unwrap();

        assert_eq!(Err(Error::InvalidToken), decode_token(&token, &decoding_key));
    }

    #[test]
    fn decode_rejects_token_signed_with_other_key() {
        let (encoding_key, _) = test_keys();
        let other_decoding_key = DecodingKey::from_secret("adifferentsecret".as_ref());

        let token = encode_token(UserId::new(42), &encoding_key).unwrap();

        assert_eq!(
            Err(Error::InvalidToken),
            decode_token(&token, &other_decoding_key)
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        let (_, decoding_key) = test_keys();

        assert_eq!(
            Err(Error::InvalidToken),
            decode_token("not.a.token", &decoding_key)
        );
    }
}
