/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */
use crate::model::sys::SysInfo;
use jsonwebtoken::{decode, DecodingKey, Validation};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};
use rocket::State;

/// Token contents. Tokens are issued elsewhere; this server only checks them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub(crate) struct Claims {
    /// User id
    pub(crate) sub: i32,
    /// Expiry, seconds since the epoch
    pub(crate) exp: usize,
}

impl Claims {
    pub(crate) fn interpret(key: &[u8], token: &str) -> crate::Result<Claims> {
        let validation = Validation::default();
        Ok(decode::<Claims>(token, &DecodingKey::from_secret(key), &validation)?.claims)
    }

    #[cfg(test)]
    pub(crate) fn put(&self, key: &[u8]) -> crate::Result<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        Ok(encode(&Header::default(), self, &EncodingKey::from_secret(key))?)
    }
}

/// The caller of an `/auth` route, taken from a bearer token or the private `jwt` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AuthUser {
    pub(crate) id: i32,
}

fn bearer(request: &Request<'_>) -> Option<String> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
        .or_else(|| {
            request
                .cookies()
                .get_private("jwt")
                .map(|cookie| cookie.value().to_owned())
        })
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = crate::Error;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let config = match request.guard::<&State<SysInfo>>().await {
            Outcome::Success(config) => config,
            _ => {
                return Outcome::Error((
                    Status::InternalServerError,
                    crate::Error::InternalServerError {},
                ))
            }
        };
        let Some(token) = bearer(request) else {
            return Outcome::Error((Status::Unauthorized, crate::Error::Unauthorized {}));
        };
        match Claims::interpret(config.settings.cookie_key.as_bytes(), &token) {
            Ok(claims) => Outcome::Success(AuthUser { id: claims.sub }),
            Err(e) => {
                tracing::debug!(error = %e, "rejected token");
                Outcome::Error((Status::Unauthorized, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_token_round_trip() {
        let claims = Claims {
            sub: 7,
            exp: far_future(),
        };
        let token = claims.put(b"secret").unwrap();
        assert_eq!(Claims::interpret(b"secret", &token).unwrap(), claims);
    }

    #[test]
    fn test_wrong_key_is_unauthorized() {
        let token = Claims {
            sub: 7,
            exp: far_future(),
        }
        .put(b"secret")
        .unwrap();
        let err = Claims::interpret(b"other", &token).unwrap_err();
        assert_eq!(err.status(), Status::Unauthorized);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = Claims { sub: 7, exp: 1 }.put(b"secret").unwrap();
        assert!(Claims::interpret(b"secret", &token).is_err());
    }
}
