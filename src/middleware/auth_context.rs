use std::future::{ready, Ready};

use actix_web::{dev::Payload, Error, FromRequest, HttpMessage, HttpRequest};

use crate::error::ApiError;
use crate::middleware::auth::Claims;

pub const GUEST_SESSION_HEADER: &str = "X-Guest-Session";
const MAX_SESSION_ID_LEN: usize = 128;

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
}

fn authenticated(req: &HttpRequest) -> Option<AuthenticatedUser> {
    req.extensions().get::<Claims>().map(|claims| AuthenticatedUser {
        user_id: claims.user_id.clone(),
        email: claims.sub.clone(),
    })
}

fn guest_session(req: &HttpRequest) -> Result<String, ApiError> {
    let session_id = req
        .headers()
        .get(GUEST_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Sign in or provide a guest session".to_string()))?;

    let well_formed = session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !well_formed {
        return Err(ApiError::validation("Malformed guest session id"));
    }
    Ok(session_id.to_string())
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            authenticated(req)
                .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()).into()),
        )
    }
}

/// The anonymous session named by the `X-Guest-Session` header.
#[derive(Clone, Debug)]
pub struct GuestSession(pub String);

impl FromRequest for GuestSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(guest_session(req).map(GuestSession).map_err(Error::from))
    }
}

/// Either a signed-in user or a guest session; a valid bearer token wins.
#[derive(Clone, Debug)]
pub enum Caller {
    User(AuthenticatedUser),
    Guest(String),
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let caller = match authenticated(req) {
            Some(user) => Ok(Caller::User(user)),
            None => guest_session(req).map(Caller::Guest).map_err(Error::from),
        };
        ready(caller)
    }
}
