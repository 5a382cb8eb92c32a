use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use chrono::{Duration, Utc};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,     // subject (email)
    pub exp: usize,      // expiration time
    pub iat: usize,      // issued at
    pub user_id: String,
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "iat", "sub", "user_id"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|err| {
            log::debug!("Rejected bearer token: {:?}", err);
            ApiError::Unauthorized("Invalid token".to_string())
        })
}

/// Signs a token for `user_id`; identity is issued by an external provider in production.
pub fn encode_token(
    user_id: &str,
    email: &str,
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
        user_id: user_id.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validates bearer tokens and stores their [`Claims`] in request extensions.
///
/// In `required` mode a request without a token is rejected; in `optional`
/// mode it passes through so guests can use the same route. A token that is
/// present but invalid is always rejected. Rejections are answered here with
/// the usual JSON error body instead of surfacing as a service error.
#[derive(Clone)]
pub struct AuthMiddleware {
    secret: Rc<String>,
    required: bool,
}

impl AuthMiddleware {
    pub fn required(secret: impl Into<String>) -> Self {
        Self {
            secret: Rc::new(secret.into()),
            required: true,
        }
    }

    pub fn optional(secret: impl Into<String>) -> Self {
        Self {
            secret: Rc::new(secret.into()),
            required: false,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            secret: self.secret.clone(),
            required: self.required,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    secret: Rc<String>,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match bearer_token(&req) {
            Some(token) => match decode_token(token, &self.secret) {
                Ok(claims) => Some(claims),
                Err(err) => return reject(req, err),
            },
            None if self.required => {
                return reject(req, ApiError::Unauthorized("No authorization header".to_string()));
            }
            None => None,
        };

        if let Some(claims) = claims {
            req.extensions_mut().insert(claims);
        }
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

fn reject<B: 'static>(
    req: ServiceRequest,
    err: ApiError,
) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>> {
    let response = req.error_response(err).map_into_right_body();
    Box::pin(ready(Ok(response)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    async fn whoami(req: actix_web::HttpRequest) -> HttpResponse {
        let user = req.extensions().get::<Claims>().map(|c| c.user_id.clone());
        HttpResponse::Ok().body(user.unwrap_or_else(|| "guest".to_string()))
    }

    #[actix_rt::test]
    async fn test_required_mode_answers_with_json_unauthorized() {
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(AuthMiddleware::required("secret"))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[actix_rt::test]
    async fn test_optional_mode_passes_guests_and_rejects_bad_tokens() {
        let app = test::init_service(
            App::new().service(
                web::resource("/me")
                    .wrap(AuthMiddleware::optional("secret"))
                    .route(web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "guest");

        let token = encode_token("user_1", "a@b.test", "secret", Duration::hours(1)).unwrap();
        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "user_1");

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[::core::prelude::v1::test]
    fn test_token_round_trip() {
        let token = encode_token("user_1", "a@b.test", "secret", Duration::hours(1)).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, "user_1");
        assert_eq!(claims.sub, "a@b.test");
    }

    #[::core::prelude::v1::test]
    fn test_wrong_secret_is_unauthorized() {
        let token = encode_token("user_1", "a@b.test", "secret", Duration::hours(1)).unwrap();
        assert!(matches!(decode_token(&token, "other"), Err(ApiError::Unauthorized(_))));
    }

    #[::core::prelude::v1::test]
    fn test_expired_token_is_unauthorized() {
        let token = encode_token("user_1", "a@b.test", "secret", Duration::hours(-2)).unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }
}
