/// HTTP middleware for forum-service
///
/// `JwtAuthMiddleware` validates an optional Bearer token and stores the
/// caller's `UserId` in the request extensions. Anonymous requests pass
/// through; handlers that need a user take `UserId` (401 when absent) and
/// handlers that merely personalise take `Option<UserId>`.
pub mod jwt;

pub use jwt::{Claims, JwtKeys};

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;

/// Authenticated caller, inserted by [`JwtAuthMiddleware`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

pub struct JwtAuthMiddleware {
    keys: Arc<JwtKeys>,
}

impl JwtAuthMiddleware {
    pub fn new(keys: Arc<JwtKeys>) -> Self {
        Self { keys }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    keys: Arc<JwtKeys>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let keys = self.keys.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .map(|h| h.to_str().unwrap_or_default().to_string());

            if let Some(header) = auth_header {
                let token = header.strip_prefix("Bearer ").ok_or_else(|| {
                    AppError::Unauthorized("Invalid Authorization scheme".to_string())
                })?;

                let user_id = keys.validate(token)?;
                req.extensions_mut().insert(UserId(user_id));
            }

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()).into()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, web, App, HttpResponse};

    async fn whoami(user: Option<UserId>) -> HttpResponse {
        match user {
            Some(UserId(id)) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn private(user: UserId) -> HttpResponse {
        HttpResponse::Ok().body(user.0.to_string())
    }

    fn keys() -> Arc<JwtKeys> {
        Arc::new(JwtKeys::from_secret("middleware-test"))
    }

    #[actix_web::test]
    async fn anonymous_requests_pass_through() {
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(keys()))
                .route("/whoami", web::get().to(whoami))
                .route("/private", web::get().to(private)),
        )
        .await;

        let body =
            test::call_and_read_body(&app, test::TestRequest::get().uri("/whoami").to_request())
                .await;
        assert_eq!(body.as_ref(), b"anonymous");

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/private").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_identifies_user() {
        let keys = keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, chrono::Duration::minutes(5)).unwrap();

        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(keys))
                .route("/private", web::get().to(private)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body.as_ref(), user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn bad_token_is_rejected() {
        let app = test::init_service(
            App::new()
                .wrap(JwtAuthMiddleware::new(keys()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(resp) => resp.status(),
            Err(err) => err.as_response_error().status_code(),
        };
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
