// src/middleware.rs
// Per-request middleware: token authentication and request logging

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::sync::Arc;
use std::time::Instant;

use crate::logger::Logger;

/// Check a presented credential against the configured token. The
/// `Authorization` header may carry the raw token or a `Bearer `-prefixed
/// one (literal prefix, exact token); the `authentication` query parameter
/// carries the raw token.
fn credential_matches(token: &str, authorization: Option<&str>, query: &str) -> bool {
    if let Some(value) = authorization {
        if value == token {
            return true;
        }
        if let Some(bearer) = value.strip_prefix("Bearer ") {
            if bearer == token {
                return true;
            }
        }
    }

    query_credential(query).as_deref() == Some(token)
}

fn query_credential(query: &str) -> Option<String> {
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key == "authentication" {
                return Some(
                    urlencoding::decode(value)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| value.to_string()),
                );
            }
        }
    }
    None
}

/// Rejects requests that do not present the configured token. Installed
/// outside the logging middleware: a rejected request produces no log
/// records and never reaches the file delegate.
pub struct TokenAuth {
    token: Option<String>,
}

impl TokenAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TokenAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = TokenAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenAuthMiddleware {
            service,
            token: self.token.clone(),
        }))
    }
}

pub struct TokenAuthMiddleware<S> {
    service: S,
    token: Option<String>,
}

impl<S, B> Service<ServiceRequest> for TokenAuthMiddleware<S>
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
        let authorized = match &self.token {
            None => true,
            Some(token) => {
                let authorization = req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                credential_matches(token, authorization, req.query_string())
            }
        };

        if !authorized {
            let response = HttpResponse::Forbidden()
                .content_type("text/plain; charset=utf-8")
                .body("Forbidden");
            return Box::pin(ready(Ok(req.into_response(response).map_into_right_body())));
        }

        let fut = self.service.call(req);
        Box::pin(async move { Ok(fut.await?.map_into_left_body()) })
    }
}

/// Emits one record when a request arrives and one when its response goes
/// out. Latency is wall-clock and covers time the request spent suspended
/// on I/O.
pub struct RequestLogging {
    logger: Arc<Logger>,
    enabled: bool,
}

impl RequestLogging {
    pub fn new(logger: Arc<Logger>, enabled: bool) -> Self {
        Self { logger, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingMiddleware {
            service,
            logger: Arc::clone(&self.logger),
            enabled: self.enabled,
        }))
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: S,
    logger: Arc<Logger>,
    enabled: bool,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !self.enabled {
            return Box::pin(self.service.call(req));
        }

        let started = Instant::now();
        let ip = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let method = req.method().to_string();
        let path = req.path().to_string();

        let logger = Arc::clone(&self.logger);
        logger.http(&ip, &method, &path, None, None);

        let fut = self.service.call(req);

        Box::pin(async move {
            match fut.await {
                Ok(res) => {
                    logger.http(
                        &ip,
                        &method,
                        &path,
                        Some(res.status().as_u16()),
                        Some(started.elapsed().as_millis()),
                    );
                    Ok(res)
                }
                Err(err) => {
                    // The delegate's failure stays its own; the completion
                    // record still fires.
                    let status = err.as_response_error().status_code().as_u16();
                    logger.http(
                        &ip,
                        &method,
                        &path,
                        Some(status),
                        Some(started.elapsed().as_millis()),
                    );
                    Err(err)
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    #[::core::prelude::v1::test]
    fn test_raw_token_in_header() {
        assert!(credential_matches("secret", Some("secret"), ""));
    }

    #[::core::prelude::v1::test]
    fn test_bearer_prefix() {
        assert!(credential_matches("secret", Some("Bearer secret"), ""));
    }

    #[::core::prelude::v1::test]
    fn test_bearer_prefix_is_case_sensitive() {
        assert!(!credential_matches("secret", Some("bearer secret"), ""));
        assert!(!credential_matches("secret", Some("BEARER secret"), ""));
    }

    #[::core::prelude::v1::test]
    fn test_token_must_match_exactly() {
        assert!(!credential_matches("secret", Some("secrets"), ""));
        assert!(!credential_matches("secret", Some("Bearer secrets"), ""));
        assert!(!credential_matches("secret", Some("Bearer  secret"), ""));
        assert!(!credential_matches("secret", None, ""));
    }

    #[::core::prelude::v1::test]
    fn test_query_parameter_credential() {
        assert!(credential_matches("secret", None, "authentication=secret"));
        assert!(credential_matches(
            "secret",
            None,
            "foo=bar&authentication=secret"
        ));
        assert!(!credential_matches("secret", None, "authentication=wrong"));
        assert!(!credential_matches("secret", None, "auth=secret"));
    }

    #[::core::prelude::v1::test]
    fn test_query_parameter_is_url_decoded() {
        assert!(credential_matches(
            "a token",
            None,
            "authentication=a%20token"
        ));
    }

    #[::core::prelude::v1::test]
    fn test_query_credential_skips_broken_pairs() {
        assert_eq!(query_credential("flag&authentication=x"), Some("x".into()));
        assert_eq!(query_credential(""), None);
    }

    async fn ok_handler() -> HttpResponse {
        HttpResponse::Ok().body("ok")
    }

    #[actix_web::test]
    async fn test_auth_middleware_rejects_with_forbidden() {
        let app = test::init_service(
            App::new()
                .wrap(TokenAuth::new(Some("secret".to_string())))
                .route("/", web::get().to(ok_handler)),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 403);

        let body = test::read_body(res).await;
        assert_eq!(&body[..], b"Forbidden");
    }

    #[actix_web::test]
    async fn test_auth_middleware_passes_valid_header() {
        let app = test::init_service(
            App::new()
                .wrap(TokenAuth::new(Some("secret".to_string())))
                .route("/", web::get().to(ok_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header(("Authorization", "Bearer secret"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 200);
    }

    #[actix_web::test]
    async fn test_auth_middleware_without_token_passes_everything() {
        let app = test::init_service(
            App::new()
                .wrap(TokenAuth::new(None))
                .route("/", web::get().to(ok_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/?authentication=anything")
            .insert_header(("Authorization", "garbage"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 200);
    }
}
