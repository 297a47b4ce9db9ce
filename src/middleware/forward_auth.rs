//! Middleware capturing the caller's bearer token for forwarding.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::AUTHORIZATION;
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

use crate::auth::{CallerToken, with_caller_token};

/// Forward-authorization middleware factory.
pub struct ForwardAuthorization;

impl<S, B> Transform<S, ServiceRequest> for ForwardAuthorization
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ForwardAuthorizationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ForwardAuthorizationMiddleware { service }))
    }
}

pub struct ForwardAuthorizationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for ForwardAuthorizationMiddleware<S>
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
        let token = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(CallerToken::from_authorization);

        let fut = self.service.call(req);
        Box::pin(with_caller_token(token, fut))
    }
}
