/// Role gate for admin-only scopes.
///
/// Runs after `AuthMiddleware` and reads the `TokenPayload` it injected;
/// a non-admin identity terminates the request with 403.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{Role, TokenPayload};
use crate::error::{AppError, AuthError};

pub struct AdminMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AdminMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AdminMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminMiddlewareService<S>
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
        let role = req
            .extensions()
            .get::<TokenPayload>()
            .map(|payload| payload.role);

        match role {
            Some(Role::Admin) => {
                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Some(_) => Box::pin(async move { Err(AppError::Auth(AuthError::Forbidden).into()) }),
            // No identity present: the auth middleware did not run on this
            // route, so the request cannot be authorized at all.
            None => {
                Box::pin(async move { Err(AppError::Auth(AuthError::MissingAuthHeader).into()) })
            }
        }
    }
}
