/// Bearer-token authorization middleware.
///
/// Extracts the `Authorization: Bearer <token>` credential, validates it
/// and injects the verified `TokenPayload` into request extensions for
/// downstream handlers. Every failure terminates the request with the
/// uniform 401 body; the specific kind is only logged.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderValue},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{TokenPayload, TokenService};
use crate::error::{AppError, AuthError};

pub struct AuthMiddleware {
    tokens: TokenService,
}

impl AuthMiddleware {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    tokens: TokenService,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
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
        let outcome = match req.headers().get(header::AUTHORIZATION) {
            None => Err(AuthError::MissingAuthHeader),
            Some(value) => {
                extract_bearer(value).and_then(|token| self.tokens.validate_access_token(token))
            }
        };

        match outcome {
            Ok(payload) => {
                req.extensions_mut().insert(payload);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => Box::pin(async move { Err(AppError::Auth(e).into()) }),
        }
    }
}

/// The header must be exactly `Bearer <token>` with a non-empty,
/// space-free token.
fn extract_bearer(value: &HeaderValue) -> Result<&str, AuthError> {
    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeaderFormat)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeaderFormat)?;
    if token.is_empty() || token.contains(' ') {
        return Err(AuthError::InvalidAuthHeaderFormat);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn well_formed_bearer_is_accepted() {
        assert_eq!(extract_bearer(&header("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn wrong_scheme_is_rejected() {
        assert_eq!(
            extract_bearer(&header("Token abc")),
            Err(AuthError::InvalidAuthHeaderFormat)
        );
    }

    #[test]
    fn empty_token_is_rejected() {
        assert_eq!(
            extract_bearer(&header("Bearer ")),
            Err(AuthError::InvalidAuthHeaderFormat)
        );
    }

    #[test]
    fn extra_parts_are_rejected() {
        assert_eq!(
            extract_bearer(&header("Bearer abc def")),
            Err(AuthError::InvalidAuthHeaderFormat)
        );
    }

    #[test]
    fn bare_scheme_is_rejected() {
        assert_eq!(
            extract_bearer(&header("Bearer")),
            Err(AuthError::InvalidAuthHeaderFormat)
        );
    }
}
