//! Bearer-token extractor resolving the request's [`Caller`].
//!
//! Handlers take a [`CallerContext`] argument instead of reading headers. The
//! extractor runs the role and block gate, so by the time a handler executes
//! the caller's role reflects stored state.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Caller, Error, Principal};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The resolved caller for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerContext(Caller);

impl CallerContext {
    /// Wrap an already resolved caller.
    pub fn new(caller: Caller) -> Self {
        Self(caller)
    }

    /// The caller, possibly anonymous.
    pub fn caller(&self) -> &Caller {
        &self.0
    }

    /// The authenticated principal or `401 Unauthorized`.
    pub fn require_principal(&self) -> Result<Principal, Error> {
        Ok(self.0.require_principal()?)
    }
}

/// Extract the token from an `Authorization` header value.
///
/// A missing header is `Ok(None)`; any other scheme or an empty token is
/// rejected.
pub(crate) fn bearer_token(req: &HttpRequest) -> Result<Option<String>, Error> {
    let Some(value) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    let token = raw
        .strip_prefix(BEARER_PREFIX)
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))?;
    Ok(Some(token.to_owned()))
}

impl FromRequest for CallerContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let token = token?;
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let caller = state.gate.resolve(token.as_deref()).await?;
            Ok(Self(caller))
        })
    }
}
