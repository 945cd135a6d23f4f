use std::{marker::PhantomData, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    auth::{AuthGateway, Principal, RequiredRole},
    error::AppError,
    state::AppState,
};

// Authenticated caller; cached in the request extensions after the first lookup.
impl FromRequestParts<Arc<AppState>> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>().cloned() {
            return Ok(principal);
        }

        let principal = state.gateway.authenticate(&parts.headers)?;
        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

pub type AuthGuard = Principal;

pub struct AuthRoleGuard<R: RequiredRole> {
    pub principal: Principal,
    _marker: PhantomData<R>,
}

impl<R> FromRequestParts<Arc<AppState>> for AuthRoleGuard<R>
where
    R: RequiredRole,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        AuthGateway::require(&principal, R::allowed())?;

        Ok(Self {
            principal,
            _marker: PhantomData,
        })
    }
}
