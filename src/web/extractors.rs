use crate::models::User;
use crate::services::auth;
use crate::web::error::{AppError, HttpError};
use crate::web::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "session";

/// The authenticated administrator of the current request.
///
/// Handlers that mutate or expose admin data take this as an argument; there
/// is no other way to learn who is signed in.
pub struct AdminContext {
    pub user: User,
}

impl FromRequestParts<Arc<AppState>> for AdminContext {
    type Rejection = AppError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let headers = parts.headers.clone();
        Box::pin(async move {
            let cookies = CookieJar::from_headers(&headers);
            let token = cookies
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or_else(HttpError::unauthorized)?;

            let user = auth::validate_session(&state.db, &token)?
                .ok_or_else(HttpError::unauthorized)?;
            if !user.is_admin {
                tracing::warn!(user_id = user.id, "Non-admin user refused");
                return Err(HttpError::forbidden().into());
            }

            Ok::<_, AppError>(AdminContext { user })
        })
    }
}

pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = AppError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let state = state.clone();
        let headers = parts.headers.clone();
        Box::pin(async move {
            let cookies = CookieJar::from_headers(&headers);
            let token = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());

            let user = match token {
                Some(t) => auth::validate_session(&state.db, &t).ok().flatten(),
                None => None,
            };

            Ok::<_, AppError>(OptionalUser(user))
        })
    }
}
