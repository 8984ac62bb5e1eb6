use super::view;
use crate::models::UserSummary;
use crate::services::auth;
use crate::services::validation::ValidationErrors;
use crate::services::ServiceError;
use crate::web::error::{AppResult, HttpError};
use crate::web::extractors::{OptionalUser, SESSION_COOKIE};
use crate::web::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::Duration;

pub async fn admin_home(OptionalUser(user): OptionalUser) -> Redirect {
    match user {
        Some(u) if u.is_admin => Redirect::to("/admin/dashboard"),
        _ => Redirect::to("/admin/login"),
    }
}

#[derive(Serialize)]
struct LoginProps<'a> {
    site_title: &'a str,
}

pub async fn login_form(
    State(state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
) -> Response {
    if user.is_some_and(|u| u.is_admin) {
        return Redirect::to("/admin/dashboard").into_response();
    }
    view(
        "Auth/Login",
        LoginProps {
            site_title: &state.config.site.title,
        },
    )
    .into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct LoggedIn {
    redirect: &'static str,
    user: UserSummary,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let key = form.email.trim().to_lowercase();

    let mut errors = ValidationErrors::new();
    if key.is_empty() {
        errors.add("email", "The email field is required.");
    }
    if form.password.is_empty() {
        errors.add("password", "The password field is required.");
    }
    errors.into_result()?;

    if !state.login_throttle.check(&key) {
        tracing::warn!(email = %key, "Login throttled");
        return Err(HttpError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts. Please try again later.",
        )
        .into());
    }

    match auth::authenticate(&state.db, &key, &form.password)? {
        Some(user) => {
            state.login_throttle.clear(&key);
            let days = state.config.auth.session_lifetime_days;
            let token = auth::create_session(&state.db, user.id, days)?;
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(Duration::days(days))
                .build();

            tracing::info!(user_id = user.id, "User logged in");
            let body = LoggedIn {
                redirect: "/admin/dashboard",
                user: UserSummary::from(&user),
            };
            Ok((jar.add(cookie), axum::Json(body)).into_response())
        }
        None => {
            state.login_throttle.record_failure(&key);
            tracing::warn!(email = %key, "Failed login attempt");
            Err(ServiceError::Validation(ValidationErrors::single(
                "email",
                "These credentials do not match our records.",
            ))
            .into())
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        auth::delete_session(&state.db, cookie.value())?;
    }

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .build();

    Ok((jar.remove(cookie), Redirect::to("/admin/login")).into_response())
}
