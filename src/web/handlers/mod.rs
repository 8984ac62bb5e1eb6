pub mod admin;
pub mod auth;
pub mod public;
pub mod terms;

use axum::Json;
use serde::Serialize;

/// A page-style response: the client-side component to mount and its props.
#[derive(Debug, Serialize)]
pub struct View<P> {
    pub component: &'static str,
    pub props: P,
}

pub fn view<P: Serialize>(component: &'static str, props: P) -> Json<View<P>> {
    Json(View { component, props })
}

#[derive(Debug, Serialize)]
pub struct Message<T> {
    pub message: String,
    #[serde(flatten)]
    pub data: T,
}

pub fn message<T: Serialize>(message: impl Into<String>, data: T) -> Json<Message<T>> {
    Json(Message {
        message: message.into(),
        data,
    })
}
