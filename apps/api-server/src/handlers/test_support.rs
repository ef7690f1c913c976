//! Helpers for handler tests.

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web,
};

use grove_core::domain::{Role, User};
use grove_core::ports::BaseRepository;
use grove_infra::InMemoryStore;

use crate::state::AppState;

pub fn app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .configure(super::configure_routes)
        .configure(super::configure_seo)
}

/// Store a user directly, bypassing sign-in.
pub async fn seed_user(store: &InMemoryStore, email: &str, role: Role) -> User {
    let name = email.split('@').next().unwrap_or(email).to_string();
    let mut user = User::new(email, name, None);
    user.role = role;
    store.users().insert(user).await.unwrap()
}

/// Authorization header value for `user`.
pub fn bearer(state: &AppState, user: &User) -> (&'static str, String) {
    let token = state
        .tokens
        .generate_token(user.id, &user.email, user.role)
        .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

/// Post body long enough to pass validation.
pub fn body_text() -> String {
    vec!["woodland"; 120].join(" ")
}
