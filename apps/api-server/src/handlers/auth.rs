//! Sign-in exchange and profile endpoints.

use actix_web::{HttpRequest, HttpResponse, web};

use grove_core::services::SignInProfile;
use grove_shared::dto::{AuthResponse, SignInRequest};
use subtle::ConstantTimeEq;

use super::mapping;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Header carrying the identity gateway's shared secret.
pub const GATEWAY_SECRET_HEADER: &str = "X-Gateway-Secret";

/// Exchange a verified OAuth profile for a session token.
///
/// POST /api/auth/sign-in
///
/// Only the identity gateway may call this; it authenticates with the shared
/// secret in [`GATEWAY_SECRET_HEADER`].
pub async fn sign_in(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SignInRequest>,
) -> AppResult<HttpResponse> {
    verify_gateway(&state, &req)?;

    let body = body.into_inner();
    let user = state
        .accounts
        .sign_in(SignInProfile {
            email: body.email,
            name: body.name,
            image: body.image,
        })
        .await?;

    let access_token = state
        .tokens
        .generate_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "User signed in");

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
        user: mapping::user(&user),
    }))
}

/// Get the current user's profile.
///
/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(Some(&identity.actor())).await?;
    Ok(HttpResponse::Ok().json(mapping::user(&user)))
}

fn verify_gateway(state: &AppState, req: &HttpRequest) -> Result<(), AppError> {
    let Some(expected) = state.gateway_secret.as_deref() else {
        tracing::warn!("Sign-in attempted but IDENTITY_GATEWAY_SECRET is not configured");
        return Err(AppError::Forbidden);
    };

    let presented = req
        .headers()
        .get(GATEWAY_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    if !secrets_match(presented, expected) {
        tracing::warn!("Sign-in rejected: gateway secret mismatch");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use grove_shared::dto::UserResponse;

    fn sign_in_body() -> serde_json::Value {
        serde_json::json!({
            "email": "Reader@Example.com",
            "name": "Reader",
            "image": "https://img.example.com/reader.png"
        })
    }

    #[actix_web::test]
    async fn sign_in_issues_token_usable_for_me() {
        let (state, _store) = AppState::in_memory(Some("gateway-secret"));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .insert_header((GATEWAY_SECRET_HEADER, "gateway-secret"))
            .set_json(sign_in_body())
            .to_request();
        let auth: AuthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.user.email, "reader@example.com");
        assert_eq!(auth.user.role, "user");

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {}", auth.access_token)))
            .to_request();
        let me: UserResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(me.id, auth.user.id);
    }

    #[actix_web::test]
    async fn sign_in_requires_gateway_secret() {
        let (state, _store) = AppState::in_memory(Some("gateway-secret"));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let missing = test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .set_json(sign_in_body())
            .to_request();
        assert_eq!(
            test::call_service(&app, missing).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let wrong = test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .insert_header((GATEWAY_SECRET_HEADER, "guess"))
            .set_json(sign_in_body())
            .to_request();
        assert_eq!(
            test::call_service(&app, wrong).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn sign_in_disabled_without_configured_secret() {
        let (state, _store) = AppState::in_memory(None);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/sign-in")
            .insert_header((GATEWAY_SECRET_HEADER, "anything"))
            .set_json(sign_in_body())
            .to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[actix_web::test]
    async fn me_without_token_is_unauthorized() {
        let (state, _store) = AppState::in_memory(None);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[::core::prelude::v1::test]
    fn secrets_match_compares_contents() {
        assert!(secrets_match("secret", "secret"));
        assert!(!secrets_match("secret", "secreT"));
        assert!(!secrets_match("secret", "secrets"));
        assert!(!secrets_match("", "secret"));
    }
}
