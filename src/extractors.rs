use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// アクセストークンで認証済みのユーザー
///
/// ハンドラーの引数に書くだけで Authorization ヘッダーの
/// Bearer トークンを検証し、クレームを取り出す。
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AppError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AppError::InvalidAuthHeader)?;

        // 期待する形式: "Bearer <token>"
        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(AppError::InvalidAuthHeader)?
            .trim();
        if token.is_empty() {
            return Err(AppError::InvalidAuthHeader);
        }

        let claims = state.token_manager.parse_access_token(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}
