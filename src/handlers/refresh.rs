use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::TokenPairResponse;
use crate::state::AppState;

/// トークン更新リクエスト
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// トークン更新ハンドラー
///
/// POST /api/auth/refresh
///
/// 処理フロー:
/// 1. リクエストバリデーション
/// 2. リフレッシュトークン検証（ハッシュ照合 + 期限チェック）
/// 3. 新しいアクセストークン発行
/// 4. リフレッシュトークンのローテーション（旧トークンは上書きで無効化）
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    // 1. リクエストバリデーション
    validate_refresh_request(&request)?;

    // 2. リフレッシュトークン検証
    let user_id = state
        .token_manager
        .validate_refresh_token(&request.refresh_token)
        .await?;

    // ロールはトークンではなくDBから取得する（検証済みの現在値を使う）
    let user = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    // 3, 4. 新しいトークンペアを発行（旧リフレッシュトークンは無効化される）
    let access_token = state.token_manager.generate_access_token(user.id, user.role)?;
    let refresh_token = state.token_manager.generate_refresh_token(user.id).await?;

    tracing::info!(user_id = %user.id, "トークン更新");

    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
    }))
}

/// トークン更新リクエストのバリデーション
fn validate_refresh_request(request: &RefreshRequest) -> Result<(), AppError> {
    if request.refresh_token.trim().is_empty() {
        return Err(AppError::Validation(
            "リフレッシュトークンは必須です".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_refresh_token() {
        let request = RefreshRequest {
            refresh_token: "".to_string(),
        };
        assert!(validate_refresh_request(&request).is_err());
    }

    #[test]
    fn test_validate_whitespace_refresh_token() {
        let request = RefreshRequest {
            refresh_token: "   ".to_string(),
        };
        assert!(validate_refresh_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_refresh_request() {
        let request = RefreshRequest {
            refresh_token: "opaque-token".to_string(),
        };
        assert!(validate_refresh_request(&request).is_ok());
    }
}
