use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// ログアウトリクエスト
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// ログアウトレスポンス
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// ログアウトハンドラー
///
/// POST /api/auth/logout
///
/// リフレッシュトークンを検証した上でDBから削除し、セッションを即座に
/// 失効させる。保存済みトークンがない場合は404（冪等にはしない）。
/// アクセストークンは自然失効を待つしかないため有効期限が短い。
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<LogoutResponse>, AppError> {
    // バリデーション
    validate_logout_request(&request)?;

    // トークン検証 → 所有ユーザーの行を削除
    let user_id = state
        .token_manager
        .validate_refresh_token(&request.refresh_token)
        .await?;

    state.token_manager.delete_refresh_token(user_id).await?;

    tracing::info!(user_id = %user_id, "ログアウト完了");

    Ok(Json(LogoutResponse {
        message: "ログアウトしました".to_string(),
    }))
}

/// ログアウトリクエストのバリデーション
fn validate_logout_request(request: &LogoutRequest) -> Result<(), AppError> {
    if request.refresh_token.trim().is_empty() {
        return Err(AppError::Validation(
            "リフレッシュトークンは必須です".to_string(),
        ));
    }
    Ok(())
}
