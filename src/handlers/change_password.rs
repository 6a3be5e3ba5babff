use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::services::auth::{hash_password, verify_password};
use crate::state::AppState;

/// パスワード変更リクエスト
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub message: String,
}

/// パスワード変更ハンドラー（要認証）
///
/// POST /api/auth/change-password
///
/// Bearer トークンで認証した上で、現在のパスワードを検証してから
/// 新しいハッシュへ書き換える。
///
/// # Security
/// - current_password, new_password はログに出力しない
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, AppError> {
    // バリデーション
    validate_change_password_request(&request)?;

    let user = state
        .user_repo
        .find_by_id(auth_user.user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    // 現在のパスワードを照合
    if !verify_password(&request.current_password, &user.password_hash)? {
        tracing::warn!(user_id = %user.id, "パスワード変更失敗: 現在のパスワード不一致");
        return Err(AppError::Authentication("invalid_credentials".to_string()));
    }

    let password_hash = hash_password(&request.new_password)?;
    state.user_repo.update_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "パスワード変更完了");

    Ok(Json(ChangePasswordResponse {
        message: "パスワードが更新されました".to_string(),
    }))
}

/// パスワード変更リクエストのバリデーション
fn validate_change_password_request(request: &ChangePasswordRequest) -> Result<(), AppError> {
    if request.current_password.is_empty() {
        return Err(AppError::Validation(
            "現在のパスワードは必須です".to_string(),
        ));
    }
    if request.new_password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_current_password() {
        let request = ChangePasswordRequest {
            current_password: "".to_string(),
            new_password: "password123".to_string(),
        };
        assert!(validate_change_password_request(&request).is_err());
    }

    #[test]
    fn test_validate_short_new_password() {
        let request = ChangePasswordRequest {
            current_password: "password123".to_string(),
            new_password: "short".to_string(),
        };
        assert!(validate_change_password_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let request = ChangePasswordRequest {
            current_password: "password123".to_string(),
            new_password: "new-password456".to_string(),
        };
        assert!(validate_change_password_request(&request).is_ok());
    }
}
