use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::TokenPairResponse;
use crate::models::Role;
use crate::services::auth::hash_password;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
}

/// ユーザー登録ハンドラー
///
/// POST /api/auth/register
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenPairResponse>), AppError> {
    // バリデーション
    validate_register_request(&request)?;

    // メールアドレスは小文字で正規化して保存
    let email = request.email.trim().to_lowercase();

    // パスワードハッシュ化
    let password_hash = hash_password(&request.password)?;

    // ユーザー作成
    let user = state
        .user_repo
        .create_user(request.name.trim(), &email, &password_hash, Role::User)
        .await
        .map_err(|e| {
            // UNIQUE制約違反チェック
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some("users_email_key")
            {
                return AppError::EmailAlreadyExists;
            }
            AppError::Database(e)
        })?;

    tracing::info!(email = %email, "ユーザー登録成功");

    // トークン発行。リフレッシュトークンの保存に失敗した場合は
    // 部分的な成功レスポンスを返さずエラーを返す
    let access_token = state.token_manager.generate_access_token(user.id, user.role)?;
    let refresh_token = state.token_manager.generate_refresh_token(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenPairResponse {
            access_token,
            refresh_token,
        }),
    ))
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    // name: 3文字以上
    if request.name.trim().chars().count() < 3 {
        return Err(AppError::Validation(
            "名前は3文字以上で入力してください".to_string(),
        ));
    }
    // email: 必須、メール形式
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("メールアドレスは必須です".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    // password: 8文字以上
    if request.password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_short_name() {
        let result = validate_register_request(&request("ab", "test@example.com", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_empty_email() {
        let result = validate_register_request(&request("taro", "", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let result = validate_register_request(&request("taro", "invalid-email", "password123"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let result = validate_register_request(&request("taro", "test@example.com", "short"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let result =
            validate_register_request(&request("taro", "test@example.com", "password123"));
        assert!(result.is_ok());
    }
}
