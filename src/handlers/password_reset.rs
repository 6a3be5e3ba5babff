use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::auth::hash_password;
use crate::state::AppState;

// === OTP発行（パスワードを忘れた） ===

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
}

/// POST /api/auth/forgot-password
///
/// 対象ユーザーに6桁のOTPを発行してメールで送信する。
///
/// # Security
/// - OTP（平文）はハンドラーではログに出力しない
///   （SMTP未設定の開発モードに限り EmailService がログ出力で代替する）
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    // バリデーション
    validate_email(&request.email)?;

    let email = request.email.trim().to_lowercase();

    // ユーザー検索
    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    // OTP発行 → メール送信
    let code = state.otp_service.generate(user.id).await?;
    state.email_service.send_otp_email(&email, &code).await?;

    tracing::info!(email = %email, "パスワードリセットOTP送信完了");

    Ok(Json(ForgotPasswordResponse {
        message: "認証コードをメールで送信しました".to_string(),
    }))
}

// === OTP検証 ===

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub message: String,
}

/// POST /api/auth/verify-otp
///
/// OTPを検証して消費する。同じコードでの2回目の検証は必ず失敗する。
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, AppError> {
    // バリデーション
    validate_email(&request.email)?;
    validate_otp_code(&request.otp)?;

    let email = request.email.trim().to_lowercase();

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    state.otp_service.verify(user.id, &request.otp).await?;

    Ok(Json(VerifyOtpResponse {
        message: "認証コードを確認しました".to_string(),
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
}

/// POST /api/auth/reset-password
///
/// OTPを検証・消費した上でパスワードを更新する。
///
/// # Security
/// - otp, new_password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    // バリデーション
    validate_email(&request.email)?;
    validate_otp_code(&request.otp)?;
    if request.new_password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }

    let email = request.email.trim().to_lowercase();

    let user = state
        .user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AppError::UserNotFound)?;

    // OTPの消費に成功した場合のみパスワードを書き換える
    state.otp_service.verify(user.id, &request.otp).await?;

    let password_hash = hash_password(&request.new_password)?;
    state.user_repo.update_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "パスワードリセット完了");

    Ok(Json(ResetPasswordResponse {
        message: "パスワードが更新されました".to_string(),
    }))
}

/// メールアドレスのバリデーション
fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    Ok(())
}

/// OTPコードのバリデーション（6桁の数字）
fn validate_otp_code(code: &str) -> Result<(), AppError> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "認証コードは6桁の数字で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_email() {
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        assert!(validate_email("invalid-email").is_err());
    }

    #[test]
    fn test_validate_valid_email() {
        assert!(validate_email("test@example.com").is_ok());
    }

    #[test]
    fn test_validate_otp_code_wrong_length() {
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("1234567").is_err());
    }

    #[test]
    fn test_validate_otp_code_non_digit() {
        assert!(validate_otp_code("12a456").is_err());
        assert!(validate_otp_code("１２３４５６").is_err()); // 全角は不可
    }

    #[test]
    fn test_validate_otp_code_valid() {
        assert!(validate_otp_code("012345").is_ok());
    }
}
