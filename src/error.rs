use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("認証エラー: {0}")]
    Authentication(String),

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("権限がありません")]
    Forbidden,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),

    #[error("署名鍵の読み込みエラー: {0}")]
    KeyLoad(String),

    #[error("このメールアドレスは既に使用されています")]
    EmailAlreadyExists,

    #[error("ユーザーが見つかりません")]
    UserNotFound,

    #[error("ホテルが見つかりません")]
    HotelNotFound,

    #[error("リフレッシュトークンが見つかりません")]
    RefreshTokenNotFound,

    #[error("トークンの有効期限が切れています")]
    TokenExpired,

    #[error("トークンはまだ有効ではありません")]
    TokenNotYetValid,

    #[error("無効なトークンです")]
    InvalidToken,

    #[error("Authorization ヘッダーがありません")]
    MissingAuthHeader,

    #[error("Authorization ヘッダーの形式が不正です")]
    InvalidAuthHeader,

    #[error("認証コードが無効です")]
    OtpInvalid,

    #[error("認証コードの有効期限が切れています")]
    OtpExpired,

    #[error("認証コードは既に使用されています")]
    OtpAlreadyUsed,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Authentication(_) => (
                StatusCode::UNAUTHORIZED,
                "メールアドレスまたはパスワードが正しくありません".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "この操作を行う権限がありません".to_string(),
            ),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::KeyLoad(msg) => {
                tracing::error!(detail = %msg, "署名鍵の読み込みエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::EmailAlreadyExists => (
                StatusCode::CONFLICT,
                "このメールアドレスは既に使用されています".to_string(),
            ),
            Self::UserNotFound => (
                StatusCode::NOT_FOUND,
                "ユーザーが見つかりません".to_string(),
            ),
            Self::HotelNotFound => {
                (StatusCode::NOT_FOUND, "ホテルが見つかりません".to_string())
            }
            Self::RefreshTokenNotFound => (
                StatusCode::NOT_FOUND,
                "リフレッシュトークンが見つかりません".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "トークンの有効期限が切れています".to_string(),
            ),
            Self::TokenNotYetValid => (
                StatusCode::UNAUTHORIZED,
                "トークンはまだ有効ではありません".to_string(),
            ),
            Self::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "無効なトークンです".to_string())
            }
            Self::MissingAuthHeader | Self::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "Authorization ヘッダーが不正です".to_string(),
            ),
            Self::OtpInvalid => (
                StatusCode::UNAUTHORIZED,
                "認証コードが正しくありません".to_string(),
            ),
            Self::OtpExpired => (
                StatusCode::UNAUTHORIZED,
                "認証コードの有効期限が切れています".to_string(),
            ),
            Self::OtpAlreadyUsed => (
                StatusCode::UNAUTHORIZED,
                "認証コードは既に使用されています".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
