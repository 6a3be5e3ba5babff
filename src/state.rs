use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{
    HotelRepository, OtpTokenRepository, RefreshTokenRepository, UserRepository,
};
use crate::services::{AuthService, EmailService, OtpService, TokenManager};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
/// プールと不変の署名鍵以外に、リクエストをまたぐ可変状態は持たない。
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL コネクションプール
    pub db_pool: PgPool,
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// ユーザーリポジトリ
    pub user_repo: UserRepository,
    /// ホテルリポジトリ
    pub hotel_repo: HotelRepository,
    /// 認証サービス
    pub auth_service: AuthService,
    /// トークンマネージャー（アクセス/リフレッシュトークン）
    pub token_manager: TokenManager,
    /// OTPサービス
    pub otp_service: OtpService,
    /// メールサービス
    pub email_service: EmailService,
}

impl AppState {
    /// 新しい AppState を作成
    ///
    /// RSA鍵ペアの読み込みに失敗した場合はエラー（起動時致命）
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let config = Arc::new(config);
        let user_repo = UserRepository::new(db_pool.clone());
        let hotel_repo = HotelRepository::new(db_pool.clone());
        let refresh_token_repo = RefreshTokenRepository::new(db_pool.clone());
        let otp_repo = OtpTokenRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone());
        let token_manager = TokenManager::new(&config, refresh_token_repo)?;
        let otp_service = OtpService::new(otp_repo, config.otp_ttl_mins);
        let email_service = EmailService::new(config.clone());

        Ok(Self {
            db_pool,
            config,
            user_repo,
            hotel_repo,
            auth_service,
            token_manager,
            otp_service,
            email_service,
        })
    }
}
