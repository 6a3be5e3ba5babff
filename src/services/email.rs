use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;

/// メール送信サービス（開発環境: スタブ実装）
#[derive(Clone)]
pub struct EmailService {
    config: Arc<Config>,
}

impl EmailService {
    /// 新しい EmailService を作成
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// パスワードリセット用のOTPメールを送信
    ///
    /// SMTP未設定の開発モードではメールの代わりにコードをログへ出す。
    /// コード平文がログに現れるのはこの経路だけ（SMTP設定後は出さない）。
    ///
    /// 本番環境では lettre クレートを使用してメール送信を実装予定
    pub async fn send_otp_email(&self, to: &str, code: &str) -> Result<(), AppError> {
        let smtp_configured = self.config.smtp_host.is_some()
            && self.config.smtp_username.is_some()
            && self.config.smtp_password.is_some()
            && self.config.smtp_from_address.is_some();

        if !smtp_configured {
            // 開発モード: メール送信せずログ出力のみ
            tracing::info!(
                to = %to,
                "パスワードリセットOTPメール送信（開発モード）"
            );
            tracing::info!("OTPコード: {}", code);
            return Ok(());
        }

        // TODO: 本番実装時は以下のような形式で lettre を使用
        // let mailer = SmtpTransport::relay(host)?.build();
        // mailer.send(&email)?;
        tracing::warn!(to = %to, "SMTP送信は未実装（メールは送信されません）");

        Ok(())
    }
}
