use rand::Rng;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::repositories::OtpTokenRepository;

/// OTPの桁数
const OTP_LENGTH: usize = 6;

/// ワンタイムコード（OTP）サービス
///
/// パスワードリセット用の6桁コードを発行・検証する。
/// 同一ユーザーに複数の未使用コードが併存できる（新規発行は既存コードを
/// 無効化しない）。各コードは有効期限内に一度だけ使用できる。
#[derive(Clone)]
pub struct OtpService {
    otp_repo: OtpTokenRepository,
    ttl: Duration,
}

impl OtpService {
    /// 新しい OtpService を作成
    pub fn new(otp_repo: OtpTokenRepository, ttl_mins: i64) -> Self {
        Self {
            otp_repo,
            ttl: Duration::minutes(ttl_mins),
        }
    }

    /// 6桁のOTPを発行してユーザーに紐付けて保存
    ///
    /// # Security
    /// - コード（平文）はここではログに出力しない。DBにはSHA256ハッシュのみ保存
    /// - 戻り値の平文はメール送信にのみ使うこと
    ///   （SMTP未設定の開発モードでは EmailService がログ出力で代替する）
    pub async fn generate(&self, user_id: Uuid) -> Result<String, AppError> {
        // 発行のついでに期限切れレコードを掃除（専用バッチは持たない）
        let purged = self.otp_repo.delete_expired().await?;
        if purged > 0 {
            tracing::debug!(purged, "期限切れOTPを削除");
        }

        let code = generate_numeric_code(OTP_LENGTH);
        let expires_at = OffsetDateTime::now_utc() + self.ttl;

        self.otp_repo
            .create(user_id, &hash_code(&code), expires_at)
            .await?;

        tracing::info!(user_id = %user_id, "OTP発行");

        Ok(code)
    }

    /// OTPを検証して消費する
    ///
    /// 消費（used_at の設定）は読み取りと同一のUPDATE文で行うため、
    /// 同じコードの同時検証が両方成功することはない。
    /// 成功を返すのは必ず used_at を設定できた場合のみ。
    pub async fn verify(&self, user_id: Uuid, code: &str) -> Result<(), AppError> {
        let token_hash = hash_code(code);

        if let Some(id) = self.otp_repo.consume(user_id, &token_hash).await? {
            tracing::info!(user_id = %user_id, token_id = %id, "OTP検証成功");
            return Ok(());
        }

        // 消費できなかった理由を特定して区別可能なエラーを返す
        match self.otp_repo.find_by_token_hash(user_id, &token_hash).await? {
            Some(token) if token.used_at.is_some() => {
                tracing::warn!(user_id = %user_id, token_id = %token.id, "使用済みOTP");
                Err(AppError::OtpAlreadyUsed)
            }
            Some(token) if token.expires_at < OffsetDateTime::now_utc() => {
                tracing::warn!(user_id = %user_id, token_id = %token.id, "期限切れOTP");
                Err(AppError::OtpExpired)
            }
            _ => {
                tracing::warn!(user_id = %user_id, "OTP不一致");
                Err(AppError::OtpInvalid)
            }
        }
    }
}

/// 固定長の数字コードを生成
///
/// 各桁を独立に 0〜9 の一様乱数から引く。単一の乱数の mod 10^n は
/// 桁分布に偏りが出るため使わない。
fn generate_numeric_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// コードをSHA256でハッシュ化
fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_numeric_code_shape() {
        for _ in 0..100 {
            let code = generate_numeric_code(OTP_LENGTH);
            assert_eq!(code.len(), OTP_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generate_numeric_code_varies() {
        // 100回引いて全て同一なら乱数源が壊れている
        let codes: std::collections::HashSet<String> =
            (0..100).map(|_| generate_numeric_code(OTP_LENGTH)).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_hash_code_deterministic() {
        assert_eq!(hash_code("123456"), hash_code("123456"));
        assert_ne!(hash_code("123456"), hash_code("654321"));
        assert_eq!(hash_code("123456").len(), 64);
    }
}
