use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::OtpToken;

#[derive(Clone)]
pub struct OtpTokenRepository {
    pool: PgPool,
}

impl OtpTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 新しいOTPレコードを作成
    ///
    /// # Arguments
    /// * `user_id` - 対象ユーザーのID
    /// * `token_hash` - コードのSHA256ハッシュ
    /// * `expires_at` - 有効期限
    pub async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<OtpToken, sqlx::Error> {
        sqlx::query_as::<_, OtpToken>(
            r#"
            INSERT INTO otp_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, created_at, expires_at, used_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
    }

    /// 未使用かつ有効期限内のコードを使用済みにマーク（check-and-set）
    ///
    /// 読み取りと used_at の更新を単一のUPDATE文で行うため、
    /// 同じコードの同時検証が両方成功することはない。
    ///
    /// # Returns
    /// 消費できた場合は行ID、消費対象がなければ None
    pub async fn consume(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE otp_tokens
            SET used_at = NOW()
            WHERE user_id = $1
              AND token_hash = $2
              AND used_at IS NULL
              AND expires_at > NOW()
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// ハッシュが一致するレコードを検索（consume 失敗理由の特定用）
    ///
    /// 同じハッシュの行が複数ある場合は最新のものを返す
    pub async fn find_by_token_hash(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> Result<Option<OtpToken>, sqlx::Error> {
        sqlx::query_as::<_, OtpToken>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at, used_at
            FROM otp_tokens
            WHERE user_id = $1 AND token_hash = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// 期限切れかつ未使用のレコードを削除
    ///
    /// # Returns
    /// 削除された行数
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM otp_tokens
            WHERE expires_at < NOW() AND used_at IS NULL
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
