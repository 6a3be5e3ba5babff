use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::RefreshToken;

#[derive(Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ユーザーのリフレッシュトークンを単一文でupsert
    ///
    /// user_id の UNIQUE 制約を利用し、既存行があればハッシュと期限を
    /// 上書きする。read-then-write ではなく ON CONFLICT で原子的に行う。
    /// 同一ユーザーの同時ログインは最後の書き込みが勝ち、
    /// それ以前に発行されたトークンは即座に検証不能になる。
    pub async fn upsert(
        &self,
        user_id: Uuid,
        token_hash: &str,
        created_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET token_hash = EXCLUDED.token_hash,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(created_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// トークンハッシュでトークンを検索
    ///
    /// # Note
    /// 有効期限の検証は呼び出し側で行う
    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshToken>, sqlx::Error> {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    /// ユーザーのリフレッシュトークンを削除
    ///
    /// # Returns
    /// 削除された行数（0 = 保存済みトークンなし）
    pub async fn delete_by_user_id(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
