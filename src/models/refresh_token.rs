use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// リフレッシュトークン
///
/// トークン自体はSHA256ハッシュでDBに保存（token_hash）。
/// 平文は発行時に一度だけ呼び出し側へ返し、DBには保存しない。
/// user_id に UNIQUE 制約があり、1ユーザーにつき有効なトークンは常に1つ。
#[derive(Debug, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}
