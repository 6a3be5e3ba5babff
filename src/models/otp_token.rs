use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// パスワードリセット用のワンタイムコード
///
/// コードはSHA256ハッシュで保存。used_at が NULL の行だけが未使用。
/// 使用済みの行は削除せず残す（監査用）。
#[derive(Debug, FromRow)]
pub struct OtpToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub used_at: Option<OffsetDateTime>,
}
