use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::models::Role;
use crate::repositories::RefreshTokenRepository;

/// アクセストークンのクレーム
///
/// iat / nbf は必須フィールドのため、欠落したトークンは
/// デシリアライズ段階で弾かれる。
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

/// アクセストークン署名用のRSA鍵ペア
///
/// 起動時に一度だけPEMファイルから読み込み、以降は不変。
pub struct AccessTokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AccessTokenKeys {
    /// PEMファイルから鍵ペアを読み込む
    ///
    /// ファイルが読めない・PEMとして不正・RSA鍵でない場合は
    /// `AppError::KeyLoad`（起動時致命エラー、リトライしない）
    pub fn load(private_key_path: &str, public_key_path: &str) -> Result<Self, AppError> {
        let private_pem = std::fs::read(private_key_path).map_err(|e| {
            AppError::KeyLoad(format!("秘密鍵を読み込めません {private_key_path}: {e}"))
        })?;
        let public_pem = std::fs::read(public_key_path).map_err(|e| {
            AppError::KeyLoad(format!("公開鍵を読み込めません {public_key_path}: {e}"))
        })?;

        Self::from_pem(&private_pem, &public_pem)
    }

    /// PEMバイト列から鍵ペアを構築
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, AppError> {
        let encoding = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|e| AppError::KeyLoad(format!("RSA秘密鍵としてパースできません: {e}")))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|e| AppError::KeyLoad(format!("RSA公開鍵としてパースできません: {e}")))?;

        Ok(Self { encoding, decoding })
    }

    /// クレームをRS256で署名
    pub fn sign(&self, claims: &AccessClaims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding).map_err(|e| {
            tracing::error!(error = ?e, "アクセストークンの署名に失敗");
            AppError::Internal(anyhow::anyhow!("access token signing error"))
        })
    }

    /// トークンを検証してクレームを取り出す
    ///
    /// RS256以外のアルゴリズムは拒否する（アルゴリズム混同攻撃対策）。
    /// exp は必須かつ未来、nbf は過去であること。leeway なし。
    pub fn parse(&self, token: &str) -> Result<AccessClaims, AppError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        match decode::<AccessClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AppError::TokenExpired),
                ErrorKind::ImmatureSignature => Err(AppError::TokenNotYetValid),
                _ => Err(AppError::InvalidToken),
            },
        }
    }
}

/// トークンマネージャー
///
/// アクセストークンはステートレス（署名のみで自己検証）、
/// リフレッシュトークンはステートフル（DBにハッシュを保存、失効可能）。
/// アクセストークンは発行後に失効できないため有効期限を分単位に短く、
/// リフレッシュトークンは日単位で長くしログアウトで即座に失効させる。
#[derive(Clone)]
pub struct TokenManager {
    keys: Arc<AccessTokenKeys>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    refresh_token_repo: RefreshTokenRepository,
}

impl TokenManager {
    /// 新しい TokenManager を作成（鍵の読み込みは起動時致命）
    pub fn new(config: &Config, refresh_token_repo: RefreshTokenRepository) -> Result<Self, AppError> {
        let keys = AccessTokenKeys::load(
            &config.access_token_private_key_path,
            &config.access_token_public_key_path,
        )?;

        Ok(Self {
            keys: Arc::new(keys),
            access_token_ttl: Duration::minutes(config.access_token_ttl_mins),
            refresh_token_ttl: Duration::days(config.refresh_token_ttl_days),
            refresh_token_repo,
        })
    }

    /// アクセストークンを発行
    ///
    /// 副作用なし。署名失敗は設定不備による致命エラー。
    pub fn generate_access_token(&self, user_id: Uuid, role: Role) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();

        let claims = AccessClaims {
            sub: user_id,
            role,
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: (now + self.access_token_ttl).unix_timestamp(),
        };

        self.keys.sign(&claims)
    }

    /// アクセストークンを検証
    pub fn parse_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.keys.parse(token)
    }

    /// リフレッシュトークンを発行
    ///
    /// 256ビットのランダムシークレットを生成し、SHA256ハッシュのみをDBへ
    /// upsert（1ユーザー1トークンの不変条件）。平文はこの戻り値で一度だけ
    /// 返し、以降どこにも保存・出力しない。
    /// 再ログインや更新のたびに旧トークンは上書きで無効になる。
    pub async fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, AppError> {
        let token = generate_refresh_secret();

        let now = OffsetDateTime::now_utc();
        self.refresh_token_repo
            .upsert(
                user_id,
                &hash_token(&token),
                now,
                now + self.refresh_token_ttl,
            )
            .await?;

        Ok(token)
    }

    /// リフレッシュトークンを検証して所有ユーザーIDを返す
    ///
    /// 検証のみでローテーションはしない（ローテーションは
    /// `generate_refresh_token` の呼び出しで明示的に行う）。
    pub async fn validate_refresh_token(&self, token: &str) -> Result<Uuid, AppError> {
        let record = self
            .refresh_token_repo
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or(AppError::RefreshTokenNotFound)?;

        if record.expires_at < OffsetDateTime::now_utc() {
            return Err(AppError::TokenExpired);
        }

        Ok(record.user_id)
    }

    /// ユーザーのリフレッシュトークンを削除（ログアウト）
    ///
    /// 0行削除は `RefreshTokenNotFound`。冪等削除にはしない（不在を報告する）。
    pub async fn delete_refresh_token(&self, user_id: Uuid) -> Result<(), AppError> {
        let deleted = self.refresh_token_repo.delete_by_user_id(user_id).await?;

        if deleted == 0 {
            return Err(AppError::RefreshTokenNotFound);
        }

        Ok(())
    }
}

/// リフレッシュトークンの平文シークレットを生成
///
/// CSPRNGの256ビットをbase64url（パディングなし）で符号化する。
fn generate_refresh_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// リフレッシュトークンをSHA256でハッシュ化
///
/// トークンは高エントロピーなので高速ハッシュで足りる
/// （パスワードと違い argon2 は不要）
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    // テスト専用の2048ビットRSA鍵ペア（本番では使用しないこと）
    const TEST_PRIVATE_PEM: &[u8] = include_bytes!("../../testdata/test_rsa_key.pem");
    const TEST_PUBLIC_PEM: &[u8] = include_bytes!("../../testdata/test_rsa_key.pub.pem");
    // 「別の鍵で署名されたトークン」検証用
    const OTHER_PRIVATE_PEM: &[u8] = include_bytes!("../../testdata/other_rsa_key.pem");

    fn test_keys() -> AccessTokenKeys {
        AccessTokenKeys::from_pem(TEST_PRIVATE_PEM, TEST_PUBLIC_PEM).unwrap()
    }

    fn claims_with_ttl(ttl_secs: i64) -> AccessClaims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        AccessClaims {
            sub: Uuid::new_v4(),
            role: Role::User,
            iat: now,
            nbf: now,
            exp: now + ttl_secs,
        }
    }

    #[test]
    fn test_sign_parse_round_trip() {
        let keys = test_keys();
        let claims = claims_with_ttl(900);

        let token = keys.sign(&claims).unwrap();
        let parsed = keys.parse(&token).unwrap();

        assert_eq!(parsed.sub, claims.sub);
        assert_eq!(parsed.role, Role::User);
        assert_eq!(parsed.exp, claims.exp);
    }

    #[test]
    fn test_parse_rejects_expired_token() {
        let keys = test_keys();
        let mut claims = claims_with_ttl(-60);
        claims.nbf -= 120;
        claims.iat -= 120;

        let token = keys.sign(&claims).unwrap();
        let err = keys.parse(&token).unwrap_err();

        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn test_parse_rejects_not_yet_valid_token() {
        let keys = test_keys();
        let mut claims = claims_with_ttl(3600);
        claims.nbf += 1800;

        let token = keys.sign(&claims).unwrap();
        let err = keys.parse(&token).unwrap_err();

        assert!(matches!(err, AppError::TokenNotYetValid));
    }

    #[test]
    fn test_parse_rejects_token_signed_with_other_key() {
        let other = AccessTokenKeys::from_pem(OTHER_PRIVATE_PEM, TEST_PUBLIC_PEM).unwrap();
        let keys = test_keys();

        let token = other.sign(&claims_with_ttl(900)).unwrap();
        let err = keys.parse(&token).unwrap_err();

        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_parse_rejects_wrong_algorithm() {
        // HS256で署名されたトークンはアルゴリズム混同攻撃として拒否
        let keys = test_keys();
        let claims = claims_with_ttl(900);
        let hs_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let err = keys.parse(&hs_token).unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let keys = test_keys();
        let err = keys.parse("not.a.token").unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[test]
    fn test_from_pem_rejects_non_rsa_material() {
        let result = AccessTokenKeys::from_pem(b"not a pem", TEST_PUBLIC_PEM);
        assert!(matches!(result, Err(AppError::KeyLoad(_))));
    }

    #[test]
    fn test_generate_refresh_secret_is_unique() {
        let a = generate_refresh_secret();
        let b = generate_refresh_secret();

        assert_ne!(a, b);
        // 32バイトのbase64url（パディングなし）は43文字
        assert_eq!(a.len(), 43);
        assert!(!a.contains(['+', '/', '=']));
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let hash = hash_token("some-refresh-token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // 同じ入力には同じハッシュ（検索キーとして機能すること）
        assert_eq!(hash, hash_token("some-refresh-token"));
    }
}
