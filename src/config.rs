use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // アクセストークン署名鍵（PEM形式のRSA鍵ペア、起動時に一度だけ読み込む）
    pub access_token_private_key_path: String,
    pub access_token_public_key_path: String,

    // トークン有効期限
    /// アクセストークンの有効期限（分）。発行後の失効は不可能なため短く保つ
    #[serde(default = "default_access_token_ttl_mins")]
    pub access_token_ttl_mins: i64,
    /// リフレッシュトークンの有効期限（日）。サーバー側で失効可能
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    /// OTPの有効期限（分）
    #[serde(default = "default_otp_ttl_mins")]
    pub otp_ttl_mins: i64,

    // SMTP設定（オプション - 未設定時はログ出力のみの開発モード）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,
    #[serde(default)]
    pub smtp_from_address: Option<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_ACCESS_TOKEN_TTL_MINS: i64 = 15;
const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 7;
const DEFAULT_OTP_TTL_MINS: i64 = 10;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

fn default_access_token_ttl_mins() -> i64 {
    DEFAULT_ACCESS_TOKEN_TTL_MINS
}

fn default_refresh_token_ttl_days() -> i64 {
    DEFAULT_REFRESH_TOKEN_TTL_DAYS
}

fn default_otp_ttl_mins() -> i64 {
    DEFAULT_OTP_TTL_MINS
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }
}
