pub mod change_password;
pub mod health;
pub mod hotels;
pub mod login;
pub mod logout;
pub mod password_reset;
pub mod refresh;
pub mod register;

pub use change_password::change_password;
pub use health::health_check;
pub use hotels::{create_hotel, get_hotel, list_hotels};
pub use login::login;
pub use logout::logout;
pub use password_reset::{forgot_password, reset_password, verify_otp};
pub use refresh::refresh;
pub use register::register;

use serde::Serialize;

/// 認証成功時に返すトークンペア
///
/// refresh_token は不透明なランダム文字列（JWTではない）。
/// ここで返した後はサーバー側にハッシュしか残らない。
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}
