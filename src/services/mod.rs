pub mod auth;
pub mod email;
pub mod otp;
pub mod token;

pub use auth::AuthService;
pub use email::EmailService;
pub use otp::OtpService;
pub use token::TokenManager;
