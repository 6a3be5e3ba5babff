pub mod hotel;
pub mod otp_token;
pub mod refresh_token;
pub mod user;

pub use hotel::HotelRepository;
pub use otp_token::OtpTokenRepository;
pub use refresh_token::RefreshTokenRepository;
pub use user::UserRepository;
