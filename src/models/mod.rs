pub mod hotel;
pub mod otp_token;
pub mod refresh_token;
pub mod user;

pub use hotel::{Hotel, HotelFilter, Location};
pub use otp_token::OtpToken;
pub use refresh_token::RefreshToken;
pub use user::{Role, User};
