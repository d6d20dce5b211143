//! HTTP request handlers.

pub mod health;
pub mod login;
pub mod requests;

pub use health::{health_check, metrics};
pub use login::login;
pub use requests::{act, list, submit};
