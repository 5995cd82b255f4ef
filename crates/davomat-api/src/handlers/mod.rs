//! API request handlers.

pub mod academic;
pub mod health;
pub mod session;

pub use academic::*;
pub use health::*;
pub use session::*;
