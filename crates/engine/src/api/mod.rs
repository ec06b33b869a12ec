//! API layer - HTTP entry points.

pub mod http;
pub mod player_session;

pub use http::ApiError;
pub use player_session::PlayerSession;
