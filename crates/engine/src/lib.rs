//! Wappen Quiz engine library.
//!
//! Server-side code for the coat of arms quiz.
//!
//! ## Structure
//!
//! - `use_cases/` - dataset cache, image proxy, player store, puzzle engine
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
