//! Plaza Engine library.
//!
//! Real-time room presence server: clients join small grid rooms over a
//! WebSocket, walk their avatars around, chat, and see each other's moves.
//!
//! ## Structure
//!
//! - `use_cases/` - Room operations over the ports
//! - `infrastructure/` - Ports and their in-process adapters, config
//! - `api/` - HTTP and WebSocket entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
