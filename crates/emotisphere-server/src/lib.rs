//! HTTP server for the Emotisphere live emotion map.
//!
//! Exposes the subscriber `WebSocket` and a thin operator control surface
//! over the pipeline scheduler:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/ws` | Subscriber `WebSocket` (envelope stream) |
//! | `GET` | `/health` | Liveness probe |
//! | `POST` | `/start` | Start scheduled processing |
//! | `POST` | `/stop` | Stop scheduled processing |
//! | `GET` | `/status` | Scheduler state and subscriber count |

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
