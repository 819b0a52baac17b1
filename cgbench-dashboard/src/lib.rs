//! cgbench dashboard server
//!
//! Serves the browser front end, ingests runner events over one
//! WebSocket, and fans live chart frames out to viewer WebSockets.
//! A single tokio task owns the run session; everything else talks to
//! it through channels.

pub mod interval;
pub mod runner;
pub mod server;
pub mod session_loop;

pub use session_loop::{ChartFrame, RunnerEvent, SessionStatus};
