//! HTTP transport for the Nebuia API.

pub mod client;
/// Curl rendering for the diagnostic side-channel.
pub mod curl;
pub mod types;

pub use client::Transport;
pub use curl::{CommandLog, render_curl_command};
pub use types::{ApiRequest, Attachment, Origin};
