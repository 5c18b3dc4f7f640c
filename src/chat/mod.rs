//! The relay between a visitor's conversation and the upstream
//! completion provider.

mod relay;
pub use relay::{build_transcript, relay};
