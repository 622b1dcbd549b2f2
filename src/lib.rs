#![doc(html_root_url = "https://docs.rs/reframe/latest")]
//! Public API for the `reframe` library.
//!
//! This crate provides the wire-level reliability layer of a multiplexed
//! streaming protocol: transparent fragmentation and reassembly of oversized
//! frames, and resumable sessions that survive the loss of their transport
//! connection.

pub mod byte_order;
pub mod codec;
pub mod config;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod metrics;
pub mod session;

pub use codec::ReliableFrameCodec;
pub use config::{ConfigError, ReliabilityConfig, ReliabilitySettings};
/// Result type alias re-exported for convenience.
pub use error::{Error, Result};
pub use fragment::{
    FragmentationConfig,
    FragmentationError,
    Fragmenter,
    Reassembler,
    ReassemblyError,
};
pub use frame::{Flags, Frame, FrameHeader, FrameType, MalformedFrame, StreamId};
pub use session::{
    ChannelConnection,
    ConnectionId,
    DuplexConnection,
    ResumableSession,
    ResumePosition,
    ResumeToken,
    SessionError,
    SessionManager,
};
