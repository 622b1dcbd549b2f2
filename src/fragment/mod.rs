//! Transparent splitting of oversized frames and their reassembly.
//!
//! [`Fragmenter`] turns one logical [`Frame`](crate::frame::Frame) into an
//! ordered sequence of wire frames no larger than the configured fragment
//! size. [`Reassembler`] accumulates inbound fragments per stream until the
//! terminal fragment arrives and yields the logical frame again.

pub mod config;
pub mod error;
pub mod fragmenter;
pub mod reassembler;

pub use config::{
    DEFAULT_MAX_REASSEMBLY_SIZE,
    DEFAULT_REASSEMBLY_TIMEOUT,
    FragmentationConfig,
    MAX_FRAGMENT_SIZE,
    MIN_FRAGMENT_SIZE,
};
pub use error::{FragmentationError, ReassemblyError, UnexpectedFragmentReason};
pub use fragmenter::{Fragmenter, Fragments};
pub use reassembler::Reassembler;
