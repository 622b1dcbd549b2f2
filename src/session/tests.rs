//! Unit tests for resumable sessions and the session registry.

mod manager_tests;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedReceiver;

use super::{ChannelConnection, ConnectionId};
use crate::frame::{Flags, Frame, FrameHeader, FrameType, StreamId, encode};

/// Encode a PAYLOAD frame on `stream` carrying `len` data bytes.
fn payload(stream: u32, len: usize) -> Bytes {
    let header = FrameHeader::new(StreamId::new(stream), FrameType::Payload, Flags::NEXT);
    let data = Bytes::from(vec![u8::try_from(len % 256).unwrap_or(0); len]);
    encode(&Frame::new(header, None, data)).expect("encode payload")
}

/// Encode a connection-level KEEPALIVE frame.
fn keepalive() -> Bytes {
    let header = FrameHeader::new(StreamId::CONNECTION, FrameType::Keepalive, Flags::NONE);
    encode(&Frame::new(header, None, Bytes::from_static(&[0; 8]))).expect("encode keepalive")
}

fn connection(id: u64) -> (Arc<ChannelConnection>, UnboundedReceiver<Bytes>) {
    ChannelConnection::new(ConnectionId::new(id))
}

fn drain(rx: &mut UnboundedReceiver<Bytes>) -> Vec<Bytes> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}
