//! Integration tests for fragmentation over an in-memory transport.
//!
//! Frames are written through a [`ReliableFrameCodec`] on one end of a
//! `tokio::io::duplex` pipe and read back through another codec instance on
//! the other end.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use reframe::{
    Error,
    byte_order::write_network_u24,
    Fragmenter,
    ReliableFrameCodec,
    ReassemblyError,
    frame::{self, Flags, Frame, FrameHeader, FrameType, StreamId},
};
use reframe_testing::{patterned, request};
use rstest::rstest;
use tokio::{io::AsyncWriteExt, time::timeout};
use tokio_util::codec::{Framed, FramedRead};

mod common;
use common::{TestResult, fragmentation_config};

#[rstest]
#[case::fits(64, request(1, None, 20))]
#[case::data_only(64, request(3, None, 1_000))]
#[case::metadata_and_data(80, request(5, Some(300), 700))]
#[case::empty_metadata(64, request(7, Some(0), 500))]
#[tokio::test]
async fn frames_survive_the_transport(
    #[case] max_fragment_size: usize,
    #[case] frame: Frame,
) -> TestResult {
    let config = fragmentation_config(max_fragment_size)?;
    let (client, server) = tokio::io::duplex(4096);
    let mut writer = Framed::new(client, ReliableFrameCodec::new(&config));
    let mut reader = Framed::new(server, ReliableFrameCodec::new(&config));

    let sent = frame.clone();
    let send = tokio::spawn(async move {
        writer.send(sent).await?;
        writer.close().await?;
        Ok::<_, Error>(())
    });

    let received = timeout(Duration::from_secs(5), reader.next())
        .await?
        .ok_or("stream ended before a frame arrived")??;
    send.await??;
    assert_eq!(received, frame);
    assert!(reader.next().await.is_none());
    Ok(())
}

#[rstest]
#[tokio::test]
async fn interleaved_streams_reassemble_independently() -> TestResult {
    let config = fragmentation_config(64)?;
    let fragmenter = Fragmenter::from_config(&config);

    let a = request(1, Some(40), 200);
    let b = request(2, None, 150);
    let fragments_a: Vec<_> = fragmenter.fragment(a.clone()).collect();
    let fragments_b: Vec<_> = fragmenter.fragment(b.clone()).collect();

    // Alternate fragments of the two streams on the wire.
    let mut wire = Vec::new();
    let mut iter_a = fragments_a.iter();
    let mut iter_b = fragments_b.iter();
    loop {
        let (next_a, next_b) = (iter_a.next(), iter_b.next());
        if next_a.is_none() && next_b.is_none() {
            break;
        }
        for fragment in next_a.into_iter().chain(next_b) {
            let encoded = frame::encode(fragment)?;
            wire.extend_from_slice(&write_network_u24(u32::try_from(encoded.len())?));
            wire.extend_from_slice(&encoded);
        }
    }

    let (mut client, server) = tokio::io::duplex(8192);
    client.write_all(&wire).await?;
    drop(client);

    let mut reader = FramedRead::new(server, ReliableFrameCodec::new(&config));
    let mut received = Vec::new();
    while let Some(frame) = reader.next().await {
        received.push(frame?);
    }
    received.sort_by_key(|frame| frame.stream_id());
    assert_eq!(received, vec![a, b]);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn stray_continuation_terminates_the_stream() -> TestResult {
    let config = fragmentation_config(64)?;
    let continuation = Frame::new(
        FrameHeader::continuation(StreamId::new(9), false, false),
        None,
        patterned(10),
    );
    let encoded = frame::encode(&continuation)?;
    let mut wire = write_network_u24(u32::try_from(encoded.len())?).to_vec();
    wire.extend_from_slice(&encoded);

    let (mut client, server) = tokio::io::duplex(1024);
    client.write_all(&wire).await?;
    drop(client);

    let mut reader = FramedRead::new(server, ReliableFrameCodec::new(&config));
    let err = reader
        .next()
        .await
        .ok_or("expected an error item")?
        .expect_err("continuation without a first fragment");
    assert!(matches!(
        err,
        Error::Reassembly(ReassemblyError::UnexpectedFragment { .. })
    ));
    assert!(err.is_connection_fatal());
    Ok(())
}

#[rstest]
#[tokio::test]
async fn oversized_reassembly_is_rejected() -> TestResult {
    let sender_config = fragmentation_config(64)?;
    let receiver_config = reframe::FragmentationConfig::new(64, 256)?;

    let (client, server) = tokio::io::duplex(8192);
    let mut writer = Framed::new(client, ReliableFrameCodec::new(&sender_config));
    let mut reader = Framed::new(server, ReliableFrameCodec::new(&receiver_config));

    let header = FrameHeader::new(StreamId::new(11), FrameType::RequestStream, Flags::NONE);
    writer
        .send(Frame::new(header, None, Bytes::from(vec![0_u8; 1024])))
        .await?;

    let err = reader
        .next()
        .await
        .ok_or("expected an error item")?
        .expect_err("budget exceeded");
    assert!(matches!(
        err,
        Error::Reassembly(ReassemblyError::FragmentBudgetExceeded { .. })
    ));
    Ok(())
}
