//! Command line interface for the `reframe` demonstration binary.
//!
//! Builds a synthetic REQUEST_RESPONSE frame, prints the fragments it is split
//! into, and checks that reassembling them restores the original frame.

use std::io::Write;

use bytes::Bytes;
use clap::Parser;
use reframe::{
    Error,
    fragment::{FragmentationConfig, Fragmenter, Reassembler},
    frame::{Flags, Frame, FrameHeader, FrameType, StreamId},
};

/// Command line arguments for the `reframe` binary.
#[derive(Debug, Parser)]
#[command(
    name = "reframe",
    version,
    about = "Split a synthetic frame into fragments and reassemble it"
)]
pub struct Cli {
    /// Largest encoded fragment in bytes.
    #[arg(long, default_value_t = 64)]
    pub max_fragment_size: usize,
    /// Stream the frame is sent on.
    #[arg(long, default_value_t = 1)]
    pub stream_id: u32,
    /// Metadata bytes to include; zero omits the metadata block.
    #[arg(long, default_value_t = 0)]
    pub metadata_len: usize,
    /// Data bytes to include.
    #[arg(long, default_value_t = 256)]
    pub data_len: usize,
}

/// Fragment and reassemble the frame described by `cli`, reporting to `out`.
///
/// Returns whether the reassembled frame matched the original.
///
/// # Errors
///
/// Returns an error if the fragment size is invalid, the fragments fail to
/// reassemble, or writing to `out` fails.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<bool, Error> {
    let config = FragmentationConfig::new(
        cli.max_fragment_size,
        cli.metadata_len + cli.data_len + cli.max_fragment_size,
    )?;
    let fragmenter = Fragmenter::from_config(&config);
    let reassembler = Reassembler::from_config(&config);

    let header = FrameHeader::new(
        StreamId::new(cli.stream_id),
        FrameType::RequestResponse,
        Flags::NONE,
    );
    let metadata = (cli.metadata_len > 0).then(|| pattern(cli.metadata_len));
    let original = Frame::new(header, metadata, pattern(cli.data_len));

    let mut rebuilt = None;
    for (index, fragment) in fragmenter.fragment(original.clone()).enumerate() {
        writeln!(
            out,
            "#{index} {} metadata={} data={} encoded={}",
            fragment.header(),
            fragment.metadata().map_or(0, Bytes::len),
            fragment.data().len(),
            fragment.encoded_len()
        )?;
        rebuilt = reassembler.on_fragment(fragment)?;
    }

    let matched = rebuilt.as_ref() == Some(&original);
    writeln!(
        out,
        "round trip {}",
        if matched { "matched" } else { "MISMATCHED" }
    )?;
    Ok(matched)
}

fn pattern(len: usize) -> Bytes {
    (0..len)
        .map(|i| u8::try_from(i % 251).unwrap_or_default())
        .collect()
}
