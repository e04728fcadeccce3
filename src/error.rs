use thiserror::Error;

/// Failures surfaced by the 4x8 and Nx16 codecs.
///
/// Every failure is fatal for the block being coded: nothing is retried and
/// no partial output is returned. Frame and table failures carry the number
/// of bytes consumed from the buffer being parsed when they were detected;
/// inside a nested stream (a stripe child, a compressed frequency table or
/// run-length blob) the offset is relative to that stream. Failures raised
/// outside a parse, such as encoder-side size limits, carry offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// A declared size disagrees with the buffer bounds, an order byte is
    /// out of range, or a varint runs past the end of the input.
    #[error("malformed frame: {reason} at byte {offset}")]
    MalformedFrame {
        reason: &'static str,
        offset: usize,
    },

    /// A frequency table does not reconstruct to the coding denominator.
    #[error("invalid frequency table: {reason} at byte {offset}")]
    InvalidTable {
        reason: &'static str,
        offset: usize,
    },

    /// A flag combination the format forbids or this build does not encode.
    #[error("unsupported flag: {0}")]
    UnsupportedFlag(&'static str),

    /// A coder invariant failed; unreachable on well-formed tables.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
