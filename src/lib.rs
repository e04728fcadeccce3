//! rANS entropy codecs for the CRAM sequencing file format.
//!
//! Two wire variants are provided: the CRAM 3.0 `4x8` codec (byte-wise
//! renormalization, four interleaved states) and the CRAM 3.1 `Nx16` codec
//! (16-bit renormalization, 4 or 32 states, with optional bit-packing,
//! run-length, and striping transforms around the entropy layer). Both
//! support order-0 and order-1 context modelling and are bit-exact with
//! their specifications: any conforming decoder reads what
//! [`compress_4x8`] and [`compress_nx16`] write.
//!
//! Inputs and outputs are plain byte buffers. Container framing, block
//! slicing, and I/O belong to the caller; a compress or uncompress call is
//! a pure function of its arguments.
//!
//! ```
//! use cram_rans::{compress_nx16, uncompress_nx16, Flags};
//!
//! let frame = compress_nx16(b"GATTACA", Flags::ORDER)?;
//! assert_eq!(uncompress_nx16(&frame, None)?, b"GATTACA");
//! # Ok::<(), cram_rans::Error>(())
//! ```

#![forbid(unsafe_code)]
#![forbid(trivial_numeric_casts)]
#![deny(unused_qualifications)]
#![forbid(unused_results)]
#![forbid(unreachable_pub)]
#![forbid(deprecated_in_future)]

mod error;
mod flags;
mod freq;
mod num;
mod pack;
mod rans4x8;
mod ransnx16;
mod rle;
mod stripe;
mod symbol;

pub use error::{Error, Result};
pub use flags::Flags;
pub use rans4x8::{compress_4x8, uncompress_4x8, Order};
pub use ransnx16::{compress_nx16, uncompress_nx16};
