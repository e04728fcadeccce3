//! STRIPE transform: the input interleaved over m sub-streams, each an
//! independent Nx16 frame. Decoding only; the encode path is rejected at
//! the frame level.

use crate::error::{Error, Result};
use crate::flags::Flags;
use crate::num::ByteCursor;
use crate::ransnx16;

pub(crate) fn decode(cur: &mut ByteCursor<'_>, out_len: usize) -> Result<Vec<u8>> {
    let m = usize::from(cur.u8()?);
    if m == 0 {
        return Err(cur.malformed("zero stripe streams"));
    }

    let mut comp_lens = Vec::with_capacity(m);
    for _ in 0..m {
        comp_lens.push(cur.uint7()? as usize);
    }

    // sub-stream j holds the bytes at positions j, j + m, j + 2m, ...; its
    // frame carries NO_SIZE, so the length is passed down from here
    let mut streams = Vec::with_capacity(m);
    for (j, &comp_len) in comp_lens.iter().enumerate() {
        let start = cur.pos();
        let chunk = cur.take(comp_len)?;

        if chunk.first().is_some_and(|&b| b & Flags::STRIPE.bits() != 0) {
            return Err(Error::MalformedFrame {
                reason: "stripe nested inside stripe",
                offset: start,
            });
        }

        let sub_len = (out_len + m - 1 - j) / m;
        let stream = ransnx16::uncompress_nx16(chunk, Some(sub_len))?;
        if stream.len() != sub_len {
            return Err(Error::MalformedFrame {
                reason: "stripe stream has the wrong size",
                offset: start,
            });
        }
        streams.push(stream);
    }

    let mut dst = vec![0u8; out_len];
    for (p, d) in dst.iter_mut().enumerate() {
        *d = streams[p % m][p / m];
    }
    Ok(dst)
}
