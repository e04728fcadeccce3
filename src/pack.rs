//! PACK transform: inputs with at most sixteen distinct byte values travel
//! through the entropy layer at 1, 2, or 4 bits per symbol.

use crate::error::{Error, Result};
use crate::num::{write_uint7, ByteCursor};

/// Builds the pack meta (symbol count, symbol list in first-encounter
/// order, packed length) and the packed stream. Returns `None` when the
/// input has more than sixteen distinct values and must travel unpacked.
pub(crate) fn encode(src: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut index = [0u8; 256];
    let mut seen = [false; 256];
    let mut symbols = Vec::new();

    for &b in src {
        if !seen[usize::from(b)] {
            if symbols.len() == 16 {
                return None;
            }
            seen[usize::from(b)] = true;
            index[usize::from(b)] = symbols.len() as u8;
            symbols.push(b);
        }
    }

    let k = symbols.len();
    let packed = if k <= 1 {
        // one value: the length alone reconstructs the input
        Vec::new()
    } else if k == 2 {
        let mut dst = vec![0u8; src.len() / 8 + 1];
        for (d, chunk) in dst.iter_mut().zip(src.chunks(8)) {
            for (shift, &b) in chunk.iter().enumerate() {
                *d |= index[usize::from(b)] << shift;
            }
        }
        dst
    } else if k <= 4 {
        let mut dst = vec![0u8; src.len() / 4 + 1];
        for (d, chunk) in dst.iter_mut().zip(src.chunks(4)) {
            for (shift, &b) in chunk.iter().enumerate() {
                *d |= index[usize::from(b)] << (shift * 2);
            }
        }
        dst
    } else {
        let mut dst = vec![0u8; src.len() / 2 + 1];
        for (d, chunk) in dst.iter_mut().zip(src.chunks(2)) {
            for (shift, &b) in chunk.iter().enumerate() {
                *d |= index[usize::from(b)] << (shift * 4);
            }
        }
        dst
    };

    let mut meta = Vec::with_capacity(k + 6);
    meta.push(k as u8);
    meta.extend_from_slice(&symbols);
    write_uint7(&mut meta, packed.len() as u32);

    Some((meta, packed))
}

/// Reads the pack meta, returning the symbol list and the packed length.
pub(crate) fn read_meta(cur: &mut ByteCursor<'_>) -> Result<(Vec<u8>, usize)> {
    let k = usize::from(cur.u8()?);
    if k == 0 || k > 16 {
        return Err(Error::UnsupportedFlag("pack symbol count out of range"));
    }

    let symbols = cur.take(k)?.to_vec();
    let packed_len = cur.uint7()? as usize;

    Ok((symbols, packed_len))
}

/// Expands a packed stream back to `out_len` bytes. Offsets in the errors
/// are positions within the packed stream.
pub(crate) fn expand(src: &[u8], symbols: &[u8], out_len: usize) -> Result<Vec<u8>> {
    let k = symbols.len();
    let mut dst = vec![0u8; out_len];

    if k == 1 {
        dst.fill(symbols[0]);
        return Ok(dst);
    }

    let (bits, per_byte) = match k {
        2 => (1, 8),
        3 | 4 => (2, 4),
        _ => (4, 2),
    };
    let mask = (1u8 << bits) - 1;

    let needed = (out_len + per_byte - 1) / per_byte;
    if src.len() < needed {
        return Err(Error::MalformedFrame {
            reason: "packed stream shorter than needed",
            offset: src.len(),
        });
    }

    for (i, d) in dst.iter_mut().enumerate() {
        let v = (src[i / per_byte] >> ((i % per_byte) * bits)) & mask;
        *d = *symbols.get(usize::from(v)).ok_or(Error::MalformedFrame {
            reason: "packed index out of range",
            offset: i / per_byte,
        })?;
    }

    Ok(dst)
}
