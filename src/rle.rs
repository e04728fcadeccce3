//! RLE transform: bytes that mostly occur in runs are written once per run
//! in the literal stream, with their lengths in a side stream.

use crate::error::Result;
use crate::num::{write_uint7, ByteCursor};
use crate::ransnx16;

/// Splits `src` into the run-collapsed literal stream and the serialized
/// RLE header. A byte earns run treatment when its runs of two or more
/// outnumber its isolated occurrences; if nothing qualifies, byte 0 is
/// nominated so the symbol list is never empty. Returns (header, literals).
pub(crate) fn encode(src: &[u8], n: usize) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut runs = [0u32; 256];
    let mut singles = [0u32; 256];
    let mut i = 0;
    while i < src.len() {
        let b = usize::from(src[i]);
        let mut j = i + 1;
        while j < src.len() && src[j] == src[i] {
            j += 1;
        }
        if j - i > 1 {
            runs[b] += 1;
        } else {
            singles[b] += 1;
        }
        i = j;
    }

    let mut worthy: Vec<u8> = (0..=255u8)
        .filter(|&b| runs[usize::from(b)] > singles[usize::from(b)])
        .collect();
    if worthy.is_empty() {
        worthy.push(0);
    }
    let mut is_worthy = [false; 256];
    for &b in &worthy {
        is_worthy[usize::from(b)] = true;
    }

    // meta: symbol count (0 stands for 256), the symbols, then one
    // run_length - 1 varint per run in literal order
    let mut meta = Vec::new();
    meta.push(if worthy.len() == 256 {
        0
    } else {
        worthy.len() as u8
    });
    meta.extend_from_slice(&worthy);

    let mut literals = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        let b = src[i];
        if is_worthy[usize::from(b)] {
            let mut j = i + 1;
            while j < src.len() && src[j] == b {
                j += 1;
            }
            literals.push(b);
            write_uint7(&mut meta, (j - i - 1) as u32);
            i = j;
        } else {
            literals.push(b);
            i += 1;
        }
    }

    let mut header = Vec::new();
    let mut compressed = Vec::new();
    ransnx16::encode_order_0(&meta, n, &mut compressed)?;
    if compressed.len() < meta.len() {
        write_uint7(&mut header, (meta.len() as u32) << 1);
        write_uint7(&mut header, literals.len() as u32);
        write_uint7(&mut header, compressed.len() as u32);
        header.extend_from_slice(&compressed);
    } else {
        write_uint7(&mut header, ((meta.len() as u32) << 1) | 1);
        write_uint7(&mut header, literals.len() as u32);
        header.extend_from_slice(&meta);
    }

    Ok((header, literals))
}

/// Reads the RLE header, returning the meta bytes and the literal length
/// the entropy layer should decode to.
pub(crate) fn read_meta(cur: &mut ByteCursor<'_>, n: usize) -> Result<(Vec<u8>, usize)> {
    let tagged = cur.uint7()?;
    let meta_len = (tagged >> 1) as usize;
    let literal_len = cur.uint7()? as usize;

    let meta = if tagged & 1 == 1 {
        cur.take(meta_len)?.to_vec()
    } else {
        let comp_len = cur.uint7()? as usize;
        let mut inner = ByteCursor::new(cur.take(comp_len)?);
        ransnx16::decode_order_0(&mut inner, meta_len, n)?
    };

    Ok((meta, literal_len))
}

/// Walks the literal stream, reinserting runs, until `out_len` bytes exist.
/// Offsets in the errors are positions within the meta stream.
pub(crate) fn expand(literals: &[u8], meta: &[u8], out_len: usize) -> Result<Vec<u8>> {
    let mut meta = ByteCursor::new(meta);
    let k = match usize::from(meta.u8()?) {
        0 => 256,
        k => k,
    };
    let symbols = meta.take(k)?;

    let mut is_worthy = [false; 256];
    for &b in symbols {
        is_worthy[usize::from(b)] = true;
    }

    let mut dst = Vec::with_capacity(out_len);
    for &b in literals {
        if is_worthy[usize::from(b)] {
            let run = meta.uint7()? as usize + 1;
            if dst.len() + run > out_len {
                return Err(meta.malformed("runs overflow the declared size"));
            }
            dst.resize(dst.len() + run, b);
        } else {
            dst.push(b);
        }
    }

    if dst.len() != out_len {
        return Err(meta.malformed("runs fall short of the declared size"));
    }
    Ok(dst)
}
