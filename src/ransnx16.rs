//! The CRAM 3.1 Nx16 rANS codec: 16-bit renormalization against a 2^15
//! lower bound, four or thirty-two interleaved states, and the optional
//! PACK/RLE/STRIPE wrappers around the entropy layer.

use crate::error::{Error, Result};
use crate::flags::Flags;
use crate::freq::{self, ALPHABET, SCALE_BITS};
use crate::num::{flush_states_and_reverse, write_uint7, ByteCursor};
use crate::symbol::{DecSymbol, EncSymbol};
use crate::{pack, rle, stripe};

/// Lower bound of the normalization interval.
const RANS_WORD_L: u32 = 1 << 15;

const RESERVED_FLAG_BITS: u8 = 0x02;

/// A single Nx16 rANS state.
#[derive(Clone, Copy)]
struct RansState(u32);

impl RansState {
    #[inline]
    fn new_encoder() -> Self {
        RansState(RANS_WORD_L)
    }

    #[inline]
    fn new_decoder(source: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(RansState(source.u32_le()?))
    }

    /// Encodes one symbol, spilling 16 bits at a time into the
    /// reverse-order buffer. High byte first: the final reversal leaves
    /// each pair little-endian on the wire.
    #[inline]
    fn put(&mut self, out: &mut Vec<u8>, sym: &EncSymbol) {
        debug_assert!(sym.x_max > 0);
        let mut x = self.0;
        while x >= sym.x_max {
            out.push((x >> 8) as u8);
            out.push(x as u8);
            x >>= 16;
        }
        self.0 = sym.advance(x);
    }

    /// Slot within the coding interval.
    #[inline]
    fn slot(&self, bits: u32) -> u32 {
        self.0 & ((1 << bits) - 1)
    }

    /// The `D(x)` step followed by at most one 16-bit pull; one pull always
    /// restores the lower bound.
    #[inline]
    fn advance(&mut self, source: &mut ByteCursor<'_>, sym: DecSymbol, bits: u32) -> Result<()> {
        let slot = self.slot(bits);
        let mut x = sym
            .freq
            .wrapping_mul(self.0 >> bits)
            .wrapping_add(slot)
            .wrapping_sub(sym.start);
        if x < RANS_WORD_L {
            x = (x << 16) | u32::from(source.u16_le()?);
        }
        self.0 = x;
        Ok(())
    }
}

/// Compresses `src` into an Nx16 frame governed by `flags`.
///
/// The STRIPE transform is decode-only and is rejected here, as is a flags
/// byte with the reserved bit set. An empty input yields an empty frame.
pub fn compress_nx16(src: &[u8], flags: Flags) -> Result<Vec<u8>> {
    if flags.bits() & RESERVED_FLAG_BITS != 0 {
        return Err(Error::UnsupportedFlag("reserved flag bit set"));
    }
    if flags.contains(Flags::STRIPE) {
        return Err(Error::UnsupportedFlag("stripe is decode-only"));
    }
    if src.is_empty() {
        return Ok(Vec::new());
    }
    let src_len = u32::try_from(src.len()).map_err(|_| Error::MalformedFrame {
        reason: "input longer than u32::MAX",
        offset: 0,
    })?;

    let mut flags = flags;
    let mut dst = Vec::with_capacity(compress_bound(src.len()));
    dst.push(flags.bits());
    if !flags.contains(Flags::NO_SIZE) {
        write_uint7(&mut dst, src_len);
    }

    let mut data = src.to_vec();

    let mut pack_meta = None;
    if flags.contains(Flags::PACK) {
        match pack::encode(&data) {
            Some((meta, packed)) => {
                pack_meta = Some(meta);
                data = packed;
            }
            None => {
                // too many distinct values: unset the bit already written
                flags.remove(Flags::PACK);
                dst[0] = flags.bits();
            }
        }
    }

    let n = flags.interleave();

    let mut rle_header = None;
    if flags.contains(Flags::RLE) {
        let (header, literals) = rle::encode(&data, n)?;
        rle_header = Some(header);
        data = literals;
    }

    if let Some(meta) = pack_meta {
        dst.extend_from_slice(&meta);
    }
    if let Some(header) = rle_header {
        dst.extend_from_slice(&header);
    }

    if flags.contains(Flags::CAT) {
        dst.extend_from_slice(&data);
    } else if !data.is_empty() {
        // a transform chain can reduce the payload to nothing (pack with
        // one distinct value); zero coded bytes means zero written bytes,
        // mirroring the decoder's zero-length shortcut
        if flags.contains(Flags::ORDER) {
            encode_order_1(&data, n, &mut dst)?;
        } else {
            encode_order_0(&data, n, &mut dst)?;
        }
    }

    Ok(dst)
}

/// Decompresses one Nx16 frame. `len` supplies the uncompressed size when
/// the frame was written with [`Flags::NO_SIZE`]; it is ignored otherwise.
pub fn uncompress_nx16(src: &[u8], len: Option<usize>) -> Result<Vec<u8>> {
    if src.is_empty() {
        return Ok(Vec::new());
    }

    let mut cur = ByteCursor::new(src);
    let flags = Flags::from_bits(cur.u8()?)
        .ok_or(Error::UnsupportedFlag("reserved flag bit set"))?;

    let mut out_len = if flags.contains(Flags::NO_SIZE) {
        len.ok_or(cur.malformed("frame has no stored size and none was supplied"))?
    } else {
        cur.uint7()? as usize
    };

    if flags.contains(Flags::STRIPE) {
        return stripe::decode(&mut cur, out_len);
    }

    let n = flags.interleave();

    let mut pack_meta = None;
    let mut unpacked_len = 0;
    if flags.contains(Flags::PACK) {
        let (symbols, packed_len) = pack::read_meta(&mut cur)?;
        pack_meta = Some(symbols);
        unpacked_len = out_len;
        out_len = packed_len;
    }

    let mut rle_meta = None;
    let mut expanded_len = 0;
    if flags.contains(Flags::RLE) {
        let (meta, literal_len) = rle::read_meta(&mut cur, n)?;
        rle_meta = Some(meta);
        expanded_len = out_len;
        out_len = literal_len;
    }

    let mut data = if flags.contains(Flags::CAT) {
        cur.take(out_len)?.to_vec()
    } else if flags.contains(Flags::ORDER) {
        decode_order_1(&mut cur, out_len, n)?
    } else {
        decode_order_0(&mut cur, out_len, n)?
    };

    if let Some(meta) = rle_meta {
        data = rle::expand(&data, &meta, expanded_len)?;
    }
    if let Some(symbols) = pack_meta {
        data = pack::expand(&data, &symbols, unpacked_len)?;
    }

    Ok(data)
}

/// Worst case frame size: the payload can exceed the input slightly, and an
/// order-1 table has up to 257*257 three-byte entries.
fn compress_bound(len: usize) -> usize {
    len + len / 20 + 257 * 257 * 3 + 9
}

/// Bare order-0 layer (frequency table then payload, no frame byte) over a
/// non-empty input. Also serves the RLE meta stream and the order-1 table
/// compressor.
///
/// The table is stored under a reduced denominator chosen from the input
/// size; coding happens at the full scale after the same doubling the
/// decoder applies.
pub(crate) fn encode_order_0(src: &[u8], n: usize, dst: &mut Vec<u8>) -> Result<()> {
    let raw = freq::histogram(src);
    let stored = freq::normalize(&raw, freq::stored_bits(src.len()))?;
    write_alphabet(dst, &stored);
    for &f in stored.iter() {
        if f > 0 {
            write_uint7(dst, f);
        }
    }

    let mut coding = stored;
    freq::rescale(&mut coding, SCALE_BITS);
    let cum = freq::cumulative(&coding);

    let mut syms = [EncSymbol::default(); ALPHABET];
    for (i, s) in syms.iter_mut().enumerate() {
        if coding[i] > 0 {
            *s = EncSymbol::new(cum[i], coding[i], SCALE_BITS);
        }
    }

    let mut states = vec![RansState::new_encoder(); n];
    let mut buf = Vec::with_capacity(src.len() + 4 * n);
    for (i, &b) in src.iter().enumerate().rev() {
        states[i % n].put(&mut buf, &syms[usize::from(b)]);
    }

    let words: Vec<u32> = states.iter().map(|s| s.0).collect();
    flush_states_and_reverse(&mut buf, &words);
    dst.extend_from_slice(&buf);
    Ok(())
}

/// Bare order-0 decode of `out_len` bytes. A zero-length payload carries no
/// table or states and reads nothing.
pub(crate) fn decode_order_0(cur: &mut ByteCursor<'_>, out_len: usize, n: usize) -> Result<Vec<u8>> {
    if out_len == 0 {
        return Ok(Vec::new());
    }

    let freqs = read_frequencies_0(cur)?;
    let cum = freq::cumulative(&freqs);
    let mut slots = vec![0u8; 1 << SCALE_BITS];
    freq::slot_symbols(&cum, &mut slots);

    let mut dec = [DecSymbol::default(); ALPHABET];
    for (i, d) in dec.iter_mut().enumerate() {
        *d = DecSymbol {
            start: cum[i],
            freq: freqs[i],
        };
    }

    let mut states = Vec::with_capacity(n);
    for _ in 0..n {
        states.push(RansState::new_decoder(cur)?);
    }

    let mut dst = vec![0u8; out_len];
    for (i, d) in dst.iter_mut().enumerate() {
        let state = &mut states[i % n];
        let sym = slots[state.slot(SCALE_BITS) as usize];
        *d = sym;
        state.advance(cur, dec[usize::from(sym)], SCALE_BITS)?;
    }
    Ok(dst)
}

fn encode_order_1(src: &[u8], n: usize, dst: &mut Vec<u8>) -> Result<()> {
    let raw = freq::histogram_o1(src, n);

    let mut norm = vec![[0u32; ALPHABET]; ALPHABET];
    for (ctx, row) in raw.iter().enumerate() {
        if row.iter().any(|&f| f > 0) {
            norm[ctx] = freq::normalize(row, SCALE_BITS)?;
        }
    }

    // the table indexes rows and columns by the same alphabet: every
    // symbol in the input, plus the implicit zero context
    let mut present = [false; ALPHABET];
    present[0] = true;
    for &b in src {
        present[usize::from(b)] = true;
    }

    // high nibble: coding shift; low bit clear: table stored plain
    dst.push((SCALE_BITS << 4) as u8);
    write_frequencies_1(dst, &norm, &present);

    let mut syms = vec![[EncSymbol::default(); ALPHABET]; ALPHABET];
    for ctx in 0..ALPHABET {
        let row = &norm[ctx];
        if row.iter().all(|&f| f == 0) {
            continue;
        }
        let cum = freq::cumulative(row);
        for s in 0..ALPHABET {
            if row[s] > 0 {
                syms[ctx][s] = EncSymbol::new(cum[s], row[s], SCALE_BITS);
            }
        }
    }

    let q = src.len() / n;
    let mut states = vec![RansState::new_encoder(); n];
    let mut buf = Vec::with_capacity(src.len() + 4 * n);

    // the tail past the last full slice belongs to the last state and is
    // encoded first; the decoder reads it last
    for p in (n * q..src.len()).rev() {
        let ctx = if p == (n - 1) * q {
            0
        } else {
            usize::from(src[p - 1])
        };
        states[n - 1].put(&mut buf, &syms[ctx][usize::from(src[p])]);
    }

    for i in (0..q).rev() {
        for j in (0..n).rev() {
            let p = j * q + i;
            let ctx = if i == 0 { 0 } else { usize::from(src[p - 1]) };
            states[j].put(&mut buf, &syms[ctx][usize::from(src[p])]);
        }
    }

    let words: Vec<u32> = states.iter().map(|s| s.0).collect();
    flush_states_and_reverse(&mut buf, &words);
    dst.extend_from_slice(&buf);
    Ok(())
}

fn decode_order_1(cur: &mut ByteCursor<'_>, out_len: usize, n: usize) -> Result<Vec<u8>> {
    if out_len == 0 {
        return Ok(Vec::new());
    }

    let comp = cur.u8()?;
    let bits = u32::from(comp >> 4);
    if bits == 0 || bits > SCALE_BITS {
        return Err(cur.invalid_table("order-1 shift out of range"));
    }

    let mut freqs = vec![[0u32; ALPHABET]; ALPHABET];
    if comp & 0x01 != 0 {
        // the table itself travels order-0 compressed, always at N = 4
        let table_len = cur.uint7()? as usize;
        let comp_len = cur.uint7()? as usize;
        let mut inner = ByteCursor::new(cur.take(comp_len)?);
        let table = decode_order_0(&mut inner, table_len, 4)?;
        read_frequencies_1(&mut ByteCursor::new(&table), &mut freqs, bits)?;
    } else {
        read_frequencies_1(cur, &mut freqs, bits)?;
    }

    let mut dec = vec![[DecSymbol::default(); ALPHABET]; ALPHABET];
    let mut slots = vec![vec![0u8; 1 << bits]; ALPHABET];
    for ctx in 0..ALPHABET {
        let row = &freqs[ctx];
        let total: u32 = row.iter().sum();
        if total == 0 {
            continue;
        }
        if total != 1 << bits {
            return Err(cur.invalid_table("order-1 row does not sum to the denominator"));
        }
        let cum = freq::cumulative(row);
        freq::slot_symbols(&cum, &mut slots[ctx]);
        for s in 0..ALPHABET {
            dec[ctx][s] = DecSymbol {
                start: cum[s],
                freq: row[s],
            };
        }
    }

    let mut states = Vec::with_capacity(n);
    for _ in 0..n {
        states.push(RansState::new_decoder(cur)?);
    }

    let mut dst = vec![0u8; out_len];
    let mut last = vec![0usize; n];
    let q = out_len / n;

    for i in 0..q {
        for j in 0..n {
            let state = &mut states[j];
            let sym = slots[last[j]][state.slot(bits) as usize];
            let ds = dec[last[j]][usize::from(sym)];
            if ds.freq == 0 {
                return Err(cur.invalid_table("referenced symbol has zero frequency"));
            }
            dst[j * q + i] = sym;
            state.advance(cur, ds, bits)?;
            last[j] = usize::from(sym);
        }
    }

    let m = n - 1;
    for i in n * q..out_len {
        let state = &mut states[m];
        let sym = slots[last[m]][state.slot(bits) as usize];
        let ds = dec[last[m]][usize::from(sym)];
        if ds.freq == 0 {
            return Err(cur.invalid_table("referenced symbol has zero frequency"));
        }
        dst[i] = sym;
        state.advance(cur, ds, bits)?;
        last[m] = usize::from(sym);
    }

    Ok(dst)
}

/// Writes the set of present symbols: each listed once, ascending, with
/// consecutive runs collapsed to a first symbol plus a count, terminated by
/// a zero byte.
fn write_alphabet(dst: &mut Vec<u8>, freqs: &[u32; ALPHABET]) {
    let mut rle = 0;
    for (sym, &f) in freqs.iter().enumerate() {
        if f == 0 {
            continue;
        }
        if rle > 0 {
            rle -= 1;
        } else {
            dst.push(sym as u8);
            if sym > 0 && freqs[sym - 1] > 0 {
                rle = freqs[sym + 1..]
                    .iter()
                    .position(|&g| g == 0)
                    .unwrap_or(ALPHABET - 1 - sym);
                dst.push(rle as u8);
            }
        }
    }
    dst.push(0x00);
}

fn read_alphabet(cur: &mut ByteCursor<'_>) -> Result<[bool; ALPHABET]> {
    let mut alphabet = [false; ALPHABET];
    let mut sym = usize::from(cur.u8()?);
    let mut last_sym = sym;
    let mut rle = 0u32;

    loop {
        alphabet[sym] = true;
        if rle > 0 {
            rle -= 1;
            sym += 1;
            if sym >= ALPHABET {
                return Err(cur.invalid_table("alphabet run past the last symbol"));
            }
        } else {
            sym = usize::from(cur.u8()?);
            if sym == last_sym + 1 {
                rle = u32::from(cur.u8()?);
            }
        }
        last_sym = sym;
        if sym == 0 {
            break;
        }
    }

    Ok(alphabet)
}

/// Reads an order-0 table: alphabet, then one uint7 per present symbol,
/// re-normalized up to the coding scale.
fn read_frequencies_0(cur: &mut ByteCursor<'_>) -> Result<[u32; ALPHABET]> {
    let alphabet = read_alphabet(cur)?;
    let mut freqs = [0u32; ALPHABET];
    for (sym, &present) in alphabet.iter().enumerate() {
        if present {
            freqs[sym] = cur.uint7()?;
        }
    }
    freq::rescale(&mut freqs, SCALE_BITS);
    freq::check_sum(&freqs, SCALE_BITS, cur.pos())?;
    Ok(freqs)
}

/// Writes the order-1 table: the alphabet once, then every alphabet row
/// with explicit zeros carrying a count of the additional zero columns that
/// follow.
fn write_frequencies_1(
    dst: &mut Vec<u8>,
    freqs: &[[u32; ALPHABET]],
    present: &[bool; ALPHABET],
) {
    let mut marginal = [0u32; ALPHABET];
    for (sym, &p) in present.iter().enumerate() {
        marginal[sym] = u32::from(p);
    }
    write_alphabet(dst, &marginal);

    let cols: Vec<usize> = (0..ALPHABET).filter(|&s| present[s]).collect();
    for &ctx in &cols {
        let mut i = 0;
        while i < cols.len() {
            let f = freqs[ctx][cols[i]];
            write_uint7(dst, f);
            if f == 0 {
                // cap the run where a single byte and a uint7 agree
                let mut run = 0;
                while run < 127 && i + 1 + run < cols.len() && freqs[ctx][cols[i + 1 + run]] == 0 {
                    run += 1;
                }
                dst.push(run as u8);
                i += run;
            }
            i += 1;
        }
    }
}

fn read_frequencies_1(
    cur: &mut ByteCursor<'_>,
    freqs: &mut [[u32; ALPHABET]],
    bits: u32,
) -> Result<()> {
    let alphabet = read_alphabet(cur)?;

    for i in 0..ALPHABET {
        if !alphabet[i] {
            continue;
        }
        let mut run = 0u32;
        for j in 0..ALPHABET {
            if !alphabet[j] {
                continue;
            }
            if run > 0 {
                run -= 1;
            } else {
                let f = cur.uint7()?;
                freqs[i][j] = f;
                if f == 0 {
                    run = u32::from(cur.u8()?);
                }
            }
        }
        freq::rescale(&mut freqs[i], bits);
    }

    Ok(())
}
