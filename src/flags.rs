use bitflags::bitflags;

bitflags! {
    /// Format flags carried in the first byte of an Nx16 frame.
    ///
    /// Bit 1 is reserved and must be zero; [`Flags::from_bits`] rejects it
    /// on decode and [`crate::compress_nx16`] rejects it on encode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        /// Order-1 context modelling instead of order-0.
        const ORDER = 0x01;
        /// Interleave 32 rANS states instead of 4.
        const X32 = 0x04;
        /// The input is byte-striped into independently compressed
        /// sub-streams. Decode-only.
        const STRIPE = 0x08;
        /// The uncompressed size is not recorded; the caller supplies it.
        const NO_SIZE = 0x10;
        /// The payload is the input stored verbatim, no entropy coding.
        const CAT = 0x20;
        /// Run-length encode ahead of the entropy layer.
        const RLE = 0x40;
        /// Bit-pack ahead of the entropy layer.
        const PACK = 0x80;
    }
}

impl Flags {
    /// Number of interleaved rANS states this frame codes with.
    pub(crate) fn interleave(self) -> usize {
        if self.contains(Flags::X32) {
            32
        } else {
            4
        }
    }
}
