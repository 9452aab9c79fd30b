use bytes::{Buf, BufMut};

/// Fixed-width codec for the keys and values stored in bucket pages.
///
/// Bucket capacity is derived from `SIZE`, so `encode` must write exactly
/// `SIZE` bytes and `decode` must consume exactly as many. Multi-byte
/// fields are native-endian; the on-page format is process-local.
pub trait Storable: Clone {
    const SIZE: usize;

    fn encode(&self, buf: &mut impl BufMut);
    fn decode(buf: &mut impl Buf) -> Self;
}

impl Storable for i32 {
    const SIZE: usize = 4;

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_i32_ne(*self);
    }

    fn decode(buf: &mut impl Buf) -> Self {
        buf.get_i32_ne()
    }
}

impl Storable for u32 {
    const SIZE: usize = 4;

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u32_ne(*self);
    }

    fn decode(buf: &mut impl Buf) -> Self {
        buf.get_u32_ne()
    }
}

impl Storable for i64 {
    const SIZE: usize = 8;

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_i64_ne(*self);
    }

    fn decode(buf: &mut impl Buf) -> Self {
        buf.get_i64_ne()
    }
}

impl Storable for u64 {
    const SIZE: usize = 8;

    fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u64_ne(*self);
    }

    fn decode(buf: &mut impl Buf) -> Self {
        buf.get_u64_ne()
    }
}
