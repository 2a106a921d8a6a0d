//! Writers for integers in network (big-endian) byte order.
//!
//! The caller is responsible for handing in a region of at least the integer width.

pub trait NetworkOrder: Copy {
    const WIDTH: usize;

    /// Writes `self` big-endian into the first `WIDTH` bytes of `out` and returns `WIDTH`.
    fn write_nbo(self, out: &mut [u8]) -> usize;
}

macro_rules! impl_network_order {
    ($ty:ty) => {
        impl NetworkOrder for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn write_nbo(self, out: &mut [u8]) -> usize {
                out[..Self::WIDTH].copy_from_slice(&self.to_be_bytes());
                Self::WIDTH
            }
        }
    };
}

impl_network_order!(i16);
impl_network_order!(u16);
impl_network_order!(i32);
impl_network_order!(u32);
impl_network_order!(i64);
impl_network_order!(u64);

#[inline]
pub fn write_nbo16(value: impl Into<i32>, out: &mut [u8]) -> usize {
    // Only the low 16 bits are kept, so i16 and u16 callers both land here.
    (value.into() as u16).write_nbo(out)
}

#[inline]
pub fn write_nbo32(value: i32, out: &mut [u8]) -> usize {
    value.write_nbo(out)
}

#[inline]
pub fn write_nbo64(value: i64, out: &mut [u8]) -> usize {
    value.write_nbo(out)
}
