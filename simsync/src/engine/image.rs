/// Number of bits used to store the image flag of a single axis
const IMGBITS: u32 = 10;
/// Offset added to every image flag before packing, so that negative flags
/// can be stored in unsigned bit fields
const IMGMAX: i32 = 1 << (IMGBITS - 1);
const IMGMASK: i32 = (1 << IMGBITS) - 1;

/// Image flags of a single atom, packed in a single 32-bit integer the way
/// simulation engines usually store them: 10 bits per axis, with `x` in the
/// lowest bits and `z` in the highest ones.
///
/// Each flag counts how many times the atom crossed the periodic boundary
/// along the corresponding axis, and is representable in `[-512, 511]`. Values
/// outside of this range wrap around.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedImage(i32);

impl PackedImage {
    /// Pack the given per-axis image flags
    pub fn new(flags: [i32; 3]) -> PackedImage {
        let x = flags[0].wrapping_add(IMGMAX) & IMGMASK;
        let y = flags[1].wrapping_add(IMGMAX) & IMGMASK;
        let z = flags[2].wrapping_add(IMGMAX) & IMGMASK;
        PackedImage((z << (2 * IMGBITS)) | (y << IMGBITS) | x)
    }

    /// Use an already packed value, as stored by a simulation engine
    pub fn from_raw(value: i32) -> PackedImage {
        PackedImage(value)
    }

    /// Get the packed value
    pub fn raw(self) -> i32 {
        self.0
    }

    /// Get the per-axis image flags
    pub fn unpack(self) -> [i32; 3] {
        [
            (self.0 & IMGMASK) - IMGMAX,
            ((self.0 >> IMGBITS) & IMGMASK) - IMGMAX,
            (self.0 >> (2 * IMGBITS)) - IMGMAX,
        ]
    }
}

impl Default for PackedImage {
    fn default() -> PackedImage {
        PackedImage::new([0, 0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_flags() {
        let image = PackedImage::default();
        assert_eq!(image.raw(), (512 << 20) | (512 << 10) | 512);
        assert_eq!(image.unpack(), [0, 0, 0]);
    }

    #[test]
    fn pack_unpack() {
        for flags in [[1, -1, 0], [-512, 511, 3], [7, 0, -200]] {
            assert_eq!(PackedImage::new(flags).unpack(), flags);
        }

        let image = PackedImage::from_raw(PackedImage::new([2, -3, 4]).raw());
        assert_eq!(image.unpack(), [2, -3, 4]);
    }

    #[test]
    fn overflow_wraps() {
        assert_eq!(PackedImage::new([512, 0, 0]).unpack(), [-512, 0, 0]);
        assert_eq!(PackedImage::new([0, -513, 0]).unpack(), [0, 511, 0]);

        // the offset does not overflow for extreme flags
        let image = PackedImage::new([i32::MAX, i32::MIN, 1024]);
        assert_eq!(image.unpack(), [-1, 0, 0]);
    }
}
