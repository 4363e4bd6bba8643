// image.rs — Runtime-sized RGBA image container.
//
// Memory layout: interleaved channel samples in row-major order, four
// samples per pixel, no row padding:
//
//   data index:  0  1  2  3   4  5  6  7   8  9 10 11
//   sample:      R  G  B  A   R  G  B  A   R  G  B  A
//   pixel:       |-- (0,0) -| |-- (1,0) -| |-- (2,0) -|
//
// Invariant: data.len() == width * height * 4, always. Constructors
// enforce it; there is no way to resize an image in place.
//
// The GPU kernel operates on a widened i32 copy of this buffer — see
// `convert` for the lossless shape conversion in both directions.

use std::fmt;

/// Number of interleaved channel samples per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// An 8-bit-per-channel interleaved RGBA image with runtime dimensions.
pub struct RgbaImage {
    /// Samples in row-major, interleaved order. Length = width * height * 4.
    data: Vec<u8>,
    /// Image width in pixels.
    width: usize,
    /// Image height in pixels.
    height: usize,
}

// Clone is implemented manually rather than derived to document that this
// is a deep copy of heap data, potentially megabytes for real frames.
impl Clone for RgbaImage {
    fn clone(&self) -> Self {
        RgbaImage {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl RgbaImage {
    // --- Constructors ---

    /// Create a zero-initialized (fully transparent black) image.
    pub fn new(width: usize, height: usize) -> Self {
        RgbaImage {
            data: vec![0u8; width * height * CHANNELS],
            width,
            height,
        }
    }

    /// Create an image from an existing interleaved sample buffer.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height * 4`.
    pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            width * height * CHANNELS,
            "sample buffer length {} does not match {}x{} RGBA",
            data.len(),
            width,
            height
        );
        RgbaImage { data, width, height }
    }

    // --- Accessors ---

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of channel samples (width * height * 4).
    pub fn sample_count(&self) -> usize {
        self.data.len()
    }

    /// The raw interleaved sample buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Read the RGBA quadruple at pixel (x, y).
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; CHANNELS] {
        let i = self.sample_index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Write the RGBA quadruple at pixel (x, y).
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, rgba: [u8; CHANNELS]) {
        let i = self.sample_index(x, y);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Flat index of the first (R) sample of pixel (x, y).
    #[inline]
    fn sample_index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{} image",
            self.width,
            self.height
        );
        (y * self.width + x) * CHANNELS
    }
}

impl fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RgbaImage {{ {}x{} }}", self.width, self.height)
    }
}

impl PartialEq for RgbaImage {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

impl Eq for RgbaImage {}
