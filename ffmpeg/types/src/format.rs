/*!
    Pixel format types.
*/

/**
    Video pixel formats.

    This is a subset of formats commonly encountered in media pipelines.
    Not all FFmpeg pixel formats are represented.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (most common video format)
    Yuv420p,
    /// Planar YUV 4:2:0, full range (JPEG / phone camera output)
    Yuvj420p,
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware decoder output)
    Nv12,
    /// Packed BGRA, 32bpp
    Bgra,
    /// Packed RGBA, 32bpp
    Rgba,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Planar YUV 4:2:0, 10-bit little-endian (HDR content)
    Yuv420p10,
}

/**
    Layout of a single tightly packed plane.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Plane {
    /// Bytes per row, without padding.
    pub row_bytes: usize,
    /// Number of rows.
    pub rows: usize,
}

impl Plane {
    /**
        Total size of the plane in bytes.
    */
    pub const fn len(&self) -> usize {
        self.row_bytes * self.rows
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        For planar formats, this is the average bits per pixel.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Yuv420p | Self::Yuvj420p | Self::Nv12 => 12,
            Self::Yuv420p10 => 15,
            Self::Yuv422p => 16,
            Self::Rgb24 | Self::Bgr24 | Self::Yuv444p => 24,
            Self::Bgra | Self::Rgba => 32,
        }
    }

    /**
        Returns true if this is a planar (or semi-planar) format.
    */
    pub const fn is_planar(self) -> bool {
        !matches!(self, Self::Bgra | Self::Rgba | Self::Rgb24 | Self::Bgr24)
    }

    /**
        Returns the tightly packed plane layout for a frame of the given size.

        Chroma planes round odd dimensions up, matching FFmpeg's allocation.
    */
    pub fn planes(self, width: u32, height: u32) -> Vec<Plane> {
        let width = width as usize;
        let height = height as usize;
        let half_width = width.div_ceil(2);
        let half_height = height.div_ceil(2);

        let plane = |row_bytes, rows| Plane { row_bytes, rows };

        match self {
            Self::Bgra | Self::Rgba => vec![plane(width * 4, height)],
            Self::Rgb24 | Self::Bgr24 => vec![plane(width * 3, height)],
            Self::Yuv420p | Self::Yuvj420p => vec![
                plane(width, height),
                plane(half_width, half_height),
                plane(half_width, half_height),
            ],
            Self::Yuv420p10 => vec![
                plane(width * 2, height),
                plane(half_width * 2, half_height),
                plane(half_width * 2, half_height),
            ],
            Self::Yuv422p => vec![
                plane(width, height),
                plane(half_width, height),
                plane(half_width, height),
            ],
            Self::Yuv444p => vec![
                plane(width, height),
                plane(width, height),
                plane(width, height),
            ],
            Self::Nv12 => vec![plane(width, height), plane(half_width * 2, half_height)],
        }
    }

    /**
        Returns the total buffer size of a tightly packed frame.
    */
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        self.planes(width, height).iter().map(Plane::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_bits_per_pixel() {
        assert_eq!(PixelFormat::Yuv420p.bits_per_pixel(), 12);
        assert_eq!(PixelFormat::Bgra.bits_per_pixel(), 32);
        assert_eq!(PixelFormat::Rgb24.bits_per_pixel(), 24);
    }

    #[test]
    fn pixel_format_is_planar() {
        assert!(PixelFormat::Yuv420p.is_planar());
        assert!(PixelFormat::Nv12.is_planar());
        assert!(!PixelFormat::Bgra.is_planar());
    }

    #[test]
    fn packed_layout_is_single_plane() {
        let planes = PixelFormat::Rgba.planes(4, 2);
        assert_eq!(planes, vec![Plane { row_bytes: 16, rows: 2 }]);
        assert_eq!(PixelFormat::Rgba.frame_size(4, 2), 32);
    }

    #[test]
    fn yuv420_rounds_chroma_up() {
        let planes = PixelFormat::Yuv420p.planes(5, 3);
        assert_eq!(planes[0], Plane { row_bytes: 5, rows: 3 });
        assert_eq!(planes[1], Plane { row_bytes: 3, rows: 2 });
        assert_eq!(planes[2], Plane { row_bytes: 3, rows: 2 });
        assert_eq!(PixelFormat::Yuv420p.frame_size(640, 480), 640 * 480 * 3 / 2);
    }

    #[test]
    fn nv12_interleaves_chroma() {
        let planes = PixelFormat::Nv12.planes(4, 4);
        assert_eq!(planes.len(), 2);
        assert_eq!(planes[1], Plane { row_bytes: 4, rows: 2 });
    }
}
