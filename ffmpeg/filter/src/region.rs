/*!
    Crop regions in source pixel coordinates.
*/

/**
    A crop rectangle anchored at its top-left corner.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CropRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /**
        The region covering a whole frame.
    */
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /**
        Shrink and shift the region so it lies inside a `width`x`height` frame.

        The size is clamped first, then the position, so a rectangle hanging
        over an edge slides back inside instead of being cut.
    */
    pub fn clamp_to(self, width: u32, height: u32) -> Self {
        let clamped_width = self.width.clamp(1, width.max(1));
        let clamped_height = self.height.clamp(1, height.max(1));
        let max_x = (width - clamped_width.min(width)) as i32;
        let max_y = (height - clamped_height.min(height)) as i32;

        Self {
            x: self.x.clamp(0, max_x),
            y: self.y.clamp(0, max_y),
            width: clamped_width,
            height: clamped_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_region_is_unchanged() {
        let region = CropRegion::new(10, 20, 100, 50);
        assert_eq!(region.clamp_to(640, 480), region);
    }

    #[test]
    fn overhanging_region_slides_back() {
        let region = CropRegion::new(600, -5, 100, 50);
        assert_eq!(region.clamp_to(640, 480), CropRegion::new(540, 0, 100, 50));
    }

    #[test]
    fn oversized_region_becomes_full_frame() {
        let region = CropRegion::new(-10, -10, 1000, 1000);
        assert_eq!(region.clamp_to(640, 480), CropRegion::full(640, 480));
    }

    #[test]
    fn empty_region_keeps_a_pixel() {
        let region = CropRegion::new(5, 5, 0, 0).clamp_to(640, 480);
        assert_eq!((region.width, region.height), (1, 1));
    }
}
