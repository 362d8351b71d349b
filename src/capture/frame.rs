//! Frame data structures for captured images

use opencv::core::Mat;
use opencv::prelude::*;
use std::time::Instant;

/// A single BGR image taken from a camera or loaded from disk
#[derive(Debug)]
pub struct Frame {
    /// Pixel data in OpenCV's BGR channel order
    pub image: Mat,
    /// Timestamp when the frame was acquired
    pub timestamp: Instant,
}

impl Frame {
    /// Wrap an image acquired now
    pub fn new(image: Mat) -> Self {
        Self {
            image,
            timestamp: Instant::now(),
        }
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.cols().max(0) as u32, self.image.rows().max(0) as u32)
    }

    pub fn into_image(self) -> Mat {
        self.image
    }
}
