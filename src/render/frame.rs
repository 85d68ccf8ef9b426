use image::{GrayImage, RgbImage};
use std::fmt;

/// Interleaved 8-bit image buffer with 1 (gray) or 3 (RGB) channels.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap raw bytes. Returns `None` unless `data` holds exactly
    /// `width * height * channels` bytes and `channels` is 1 or 3.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Option<Self> {
        if channels != 1 && channels != 3 {
            return None;
        }
        if data.len() != width as usize * height as usize * channels as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// All-zero (black) frame.
    pub fn blank(width: u32, height: u32, channels: u8) -> Self {
        Self::filled(width, height, channels, 0)
    }

    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        let channels = if channels == 1 { 1 } else { 3 };
        Self {
            width,
            height,
            channels,
            data: vec![value; width as usize * height as usize * channels as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// `(width, height, channels)`
    pub fn shape(&self) -> (u32, u32, u8) {
        (self.width, self.height, self.channels)
    }

    pub fn same_shape(&self, other: &Frame) -> bool {
        self.shape() == other.shape()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let start = self.offset(x, y);
        &self.data[start..start + self.channels as usize]
    }

    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        let start = self.offset(x, y);
        let channels = self.channels as usize;
        &mut self.data[start..start + channels]
    }

    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Bilinear sample of channel `c` at a continuous position, clamped to
    /// the frame edges. Integer positions return the stored value exactly.
    pub fn sample_bilinear(&self, x: f64, y: f64, c: usize) -> f32 {
        let max_x = (self.width.max(1) - 1) as f64;
        let max_y = (self.height.max(1) - 1) as f64;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = (x - x0) as f32;
        let fy = (y - y0) as f32;
        let x0 = x0 as u32;
        let y0 = y0 as u32;
        let x1 = (x0 + 1).min(max_x as u32);
        let y1 = (y0 + 1).min(max_y as u32);

        let p00 = self.pixel(x0, y0)[c] as f32;
        if fx == 0.0 && fy == 0.0 {
            return p00;
        }
        let p10 = self.pixel(x1, y0)[c] as f32;
        let p01 = self.pixel(x0, y1)[c] as f32;
        let p11 = self.pixel(x1, y1)[c] as f32;

        let top = p00 + (p10 - p00) * fx;
        let bottom = p01 + (p11 - p01) * fx;
        top + (bottom - top) * fy
    }

    /// Packed RGB24 bytes; gray frames are replicated across channels.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        match self.channels {
            3 => self.data.clone(),
            _ => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .finish()
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: image.into_raw(),
        }
    }
}

impl From<GrayImage> for Frame {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 1,
            data: image.into_raw(),
        }
    }
}
