//! CPU-resident image planes shared by every pipeline stage

use crate::image_pipeline::common::{PipelineError, Result};

/// Maximum value of a 12-bit sensor sample.
pub const RAW_WHITE: u16 = 0x0FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    R32Float,
    Rg32Float,
    Rgba32Float,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::R32Float => 1,
            PixelFormat::Rg32Float => 2,
            PixelFormat::Rgba32Float => 4,
        }
    }
}

/// Reflect `pt` back into `[0, bound)`: `-1 -> 1`, `bound -> bound - 2`.
pub fn mirror(bound: usize, pt: i64) -> usize {
    let last = bound as i64 - 1;
    let reflected = if pt < 0 {
        -pt
    } else if pt > last {
        2 * last - pt
    } else {
        pt
    };
    reflected.clamp(0, last.max(0)) as usize
}

pub fn clamp_edge(bound: usize, pt: i64) -> usize {
    pt.clamp(0, (bound as i64 - 1).max(0)) as usize
}

/// Inclusive-exclusive pixel rectangle used for diagnostic sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SampleRect {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl SampleRect {
    pub fn new(left: usize, top: usize, right: usize, bottom: usize) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> usize {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> usize {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Intersection with a `width x height` image.
    pub fn clipped(&self, width: usize, height: usize) -> SampleRect {
        SampleRect {
            left: self.left.min(width),
            top: self.top.min(height),
            right: self.right.min(width),
            bottom: self.bottom.min(height),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    format: PixelFormat,
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Texture {
    pub fn new(format: PixelFormat, width: usize, height: usize) -> Self {
        Self {
            format,
            width,
            height,
            data: vec![0.0; width * height * format.channels()],
        }
    }

    pub fn from_data(format: PixelFormat, width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        let expected = width * height * format.channels();
        if data.len() != expected {
            return Err(PipelineError::BufferSizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self { format, width, height, data })
    }

    /// Single-channel plane of 12-bit sensor samples scaled into `[0, 1]`.
    pub fn from_raw_pixels(width: usize, height: usize, pixels: &[u16]) -> Result<Self> {
        let data = pixels
            .iter()
            .map(|&p| f32::from(p) / f32::from(RAW_WHITE))
            .collect();
        Self::from_data(PixelFormat::R32Float, width, height, data)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn same_shape(&self, other: &Texture) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.format.channels()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> f32 {
        self.data[self.offset(x, y) + c]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, c: usize, v: f32) {
        let i = self.offset(x, y) + c;
        self.data[i] = v;
    }

    pub fn px(&self, x: usize, y: usize) -> &[f32] {
        let i = self.offset(x, y);
        &self.data[i..i + self.format.channels()]
    }

    pub fn px_mut(&mut self, x: usize, y: usize) -> &mut [f32] {
        let i = self.offset(x, y);
        let n = self.format.channels();
        &mut self.data[i..i + n]
    }

    /// First three channels of an RGBA pixel.
    pub fn rgb(&self, x: usize, y: usize) -> [f32; 3] {
        let p = self.px(x, y);
        [p[0], p[1], p[2]]
    }

    pub fn set_rgb(&mut self, x: usize, y: usize, rgb: [f32; 3]) {
        let p = self.px_mut(x, y);
        p[..3].copy_from_slice(&rgb);
    }

    #[inline]
    pub fn mirrored(&self, x: i64, y: i64, c: usize) -> f32 {
        self.get(mirror(self.width, x), mirror(self.height, y), c)
    }

    #[inline]
    pub fn clamped(&self, x: i64, y: i64, c: usize) -> f32 {
        self.get(clamp_edge(self.width, x), clamp_edge(self.height, y), c)
    }

    /// Bilinear sample in pixel units where `(x + .5, y + .5)` is the centre
    /// of pixel `(x, y)`. Clamp-to-edge.
    pub fn sample_bilinear_px(&self, fx: f32, fy: f32, c: usize) -> f32 {
        let sx = fx - 0.5;
        let sy = fy - 0.5;
        let x0 = sx.floor();
        let y0 = sy.floor();
        let tx = sx - x0;
        let ty = sy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let a = self.clamped(x0, y0, c);
        let b = self.clamped(x0 + 1, y0, c);
        let d = self.clamped(x0, y0 + 1, c);
        let e = self.clamped(x0 + 1, y0 + 1, c);
        let top = a + (b - a) * tx;
        let bottom = d + (e - d) * tx;
        top + (bottom - top) * ty
    }

    /// Bilinear sample at normalised coordinates in `[0, 1]`.
    pub fn sample(&self, u: f32, v: f32, c: usize) -> f32 {
        self.sample_bilinear_px(u * self.width as f32, v * self.height as f32, c)
    }

    /// Nearest-texel sample at normalised coordinates.
    pub fn sample_nearest(&self, u: f32, v: f32, c: usize) -> f32 {
        let x = (u * self.width as f32).floor() as i64;
        let y = (v * self.height as f32).floor() as i64;
        self.clamped(x, y, c)
    }

    /// Copies the pixels inside `rect` (clipped to the texture) row by row.
    pub fn crop(&self, rect: &SampleRect) -> Vec<f32> {
        let rect = rect.clipped(self.width, self.height);
        let mut out = Vec::with_capacity(rect.width() * rect.height() * self.channels());
        for y in rect.top..rect.bottom {
            for x in rect.left..rect.right {
                out.extend_from_slice(self.px(x, y));
            }
        }
        out
    }
}
