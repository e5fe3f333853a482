use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use std::io::Cursor;
use tracing::{debug, instrument};

use crate::image_pipeline::cfa::CfaDesc;
use crate::image_pipeline::common::{PipelineError, Result};
use crate::image_pipeline::texture::{PixelFormat, Texture};

/// Plain bilinear demosaic used for raw-mode previews.
pub struct BilinearDebayer;

impl BilinearDebayer {
    pub fn new() -> Self {
        Self
    }

    fn bayer_cfa(cfa: &CfaDesc) -> Result<CFA> {
        match *cfa {
            CfaDesc::RGGB => Ok(CFA::RGGB),
            CfaDesc::BGGR => Ok(CFA::BGGR),
            CfaDesc::GRBG => Ok(CFA::GRBG),
            CfaDesc::GBRG => Ok(CFA::GBRG),
            other => Err(PipelineError::UnsupportedCfa(other.to_string())),
        }
    }

    /// `raw` is a single-channel plane in `[0, 1]`; the result is RGBA with
    /// alpha 1.
    #[instrument(skip_all, fields(width = raw.width(), height = raw.height(), cfa = %cfa))]
    pub fn process(&self, cfa: &CfaDesc, raw: &Texture) -> Result<Texture> {
        if raw.format() != PixelFormat::R32Float {
            return Err(PipelineError::Debayer(format!(
                "expected R32Float raw plane, got {:?}",
                raw.format()
            )));
        }
        let width = raw.width();
        let height = raw.height();
        let bayer_cfa = Self::bayer_cfa(cfa)?;

        // bayer only reads 8 or 16 bit samples
        let bayer_bytes: Vec<u8> = raw
            .data()
            .iter()
            .flat_map(|&v| ((v.clamp(0.0, 1.0) * 65535.0).round() as u16).to_le_bytes())
            .collect();

        let mut output_buf = vec![0u8; width * height * 3 * 2];
        let mut cursor = Cursor::new(&bayer_bytes[..]);
        debug!(
            input_bytes = bayer_bytes.len(),
            output_bytes = output_buf.len(),
            "Running linear demosaic"
        );

        {
            let mut output_raster =
                RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);
            bayer::run_demosaic(
                &mut cursor,
                BayerDepth::Depth16LE,
                bayer_cfa,
                Demosaic::Linear,
                &mut output_raster,
            )
            .map_err(|e| PipelineError::Debayer(format!("{:?}", e)))?;
        }

        let data: Vec<f32> = output_buf
            .chunks_exact(6)
            .flat_map(|px| {
                let c = |i: usize| f32::from(u16::from_ne_bytes([px[i], px[i + 1]])) / 65535.0;
                [c(0), c(2), c(4), 1.0]
            })
            .collect();

        Texture::from_data(PixelFormat::Rgba32Float, width, height, data)
    }
}

impl Default for BilinearDebayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::cfa::CfaColor;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_flat_plane_stays_flat() {
        let raw = Texture::from_data(PixelFormat::R32Float, 6, 4, vec![0.5; 24]).unwrap();
        let rgb = BilinearDebayer::new().process(&CfaDesc::RGGB, &raw).unwrap();
        assert_eq!(rgb.format(), PixelFormat::Rgba32Float);
        for px in rgb.data().chunks_exact(4) {
            for c in 0..3 {
                assert_abs_diff_eq!(px[c], 0.5, epsilon = 1e-4);
            }
            assert_eq!(px[3], 1.0);
        }
    }

    #[test]
    fn test_unconventional_cfa_is_rejected() {
        let raw = Texture::new(PixelFormat::R32Float, 4, 4);
        let cfa = CfaDesc::new([
            [CfaColor::Green, CfaColor::Green],
            [CfaColor::Red, CfaColor::Blue],
        ]);
        let err = BilinearDebayer::new().process(&cfa, &raw).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedCfa(_)));
    }
}
