//! Trained illuminant model and its binary blob format
//!
//! Layout (little-endian):
//!
//! | field | type |
//! |---|---|
//! | magic | `b"FFCC"` |
//! | version | `u32` (1) |
//! | bin count `n` | `u32` |
//! | bin size | `f64` |
//! | starting UV | `f64` |
//! | minimum intensity | `f64` |
//! | `F_fft[0]`, `F_fft[1]` | `n*n` `(re, im)` `f64` pairs each |
//! | `B` | `n*n` `f64` |
//!
//! Matrices are stored column-major.

use nalgebra::DMatrix;
use rustfft::num_complex::Complex;
use std::path::Path;

use crate::image_pipeline::common::{PipelineError, Result};

pub const MODEL_MAGIC: &[u8; 4] = b"FFCC";
pub const MODEL_VERSION: u32 = 1;
const MAX_BIN_COUNT: usize = 1024;
const HEADER_LEN: usize = 4 + 4 + 4 + 8 + 8 + 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramParams {
    pub bin_count: usize,
    pub bin_size: f64,
    pub starting_uv: f64,
    pub min_intensity: f64,
}

impl Default for HistogramParams {
    fn default() -> Self {
        Self {
            bin_count: 64,
            bin_size: 1.0 / 32.0,
            starting_uv: -0.53125,
            min_intensity: 1.0 / 256.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IlluminantModel {
    params: HistogramParams,
    f_fft: [DMatrix<Complex<f64>>; 2],
    b: DMatrix<f64>,
}

struct BlobReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BlobReader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos + len;
        let out = self.bytes.get(self.pos..end).ok_or_else(|| {
            PipelineError::ModelFormat(format!(
                "truncated: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.bytes.len()
            ))
        })?;
        self.pos = end;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(buf))
    }
}

impl IlluminantModel {
    pub fn new(
        params: HistogramParams,
        f_fft: [DMatrix<Complex<f64>>; 2],
        b: DMatrix<f64>,
    ) -> Result<Self> {
        let n = params.bin_count;
        if n == 0 || n > MAX_BIN_COUNT {
            return Err(PipelineError::ModelFormat(format!("invalid bin count {}", n)));
        }
        if !(params.bin_size.is_finite() && params.bin_size > 0.0) {
            return Err(PipelineError::ModelFormat(format!(
                "invalid bin size {}",
                params.bin_size
            )));
        }
        if !params.starting_uv.is_finite() {
            return Err(PipelineError::ModelFormat(format!(
                "invalid starting uv {}",
                params.starting_uv
            )));
        }
        // u and v are log ratios, so the intensity floor must keep them finite.
        if !(params.min_intensity.is_finite() && params.min_intensity > 0.0) {
            return Err(PipelineError::ModelFormat(format!(
                "invalid minimum intensity {}",
                params.min_intensity
            )));
        }
        for m in &f_fft {
            if m.shape() != (n, n) {
                return Err(PipelineError::ModelFormat(format!(
                    "filter is {:?}, expected {n}x{n}",
                    m.shape()
                )));
            }
        }
        if b.shape() != (n, n) {
            return Err(PipelineError::ModelFormat(format!(
                "bias is {:?}, expected {n}x{n}",
                b.shape()
            )));
        }
        Ok(Self { params, f_fft, b })
    }

    pub fn params(&self) -> &HistogramParams {
        &self.params
    }

    pub fn filters(&self) -> &[DMatrix<Complex<f64>>; 2] {
        &self.f_fft
    }

    pub fn bias(&self) -> &DMatrix<f64> {
        &self.b
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = BlobReader { bytes, pos: 0 };
        if reader.take(4)? != MODEL_MAGIC {
            return Err(PipelineError::ModelFormat("bad magic".to_string()));
        }
        let version = reader.u32()?;
        if version != MODEL_VERSION {
            return Err(PipelineError::ModelFormat(format!(
                "unsupported version {}",
                version
            )));
        }
        let n = reader.u32()? as usize;
        if n == 0 || n > MAX_BIN_COUNT {
            return Err(PipelineError::ModelFormat(format!("invalid bin count {}", n)));
        }
        let params = HistogramParams {
            bin_count: n,
            bin_size: reader.f64()?,
            starting_uv: reader.f64()?,
            min_intensity: reader.f64()?,
        };

        let expected = HEADER_LEN + n * n * (16 * 2 + 8);
        if bytes.len() != expected {
            return Err(PipelineError::ModelFormat(format!(
                "expected {} bytes, got {}",
                expected,
                bytes.len()
            )));
        }

        let mut read_complex = || -> Result<DMatrix<Complex<f64>>> {
            let mut vals = Vec::with_capacity(n * n);
            for _ in 0..n * n {
                let re = reader.f64()?;
                let im = reader.f64()?;
                vals.push(Complex::new(re, im));
            }
            Ok(DMatrix::from_column_slice(n, n, &vals))
        };
        let f0 = read_complex()?;
        let f1 = read_complex()?;

        let mut vals = Vec::with_capacity(n * n);
        for _ in 0..n * n {
            vals.push(reader.f64()?);
        }
        let b = DMatrix::from_column_slice(n, n, &vals);

        Self::new(params, [f0, f1], b)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.params.bin_count;
        let mut out = Vec::with_capacity(HEADER_LEN + n * n * 40);
        out.extend_from_slice(MODEL_MAGIC);
        out.extend_from_slice(&MODEL_VERSION.to_le_bytes());
        out.extend_from_slice(&(n as u32).to_le_bytes());
        out.extend_from_slice(&self.params.bin_size.to_le_bytes());
        out.extend_from_slice(&self.params.starting_uv.to_le_bytes());
        out.extend_from_slice(&self.params.min_intensity.to_le_bytes());
        for m in &self.f_fft {
            for c in m.as_slice() {
                out.extend_from_slice(&c.re.to_le_bytes());
                out.extend_from_slice(&c.im.to_le_bytes());
            }
        }
        for v in self.b.as_slice() {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn small_model() -> IlluminantModel {
        let params = HistogramParams {
            bin_count: 4,
            ..HistogramParams::default()
        };
        let f0 = DMatrix::from_fn(4, 4, |i, j| Complex::new(i as f64, j as f64));
        let f1 = DMatrix::from_fn(4, 4, |i, j| Complex::new(-(j as f64), 0.5 * i as f64));
        let b = DMatrix::from_fn(4, 4, |i, j| (i * 4 + j) as f64 / 16.0);
        IlluminantModel::new(params, [f0, f1], b).unwrap()
    }

    #[test]
    fn test_blob_is_column_major() {
        let model = small_model();
        let bytes = model.to_bytes();
        // B(1, 0) is the second stored bias value.
        let b_start = HEADER_LEN + 2 * 16 * 16;
        let second = f64::from_le_bytes(bytes[b_start + 8..b_start + 16].try_into().unwrap());
        assert_eq!(second, model.bias()[(1, 0)]);
    }

    #[test]
    fn test_file_round_trip() {
        let model = small_model();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&model.to_bytes()).unwrap();
        file.flush().unwrap();

        let loaded = IlluminantModel::from_file(file.path()).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_rejects_malformed_blobs() {
        let bytes = small_model().to_bytes();

        let err = IlluminantModel::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, PipelineError::ModelFormat(_)));

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(matches!(
            IlluminantModel::from_bytes(&bad_magic),
            Err(PipelineError::ModelFormat(_))
        ));

        let mut bad_version = bytes.clone();
        bad_version[4] = 9;
        assert!(matches!(
            IlluminantModel::from_bytes(&bad_version),
            Err(PipelineError::ModelFormat(_))
        ));

        assert!(matches!(
            IlluminantModel::from_bytes(&bytes[..10]),
            Err(PipelineError::ModelFormat(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_histogram_params() {
        let n = 4;
        let filters = || [DMatrix::zeros(n, n), DMatrix::zeros(n, n)];
        let invalid = [
            HistogramParams { bin_count: n, min_intensity: 0.0, ..HistogramParams::default() },
            HistogramParams { bin_count: n, min_intensity: -1.0, ..HistogramParams::default() },
            HistogramParams { bin_count: n, min_intensity: f64::NAN, ..HistogramParams::default() },
            HistogramParams { bin_count: n, starting_uv: f64::INFINITY, ..HistogramParams::default() },
        ];
        for params in invalid {
            let result = IlluminantModel::new(params, filters(), DMatrix::zeros(n, n));
            assert!(matches!(result, Err(PipelineError::ModelFormat(_))), "{params:?} accepted");
        }

        // the same check guards the blob loader
        let mut model = small_model();
        model.params.min_intensity = 0.0;
        assert!(matches!(
            IlluminantModel::from_bytes(&model.to_bytes()),
            Err(PipelineError::ModelFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IlluminantModel::from_file(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, PipelineError::IoError(_)));
    }
}
