use approx::assert_abs_diff_eq;
use nalgebra::{DMatrix, Vector3};
use rustfft::num_complex::Complex;

use cfa_pipeline_rs::image_pipeline::{
    CfaDesc, CpuRenderer, DefringeOptions, DisplayFormat, HistogramParams, IlluminantEstimator,
    IlluminantModel, Pipeline, PipelineOptions, SampleRect, Texture, texture::PixelFormat,
};

fn chart(cfa: &CfaDesc, w: usize, h: usize) -> Texture {
    let patches = [[0.45, 0.32, 0.25], [0.28, 0.40, 0.60], [0.80, 0.62, 0.50], [1.0, 1.0, 0.9]];
    let mut raw = Texture::new(PixelFormat::R32Float, w, h);
    for y in 0..h {
        for x in 0..w {
            let p = patches[(y * 2 / h) * 2 + x * 2 / w];
            raw.set(x, y, 0, p[cfa.color_at(x, y).channel()]);
        }
    }
    raw
}

fn sharp_model() -> IlluminantModel {
    let n = HistogramParams::default().bin_count;
    IlluminantModel::new(
        HistogramParams::default(),
        [
            DMatrix::from_element(n, n, Complex::new(1000.0, 0.0)),
            DMatrix::from_element(n, n, Complex::new(0.0, 0.0)),
        ],
        DMatrix::zeros(n, n),
    )
    .unwrap()
}

#[test]
fn test_full_pipeline_with_model_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.ffcc");
    sharp_model().write_to_file(&path).unwrap();

    let model = IlluminantModel::from_file(&path).unwrap();
    let pipeline = Pipeline::with_estimator(IlluminantEstimator::new(model));
    let opts = PipelineOptions::builder()
        .defringe(true, DefringeOptions::default())
        .reconstruct_highlights(true)
        .apply_gamma(true)
        .exposure(0.2)
        .brightness(0.05)
        .contrast(0.1)
        .saturation(0.2)
        .local_contrast(true, 0.3, 4.0)
        .sample_rect(SampleRect::new(10, 10, 20, 20))
        .build();

    let raw = chart(&CfaDesc::RGGB, 96, 64);
    let mut renderer = CpuRenderer::new();
    let out = pipeline.run(&mut renderer, &opts, &raw).unwrap();

    assert_eq!(out.rgb.width(), 96);
    assert_eq!(out.rgb.height(), 64);
    assert!(out.rgb.data().iter().all(|v| v.is_finite()));
    let illum = out.illum.unwrap();
    assert_abs_diff_eq!(illum.norm(), 1.0, epsilon = 1e-9);
    assert!(illum.iter().all(|&c| c > 0.0));
    assert_eq!(out.samples.unwrap().raw.len(), 100);
    assert!(renderer.timings().total_duration() > std::time::Duration::ZERO);
}

#[test]
fn test_runs_are_deterministic() {
    let pipeline = Pipeline::with_estimator(IlluminantEstimator::new(sharp_model()));
    let opts = PipelineOptions::builder()
        .cfa(CfaDesc::GRBG)
        .reconstruct_highlights(true)
        .display_format(DisplayFormat::Rgba8Unorm)
        .build();
    let raw = chart(&CfaDesc::GRBG, 64, 48);

    let a = pipeline.run(&mut CpuRenderer::new(), &opts, &raw).unwrap();
    let b = pipeline.run(&mut CpuRenderer::new(), &opts, &raw).unwrap();
    assert_eq!(a.illum, b.illum);
    assert_eq!(a.rgb, b.rgb);
}

#[test]
fn test_supplied_illuminant_overrides_estimator() {
    let pipeline = Pipeline::with_estimator(IlluminantEstimator::new(sharp_model()));
    let opts = PipelineOptions::builder().illum(Some([0.5, 1.0, 0.7])).build();
    let raw = chart(&CfaDesc::RGGB, 32, 32);
    let out = pipeline.run(&mut CpuRenderer::new(), &opts, &raw).unwrap();
    assert_eq!(out.illum, Some(Vector3::new(0.5, 1.0, 0.7)));
}

#[test]
fn test_raw_mode_rejects_unconventional_cfa() {
    use cfa_pipeline_rs::image_pipeline::{CfaColor, PipelineError};
    let cfa = CfaDesc::new([[CfaColor::Red, CfaColor::Red], [CfaColor::Green, CfaColor::Blue]]);
    let opts = PipelineOptions::builder().cfa(cfa).raw_mode(true).build();
    let raw = chart(&CfaDesc::RGGB, 8, 8);
    let result = Pipeline::new().run(&mut CpuRenderer::new(), &opts, &raw);
    assert!(matches!(result, Err(PipelineError::UnsupportedCfa(_))));
}
