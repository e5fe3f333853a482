use anyhow::Context;
use cfa_pipeline_rs::image_pipeline::{
    CfaDesc, CpuRenderer, DefringeOptions, IlluminantEstimator, IlluminantModel, Pipeline,
    PipelineOptions, SampleRect,
};
use cfa_pipeline_rs::logger;

use tracing::{info, warn};

const WIDTH: usize = 640;
const HEIGHT: usize = 480;

/// 4x3 grid of flat colour patches, mosaiced RGGB, 12-bit.
fn synthetic_chart(cfa: &CfaDesc) -> Vec<u16> {
    const PATCHES: [[f32; 3]; 12] = [
        [0.45, 0.32, 0.25],
        [0.80, 0.62, 0.50],
        [0.28, 0.40, 0.60],
        [0.25, 0.35, 0.20],
        [0.50, 0.50, 0.75],
        [0.35, 0.80, 0.70],
        [0.90, 0.50, 0.15],
        [0.20, 0.25, 0.65],
        [0.80, 0.30, 0.35],
        [0.30, 0.18, 0.40],
        [0.60, 0.80, 0.20],
        [1.00, 1.00, 1.00],
    ];
    let mut pixels = Vec::with_capacity(WIDTH * HEIGHT);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let patch = PATCHES[(y * 3 / HEIGHT) * 4 + x * 4 / WIDTH];
            let v = patch[cfa.color_at(x, y).channel()];
            pixels.push((v * 4095.0).round() as u16);
        }
    }
    pixels
}

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting cfa_pipeline...");

    let pipeline = match std::env::args().nth(1) {
        Some(path) => {
            let model = IlluminantModel::from_file(&path)
                .with_context(|| format!("loading illuminant model {path}"))?;
            info!(bins = model.params().bin_count, "Illuminant model loaded");
            Pipeline::with_estimator(IlluminantEstimator::new(model))
        }
        None => {
            warn!("No illuminant model given, using a neutral illuminant");
            Pipeline::new()
        }
    };

    let cfa = CfaDesc::RGGB;
    let opts = PipelineOptions::builder()
        .cfa(cfa)
        .defringe(true, DefringeOptions::default())
        .reconstruct_highlights(true)
        .exposure(0.3)
        .saturation(0.15)
        .contrast(0.1)
        .local_contrast(true, 0.25, 16.0)
        .sample_rect(SampleRect::new(300, 220, 340, 260))
        .build();

    let pixels = synthetic_chart(&cfa);
    let mut renderer = CpuRenderer::new();
    let output = pipeline.run_pixels(&mut renderer, &opts, WIDTH, HEIGHT, &pixels)?;

    if let Some(illum) = output.illum {
        info!(r = illum.x, g = illum.y, b = illum.z, "Illuminant");
    }
    if let Some(samples) = &output.samples {
        let n = (samples.srgb.len() / 4).max(1) as f32;
        let mean: Vec<f32> = (0..3)
            .map(|c| samples.srgb.iter().skip(c).step_by(4).sum::<f32>() / n)
            .collect();
        info!(?mean, "Mean sRGB inside sample rect");
    }
    let rgb16 = output.to_rgb16();
    info!(width = rgb16.width, height = rgb16.height, "Pipeline output ready");

    renderer.print_summary();
    Ok(())
}
