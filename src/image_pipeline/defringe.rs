//! Chromatic fringe correction on the raw plane
//!
//! Each round estimates, per tile, how far the red and blue samples are
//! displaced from the interpolated green plane, fits a smooth polynomial
//! shift field over the whole image, and resamples red/blue accordingly.

pub mod poly2d;
pub mod tile_grid;

use tracing::{debug, info_span, instrument, warn};

use crate::image_pipeline::cfa::{CfaColor, CfaDesc};
use crate::image_pipeline::debayer::lmmse;
use crate::image_pipeline::render::{DefringeKernel, Renderer};
use crate::image_pipeline::texture::{PixelFormat, Texture};

pub use poly2d::{Poly2D, Poly2DFitter};
pub use tile_grid::{Tile, TileAxis, TileGrid};

/// Below this the tile has no usable green gradient.
pub const SLOPE_EPS: f64 = 1e-5;
/// Resolution of the grid each shift polynomial is evaluated on.
pub const SHIFT_GRID_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefringeOptions {
    pub rounds: u32,
    /// Largest accepted ratio between the green sample and the shifted green.
    pub alpha_thresh: f32,
    /// Relative change above which the corrected sample is pulled toward its
    /// same-color neighbourhood.
    pub gamma_thresh: f32,
    pub gamma_factor: f32,
    /// Centre weight of the 3-row gradient filter.
    pub delta_factor: f32,
}

impl Default for DefringeOptions {
    fn default() -> Self {
        Self {
            rounds: 2,
            alpha_thresh: 2.0,
            gamma_thresh: 0.2,
            gamma_factor: 0.5,
            delta_factor: 10.0 / 16.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TileTerms {
    pub t0: f64,
    pub t1: f64,
    pub t2: f64,
}

impl TileTerms {
    fn add(&mut self, slope: f64, delta: f64) {
        self.t0 += delta * delta;
        self.t1 += slope * delta;
        self.t2 += slope * slope;
    }

    /// `(shift, weight)`, or `None` when the tile has no gradient to fit.
    pub fn shift_weight(&self) -> Option<(f64, f64)> {
        if self.t2 < SLOPE_EPS {
            return None;
        }
        Some((2.0 * self.t1 / self.t2, self.t2 / (SLOPE_EPS + self.t0)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Fitted shift polynomials for red and blue along both axes.
#[derive(Debug, Clone, Default)]
pub struct ShiftFields {
    pub red_x: Poly2D,
    pub red_y: Poly2D,
    pub blue_x: Poly2D,
    pub blue_y: Poly2D,
}

impl ShiftFields {
    pub fn get(&self, color: CfaColor, axis: Axis) -> &Poly2D {
        match (color, axis) {
            (CfaColor::Blue, Axis::X) => &self.blue_x,
            (CfaColor::Blue, Axis::Y) => &self.blue_y,
            (_, Axis::X) => &self.red_x,
            (_, Axis::Y) => &self.red_y,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.red_x.is_zero() && self.red_y.is_zero() && self.blue_x.is_zero() && self.blue_y.is_zero()
    }

    /// `Rg32Float` grid of `(x, y)` shifts for `color`, sampled at cell centres.
    pub fn grid<R: Renderer>(&self, renderer: &mut R, color: CfaColor) -> Texture {
        let n = SHIFT_GRID_SIZE;
        let mut tex = renderer.texture_create(PixelFormat::Rg32Float, n, n);
        let px = self.get(color, Axis::X);
        let py = self.get(color, Axis::Y);
        for j in 0..n {
            for i in 0..n {
                let x = (i as f64 + 0.5) / n as f64;
                let y = (j as f64 + 0.5) / n as f64;
                tex.set(i, j, 0, px.eval(x, y) as f32);
                tex.set(i, j, 1, py.eval(x, y) as f32);
            }
        }
        tex
    }
}

/// Accumulates the per-tile terms for `color` along both axes.
pub fn tile_terms(
    cfa: &CfaDesc,
    opts: &DefringeOptions,
    raw: &Texture,
    g_interp: &Texture,
    tile: &Tile,
    color: CfaColor,
) -> (TileTerms, TileTerms) {
    let wc = opts.delta_factor as f64;
    let ws = (1.0 - wc) / 2.0;
    let g = |x: i64, y: i64| g_interp.clamped(x, y, 1) as f64;

    let mut tx = TileTerms::default();
    let mut ty = TileTerms::default();
    for y in tile.y..tile.y + tile.height {
        let mut x = tile.x;
        if cfa.color_at(x, y) == CfaColor::Green {
            x += 1;
        }
        while x < tile.x + tile.width {
            if cfa.color_at(x, y) == color {
                let (xi, yi) = (x as i64, y as i64);
                let slope_x = ws * (g(xi + 1, yi + 1) - g(xi - 1, yi + 1))
                    + wc * (g(xi + 1, yi) - g(xi - 1, yi))
                    + ws * (g(xi + 1, yi - 1) - g(xi - 1, yi - 1));
                let slope_y = ws * (g(xi + 1, yi + 1) - g(xi + 1, yi - 1))
                    + wc * (g(xi, yi + 1) - g(xi, yi - 1))
                    + ws * (g(xi - 1, yi + 1) - g(xi - 1, yi - 1));
                let delta = raw.clamped(xi, yi, 0) as f64 - g(xi, yi);
                tx.add(slope_x, delta);
                ty.add(slope_y, delta);
            }
            x += 2;
        }
    }
    (tx, ty)
}

/// Fits the four shift polynomials from the tile statistics.
pub fn fit_shift_fields(
    cfa: &CfaDesc,
    opts: &DefringeOptions,
    raw: &Texture,
    g_interp: &Texture,
) -> ShiftFields {
    let grid = TileGrid::new(raw.width(), raw.height());
    let mut fitters: [Poly2DFitter; 4] = Default::default();
    let mut skipped = 0usize;

    for tile in grid.tiles() {
        for (ci, color) in [CfaColor::Red, CfaColor::Blue].into_iter().enumerate() {
            let (tx, ty) = tile_terms(cfa, opts, raw, g_interp, &tile, color);
            for (ai, terms) in [tx, ty].iter().enumerate() {
                match terms.shift_weight() {
                    Some((shift, weight)) => {
                        fitters[ci * 2 + ai].add(tile.center.0, tile.center.1, shift, weight)
                    }
                    None => skipped += 1,
                }
            }
        }
    }
    debug!(tiles = grid.len(), skipped, "Tile shift samples collected");
    if skipped == grid.len() * 4 {
        warn!(tiles = grid.len(), "No tile has a usable green gradient, defringe fit is degenerate");
    }

    let [red_x, red_y, blue_x, blue_y] = fitters.map(|f| f.solve());
    ShiftFields { red_x, red_y, blue_x, blue_y }
}

#[instrument(skip_all, fields(width = raw.width(), height = raw.height(), rounds = opts.rounds))]
pub fn run<R: Renderer>(renderer: &mut R, cfa: &CfaDesc, opts: &DefringeOptions, raw: &mut Texture) {
    assert_eq!(raw.format(), PixelFormat::R32Float, "Defringe: raw must be R32Float");
    let (w, h) = (raw.width(), raw.height());

    for round in 0..opts.rounds {
        let _span = info_span!("defringe_round", round).entered();

        let mut g_interp = renderer.texture_create(PixelFormat::Rgba32Float, w, h);
        lmmse::run(renderer, cfa, false, raw, &mut g_interp);
        renderer.commit_and_wait();

        let fields = fit_shift_fields(cfa, opts, raw, &g_interp);
        if fields.is_zero() {
            debug!(round, "Zero shift field, no correction applied");
            continue;
        }

        let shift_red = fields.grid(renderer, CfaColor::Red);
        let shift_blue = fields.grid(renderer, CfaColor::Blue);
        let mut corrected = renderer.texture_create(PixelFormat::R32Float, w, h);
        renderer.render(
            &mut corrected,
            DefringeKernel::ApplyCorrection {
                cfa: *cfa,
                opts: *opts,
                raw: &*raw,
                g_interp: &g_interp,
                shift_red: &shift_red,
                shift_blue: &shift_blue,
            }
            .into(),
        );
        renderer.copy(&corrected, raw);
        renderer.commit_and_wait();
    }
}
