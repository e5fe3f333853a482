use nalgebra::Vector3;

use crate::image_pipeline::color::space::{
    d50_white, lab_from_xyz, lchuv_from_luv, lsrgb_d65_from_xyz_d50, luv_from_lchuv,
    luv_from_xyz, xyy_from_xyz, xyz_from_lab, xyz_from_luv, xyz_from_xyy,
};
use crate::image_pipeline::render::kernel::ColorKernel;
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::expect_format;

pub fn run(dst: &mut Texture, kernel: ColorKernel) {
    expect_format("Color", dst, PixelFormat::Rgba32Float);
    let white = d50_white();
    match kernel {
        ColorKernel::XyyD50FromCamRaw { matrix } => map_rgb(dst, |rgb| xyy_from_xyz(matrix * rgb)),
        ColorKernel::Exposure { exposure } => {
            let gain = 2f64.powf(exposure as f64);
            map_rgb(dst, |xyy| Vector3::new(xyy.x, xyy.y, xyy.z * gain))
        }
        ColorKernel::XyzD50FromXyyD50 => map_rgb(dst, xyz_from_xyy),
        ColorKernel::LabD50FromXyzD50 => map_rgb(dst, |xyz| lab_from_xyz(xyz, white)),
        ColorKernel::Brightness { brightness } => {
            let offset = 100.0 * brightness as f64;
            map_rgb(dst, |lab| Vector3::new(lab.x + offset, lab.y, lab.z))
        }
        ColorKernel::Contrast { contrast } => {
            let gain = 1.0 + contrast as f64;
            map_rgb(dst, |lab| Vector3::new((lab.x - 50.0) * gain + 50.0, lab.y, lab.z))
        }
        ColorKernel::XyzD50FromLabD50 => map_rgb(dst, |lab| xyz_from_lab(lab, white)),
        ColorKernel::LuvD50FromXyzD50 => map_rgb(dst, |xyz| luv_from_xyz(xyz, white)),
        ColorKernel::LchuvFromLuv => map_rgb(dst, lchuv_from_luv),
        ColorKernel::Saturation { satpow } => {
            let satpow = satpow as f64;
            map_rgb(dst, |lch| Vector3::new(lch.x, lch.y * satpow, lch.z))
        }
        ColorKernel::LuvFromLchuv => map_rgb(dst, luv_from_lchuv),
        ColorKernel::XyzD50FromLuvD50 => map_rgb(dst, |luv| xyz_from_luv(luv, white)),
        ColorKernel::LsrgbD65FromXyzD50 => {
            let m = lsrgb_d65_from_xyz_d50();
            map_rgb(dst, |xyz| m * xyz)
        }
    }
}

/// Applies `f` to the first three channels of every pixel, in f64.
fn map_rgb(dst: &mut Texture, f: impl Fn(Vector3<f64>) -> Vector3<f64>) {
    for px in dst.data_mut().chunks_exact_mut(4) {
        let out = f(Vector3::new(px[0] as f64, px[1] as f64, px[2] as f64));
        px[0] = out.x as f32;
        px[1] = out.y as f32;
        px[2] = out.z as f32;
    }
}
