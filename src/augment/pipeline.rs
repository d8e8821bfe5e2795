//! The default randomized augmentation pipeline.
//!
//! Every stage is gated by its own probability and draws its parameters from
//! the caller's RNG, so a seeded RNG reproduces the same outputs.

use image::{imageops, Rgb, RgbImage};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::ImageTransform;

#[derive(Debug, Clone, PartialEq)]
pub struct AugmentationPipeline {
    /// Rotate by a random multiple of 90 degrees.
    pub rotate90_p: f64,
    pub horizontal_flip_p: f64,
    pub vertical_flip_p: f64,
    pub brightness_contrast_p: f64,
    /// One of Gaussian noise or Gaussian blur.
    pub noise_or_blur_p: f64,
    /// One of an HSV shift or a per-channel RGB shift.
    pub color_shift_p: f64,
    pub shift_scale_rotate_p: f64,

    /// Brightness offset as a fraction of 255.
    pub brightness_limit: f32,
    pub contrast_limit: f32,
    /// Noise variance range, in 8-bit intensity units squared.
    pub noise_var: (f32, f32),
    pub blur_sigma: (f32, f32),
    /// Hue shift in OpenCV half-degrees (0..180 scale).
    pub hue_shift_limit: f32,
    pub sat_shift_limit: f32,
    pub val_shift_limit: f32,
    pub rgb_shift_limit: f32,
    /// Translation as a fraction of width/height.
    pub shift_limit: f32,
    pub scale_limit: f32,
    /// Degrees.
    pub rotate_limit: f32,
}

impl Default for AugmentationPipeline {
    fn default() -> Self {
        Self {
            rotate90_p: 0.5,
            horizontal_flip_p: 0.5,
            vertical_flip_p: 0.3,
            brightness_contrast_p: 0.4,
            noise_or_blur_p: 0.3,
            color_shift_p: 0.3,
            shift_scale_rotate_p: 0.5,
            brightness_limit: 0.2,
            contrast_limit: 0.2,
            noise_var: (10.0, 50.0),
            blur_sigma: (0.5, 1.5),
            hue_shift_limit: 20.0,
            sat_shift_limit: 30.0,
            val_shift_limit: 20.0,
            rgb_shift_limit: 20.0,
            shift_limit: 0.0625,
            scale_limit: 0.1,
            rotate_limit: 45.0,
        }
    }
}

impl ImageTransform for AugmentationPipeline {
    fn apply<R: Rng + ?Sized>(&self, image: &RgbImage, rng: &mut R) -> RgbImage {
        let mut out = image.clone();

        if hit(rng, self.rotate90_p) {
            out = match rng.random_range(0..4u8) {
                1 => imageops::rotate90(&out),
                2 => imageops::rotate180(&out),
                3 => imageops::rotate270(&out),
                _ => out,
            };
        }
        if hit(rng, self.horizontal_flip_p) {
            imageops::flip_horizontal_in_place(&mut out);
        }
        if hit(rng, self.vertical_flip_p) {
            imageops::flip_vertical_in_place(&mut out);
        }
        if hit(rng, self.brightness_contrast_p) {
            let alpha = 1.0 + symmetric(rng, self.contrast_limit);
            let beta = symmetric(rng, self.brightness_limit) * 255.0;
            brightness_contrast(&mut out, alpha, beta);
        }
        if hit(rng, self.noise_or_blur_p) {
            if rng.random_bool(0.5) {
                let var = uniform(rng, self.noise_var);
                gauss_noise(&mut out, var.sqrt(), rng);
            } else {
                let sigma = uniform(rng, self.blur_sigma);
                out = imageops::blur(&out, sigma);
            }
        }
        if hit(rng, self.color_shift_p) {
            if rng.random_bool(0.5) {
                let hue = symmetric(rng, self.hue_shift_limit);
                let sat = symmetric(rng, self.sat_shift_limit);
                let val = symmetric(rng, self.val_shift_limit);
                hsv_shift(&mut out, hue, sat, val);
            } else {
                let shift = [
                    symmetric(rng, self.rgb_shift_limit),
                    symmetric(rng, self.rgb_shift_limit),
                    symmetric(rng, self.rgb_shift_limit),
                ];
                rgb_shift(&mut out, shift);
            }
        }
        if hit(rng, self.shift_scale_rotate_p) {
            let dx = symmetric(rng, self.shift_limit);
            let dy = symmetric(rng, self.shift_limit);
            let scale = 1.0 + symmetric(rng, self.scale_limit);
            let angle = symmetric(rng, self.rotate_limit);
            out = shift_scale_rotate(&out, dx, dy, scale, angle);
        }

        out
    }
}

fn hit<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.random_bool(p.clamp(0.0, 1.0))
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, limit: f32) -> f32 {
    let limit = limit.abs();
    if limit == 0.0 {
        0.0
    } else {
        rng.random_range(-limit..=limit)
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, (low, high): (f32, f32)) -> f32 {
    if high > low {
        rng.random_range(low..=high)
    } else {
        low
    }
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub fn brightness_contrast(image: &mut RgbImage, alpha: f32, beta: f32) {
    for pixel in image.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = to_u8(*c as f32 * alpha + beta);
        }
    }
}

pub fn gauss_noise<R: Rng + ?Sized>(image: &mut RgbImage, std_dev: f32, rng: &mut R) {
    let Ok(normal) = Normal::new(0.0f32, std_dev) else {
        return;
    };
    for pixel in image.pixels_mut() {
        for c in pixel.0.iter_mut() {
            *c = to_u8(*c as f32 + normal.sample(rng));
        }
    }
}

pub fn rgb_shift(image: &mut RgbImage, shift: [f32; 3]) {
    for pixel in image.pixels_mut() {
        for (c, s) in pixel.0.iter_mut().zip(shift) {
            *c = to_u8(*c as f32 + s);
        }
    }
}

/// Hue in OpenCV half-degrees, saturation and value on the 0..255 scale.
pub fn hsv_shift(image: &mut RgbImage, hue: f32, sat: f32, val: f32) {
    for pixel in image.pixels_mut() {
        let [r, g, b] = pixel.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let h = (h + hue * 2.0).rem_euclid(360.0);
        let s = (s + sat / 255.0).clamp(0.0, 1.0);
        let v = (v + val / 255.0).clamp(0.0, 1.0);
        pixel.0 = hsv_to_rgb(h, s, v);
    }
}

/// (hue degrees, saturation 0..1, value 0..1)
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let s = if max == 0.0 { 0.0 } else { delta / max };
    (h, s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [
        to_u8((r + m) * 255.0),
        to_u8((g + m) * 255.0),
        to_u8((b + m) * 255.0),
    ]
}

/// Affine warp about the image centre: translate by (`dx`·w, `dy`·h), scale,
/// rotate by `angle` degrees. Borders are filled by reflect-101.
pub fn shift_scale_rotate(image: &RgbImage, dx: f32, dy: f32, scale: f32, angle: f32) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || scale <= 0.0 {
        return image.clone();
    }

    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let tx = dx * width as f32;
    let ty = dy * height as f32;
    let (sin, cos) = angle.to_radians().sin_cos();

    // Output pixel -> source position (inverse transform).
    RgbImage::from_fn(width, height, |x, y| {
        let ux = x as f32 - cx - tx;
        let uy = y as f32 - cy - ty;
        let sx = (cos * ux + sin * uy) / scale + cx;
        let sy = (-sin * ux + cos * uy) / scale + cy;
        sample_bilinear(image, sx, sy)
    })
}

fn reflect101(i: i64, n: u32) -> u32 {
    let n = n as i64;
    if n == 1 {
        return 0;
    }
    let period = 2 * n - 2;
    let i = i.rem_euclid(period);
    (if i >= n { period - i } else { i }) as u32
}

fn sample_bilinear(image: &RgbImage, x: f32, y: f32) -> Rgb<u8> {
    let (width, height) = image.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let xs = [
        reflect101(x0 as i64, width),
        reflect101(x0 as i64 + 1, width),
    ];
    let ys = [
        reflect101(y0 as i64, height),
        reflect101(y0 as i64 + 1, height),
    ];

    let mut out = [0u8; 3];
    for (channel, value) in out.iter_mut().enumerate() {
        let p = |xi: u32, yi: u32| image.get_pixel(xi, yi).0[channel] as f32;
        let top = p(xs[0], ys[0]) * (1.0 - fx) + p(xs[1], ys[0]) * fx;
        let bottom = p(xs[0], ys[1]) * (1.0 - fx) + p(xs[1], ys[1]) * fx;
        *value = to_u8(top * (1.0 - fy) + bottom * fy);
    }
    Rgb(out)
}
