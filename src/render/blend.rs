use crate::foundation::error::{LayermixError, LayermixResult};

/// Premultiplied RGBA in `[0, 1]`.
pub type PremulRgbaF32 = [f32; 4];

const INV_255: f32 = 1.0 / 255.0;

/// Convert a straight-alpha RGBA8 pixel into premultiplied float.
pub fn premultiply(px: [u8; 4]) -> PremulRgbaF32 {
    let a = f32::from(px[3]) * INV_255;
    [
        f32::from(px[0]) * INV_255 * a,
        f32::from(px[1]) * INV_255 * a,
        f32::from(px[2]) * INV_255 * a,
        a,
    ]
}

/// Convert a premultiplied float pixel back to straight-alpha RGBA8, rounding to nearest.
pub fn unpremultiply(px: PremulRgbaF32) -> [u8; 4] {
    let a = px[3].clamp(0.0, 1.0);
    let alpha = to_u8(a);
    if alpha == 0 {
        return [0, 0, 0, 0];
    }
    let inv = 1.0 / a;
    [
        to_u8(px[0] * inv),
        to_u8(px[1] * inv),
        to_u8(px[2] * inv),
        alpha,
    ]
}

/// Porter-Duff source-over: `out = src + dst * (1 - src.a)`.
pub fn over(dst: PremulRgbaF32, src: PremulRgbaF32) -> PremulRgbaF32 {
    let inv = 1.0 - src[3];
    [
        src[0] + dst[0] * inv,
        src[1] + dst[1] * inv,
        src[2] + dst[2] * inv,
        src[3] + dst[3] * inv,
    ]
}

/// Blend a straight-alpha RGBA8 layer over a premultiplied float accumulator.
///
/// `dst` holds one `f32` per channel, so it is exactly as long as `src`.
pub fn over_in_place(dst: &mut [f32], src: &[u8]) -> LayermixResult<()> {
    if dst.len() != src.len() || !src.len().is_multiple_of(4) {
        return Err(LayermixError::composite(
            "over_in_place expects an accumulator matching the rgba8 layer",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        match s[3] {
            0 => {}
            255 => {
                let p = premultiply([s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&p);
            }
            _ => {
                let out = over(
                    [d[0], d[1], d[2], d[3]],
                    premultiply([s[0], s[1], s[2], s[3]]),
                );
                d.copy_from_slice(&out);
            }
        }
    }
    Ok(())
}

/// Flatten a premultiplied float accumulator into straight-alpha RGBA8 bytes.
pub fn resolve_to_rgba8(acc: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(acc.len());
    for px in acc.chunks_exact(4) {
        out.extend_from_slice(&unpremultiply([px[0], px[1], px[2], px[3]]));
    }
    out
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
