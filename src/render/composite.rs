use crate::{
    assets::decode::resolve,
    combine::combination::{Combination, Pick},
    foundation::core::{Canvas, Raster},
    foundation::error::{LayermixError, LayermixResult},
    render::blend::{over_in_place, resolve_to_rgba8},
};

/// Render one combination onto a transparent canvas.
///
/// Picks are blended back to front by ascending group order, regardless of their order in
/// the combination. Every variant raster must match the canvas exactly; nothing is moved or
/// scaled. The result depends only on the picks and the canvas.
#[tracing::instrument(skip(combination), fields(id = combination.id, layers = combination.len()))]
pub fn composite(combination: &Combination<'_>, canvas: Canvas) -> LayermixResult<Raster> {
    composite_picks(&combination.picks, canvas)
}

/// Slice form of [`composite`].
pub fn composite_picks(picks: &[Pick<'_>], canvas: Canvas) -> LayermixResult<Raster> {
    canvas.validate()?;
    let mut ordered: Vec<&Pick<'_>> = picks.iter().collect();
    ordered.sort_by_key(|p| p.group.order);

    let mut acc = vec![0f32; canvas.rgba8_len()?];
    for pick in ordered {
        let raster = resolve(&pick.variant.source)?;
        if !raster.fits(canvas) {
            return Err(LayermixError::composite(format!(
                "layer '{}' variant '{}' is {}x{}, canvas is {}x{}",
                pick.group.name,
                pick.variant.id,
                raster.width,
                raster.height,
                canvas.width,
                canvas.height
            )));
        }
        over_in_place(&mut acc, &raster.data)?;
    }

    Raster::from_rgba8(canvas.width, canvas.height, resolve_to_rgba8(&acc))
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
