use crate::builder::derive::{self, positive};
use crate::builder::{filters, Invocation, RecipeContext};
use crate::error::BuildError;
use crate::params::FlipAxis;

use super::required;

const DEFAULT_FONT_SIZE: u32 = 36;
const DEFAULT_MARGIN: u32 = 24;
const DEFAULT_FADE_SECONDS: f64 = 1.0;

/// Single video filter, audio passed through.
fn filtered(ctx: &RecipeContext<'_>, inv: &mut Invocation, filter: &str) -> Result<(), BuildError> {
    inv.input(ctx.input()).arg("-vf").arg(filter);
    ctx.video_codec(inv, true)?;
    inv.args(["-c:a", "copy"]).output_arg();
    Ok(())
}

pub(crate) fn resize(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let width = required(ctx.params.width, "width")?;
    let height = required(ctx.params.height, "height")?;
    if width == 0 {
        return Err(BuildError::invalid("width", "must be greater than zero"));
    }
    if height == 0 {
        return Err(BuildError::invalid("height", "must be greater than zero"));
    }
    filtered(ctx, inv, &filters::scale_pad(width, height))
}

pub(crate) fn vertical_crop(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    filtered(ctx, inv, &filters::vertical_crop())
}

pub(crate) fn rotate(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let degrees = required(ctx.params.rotation, "rotation")?;
    let filter = filters::transpose(degrees).ok_or_else(|| {
        BuildError::invalid("rotation", format!("must be 90, 180 or 270, got {degrees}"))
    })?;
    filtered(ctx, inv, filter)
}

pub(crate) fn flip(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let filter = match required(ctx.params.flip, "flip")? {
        FlipAxis::Horizontal => "hflip",
        FlipAxis::Vertical => "vflip",
    };
    filtered(ctx, inv, filter)
}

pub(crate) fn denoise(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    filtered(ctx, inv, filters::denoise())
}

pub(crate) fn watermark(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let text = required(ctx.params.text.as_deref(), "text")?;
    if text.trim().is_empty() {
        return Err(BuildError::invalid("text", "must not be empty"));
    }
    let filter = filters::drawtext(
        text,
        ctx.params.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        ctx.params.position.unwrap_or_default(),
        ctx.params.margin.unwrap_or(DEFAULT_MARGIN),
    );
    filtered(ctx, inv, &filter)
}

pub(crate) fn fade(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let fade = positive(
        "fade_seconds",
        ctx.params.fade_seconds.unwrap_or(DEFAULT_FADE_SECONDS),
    )?;
    let duration = derive::require_duration(ctx.descriptor)?;
    if fade * 2.0 > duration {
        return Err(BuildError::invalid(
            "fade_seconds",
            format!("{fade}s fades do not fit into a {duration}s clip"),
        ));
    }
    let out_start = duration - fade;

    inv.input(ctx.input());
    if ctx.is_video() {
        inv.arg("-vf").arg(filters::fade_video(fade, out_start));
        ctx.video_codec(inv, true)?;
    }
    inv.arg("-af").arg(filters::fade_audio(fade, out_start));
    ctx.audio_codec(inv);
    inv.output_arg();
    Ok(())
}
