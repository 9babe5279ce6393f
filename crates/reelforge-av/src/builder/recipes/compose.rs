use reelforge_common::paths::is_subtitle_file;

use crate::builder::{filters, Invocation, RecipeContext};
use crate::error::BuildError;

const DEFAULT_PIP_SCALE: f64 = 0.25;
const DEFAULT_PIP_MARGIN: u32 = 16;

pub(crate) fn burn_subtitles(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let subs = ctx.secondary()?;
    if !is_subtitle_file(subs) {
        return Err(BuildError::invalid(
            "secondary",
            format!("{} is not a subtitle file", subs.display()),
        ));
    }
    inv.input(ctx.input()).arg("-vf").arg(filters::subtitles(subs));
    ctx.video_codec(inv, true)?;
    inv.args(["-c:a", "copy"]).output_arg();
    Ok(())
}

pub(crate) fn picture_in_picture(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let overlay = ctx.secondary()?;
    let scale = ctx.params.scale.unwrap_or(DEFAULT_PIP_SCALE);
    if !(scale.is_finite() && scale > 0.0 && scale < 1.0) {
        return Err(BuildError::invalid(
            "scale",
            format!("must be between 0 and 1, got {scale}"),
        ));
    }
    let graph = filters::picture_in_picture(
        scale,
        ctx.params.position.unwrap_or_default(),
        ctx.params.margin.unwrap_or(DEFAULT_PIP_MARGIN),
    );

    inv.input(ctx.input())
        .input(overlay)
        .arg("-filter_complex")
        .arg(graph)
        .args(["-map", "[v]", "-map", "0:a?"]);
    ctx.video_codec(inv, true)?;
    inv.args(["-c:a", "copy"]).output_arg();
    Ok(())
}
