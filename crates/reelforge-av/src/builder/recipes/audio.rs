use crate::builder::{filters, Invocation, RecipeContext};
use crate::error::BuildError;

use super::required;

const DEFAULT_MIX_LEVEL: f64 = 0.3;
const LOUDNORM: &str = "loudnorm=I=-16:TP=-1.5:LRA=11";

/// Audio filter with video stream-copied when present.
fn audio_filtered(ctx: &RecipeContext<'_>, inv: &mut Invocation, filter: &str) {
    inv.input(ctx.input()).arg("-af").arg(filter);
    if ctx.is_video() {
        inv.args(["-c:v", "copy"]);
    }
    ctx.audio_codec(inv);
    inv.output_arg();
}

pub(crate) fn remove(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    inv.input(ctx.input())
        .args(["-map", "0", "-map", "-0:a", "-c", "copy"])
        .output_arg();
    Ok(())
}

pub(crate) fn replace(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let track = ctx.secondary()?;
    inv.input(ctx.input())
        .input(track)
        .args(["-map", "0:v", "-map", "1:a:0", "-c:v", "copy"])
        .args(ctx.settings.encoder.aac_args())
        .arg("-shortest")
        .output_arg();
    Ok(())
}

pub(crate) fn mix(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let background = ctx.secondary()?;
    let level = ctx.params.mix_level.unwrap_or(DEFAULT_MIX_LEVEL);
    if !(level.is_finite() && level > 0.0 && level <= 1.0) {
        return Err(BuildError::invalid(
            "mix_level",
            format!("must be in (0, 1], got {level}"),
        ));
    }
    let graph = format!(
        "[1:a]volume={level}[bg];[0:a][bg]amix=inputs=2:duration=first:dropout_transition=2[a]"
    );

    inv.input(ctx.input())
        .input(background)
        .arg("-filter_complex")
        .arg(graph)
        .args(["-map", "0:v?", "-map", "[a]"]);
    if ctx.is_video() {
        inv.args(["-c:v", "copy"]);
    }
    ctx.audio_codec(inv);
    inv.output_arg();
    Ok(())
}

pub(crate) fn normalize(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    audio_filtered(ctx, inv, LOUDNORM);
    Ok(())
}

pub(crate) fn volume(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let db = required(ctx.params.volume_db, "volume_db")?;
    if !db.is_finite() {
        return Err(BuildError::invalid("volume_db", "must be a finite number"));
    }
    audio_filtered(ctx, inv, &format!("volume={db}dB"));
    Ok(())
}

pub(crate) fn clean_voice(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let model = ctx.asset()?;
    audio_filtered(ctx, inv, &filters::rnnoise(model));
    Ok(())
}
