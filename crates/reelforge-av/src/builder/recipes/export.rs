use crate::builder::derive::{self, positive, secs};
use crate::builder::{filters, Invocation, RecipeContext};
use crate::error::BuildError;

use super::{count, count_or, required};

const GIF_FPS: f64 = 12.0;
const GIF_WIDTH: u32 = 480;
const SHEET_COLUMNS: u32 = 4;
const SHEET_ROWS: u32 = 4;
const SHEET_TILE_WIDTH: u32 = 320;
const WAVEFORM_WIDTH: u32 = 1920;
const WAVEFORM_HEIGHT: u32 = 480;

pub(crate) fn gif(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let fps = positive("fps", ctx.params.fps.unwrap_or(GIF_FPS))?;
    let width = count_or(ctx.params.width, GIF_WIDTH, "width")?;
    inv.input(ctx.input())
        .arg("-vf")
        .arg(filters::gif_palette(fps, width))
        .args(["-loop", "0"])
        .output_arg();
    Ok(())
}

pub(crate) fn contact_sheet(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let columns = count_or(ctx.params.columns, SHEET_COLUMNS, "columns")?;
    let rows = count_or(ctx.params.rows, SHEET_ROWS, "rows")?;
    let tile_width = count_or(ctx.params.width, SHEET_TILE_WIDTH, "width")?;
    let duration = derive::require_duration(ctx.descriptor)?;
    let tiles = columns.checked_mul(rows).ok_or_else(|| {
        BuildError::invalid("columns", format!("{columns}x{rows} tiles is too many"))
    })?;
    let fps = derive::fps_for_count(duration, tiles, "columns")?;

    inv.input(ctx.input())
        .arg("-vf")
        .arg(filters::contact_sheet(fps, columns, rows, tile_width))
        .args(["-frames:v", "1", "-q:v", "3", "-an"])
        .output_arg();
    Ok(())
}

pub(crate) fn frames_count(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let frames = count(ctx.params.frame_count, "frame_count")?;
    let duration = derive::require_duration(ctx.descriptor)?;
    let fps = derive::fps_for_count(duration, frames, "frame_count")?;
    inv.input(ctx.input())
        .arg("-vf")
        .arg(format!("fps={fps}"))
        .arg("-frames:v")
        .arg(frames.to_string())
        .arg("-an")
        .output_arg();
    Ok(())
}

pub(crate) fn frames_interval(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let interval = positive(
        "interval_seconds",
        required(ctx.params.interval_seconds, "interval_seconds")?,
    )?;
    inv.input(ctx.input())
        .arg("-vf")
        .arg(format!("fps=1/{interval}"))
        .arg("-an")
        .output_arg();
    Ok(())
}

pub(crate) fn thumbnail(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let at = match ctx.params.timestamp {
        Some(t) => {
            if !t.is_finite() || t < 0.0 {
                return Err(BuildError::invalid("timestamp", format!("must be zero or more, got {t}")));
            }
            if let Some(duration) = ctx.descriptor.duration().filter(|d| t >= *d) {
                return Err(BuildError::invalid(
                    "timestamp",
                    format!("{t}s is beyond the {duration}s input"),
                ));
            }
            t
        }
        None => derive::require_duration(ctx.descriptor)? / 2.0,
    };
    inv.arg("-ss")
        .arg(secs(at))
        .input(ctx.input())
        .args(["-frames:v", "1", "-q:v", "2", "-an"])
        .output_arg()
        // Single frame: no meaningful timeline to report against.
        .set_progress_duration(None);
    Ok(())
}

pub(crate) fn waveform(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let width = count_or(ctx.params.width, WAVEFORM_WIDTH, "width")?;
    let height = count_or(ctx.params.height, WAVEFORM_HEIGHT, "height")?;
    inv.input(ctx.input())
        .arg("-filter_complex")
        .arg(format!("[0:a]{}", filters::waveform(width, height)))
        .args(["-frames:v", "1"])
        .output_arg();
    Ok(())
}

/// The filter writes the subtitle file itself; the muxed stream is discarded.
pub(crate) fn transcribe(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let model = ctx.asset()?;
    let language = ctx.params.language.as_deref().unwrap_or("auto");
    let filter = filters::whisper(model, language, inv.output());
    inv.input(ctx.input())
        .arg("-vn")
        .arg("-af")
        .arg(filter)
        .args(["-f", "null", "-"]);
    Ok(())
}
