use crate::builder::derive::{self, positive, secs};
use crate::builder::{filters, tempo, Invocation, RecipeContext};
use crate::error::BuildError;

use super::{count, required};

pub(crate) fn trim(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let p = ctx.params;
    if p.start.is_none() && p.end.is_none() {
        return Err(BuildError::invalid("start", "trim needs a start or an end"));
    }
    let start = p.start.unwrap_or(0.0);
    if !start.is_finite() || start < 0.0 {
        return Err(BuildError::invalid("start", format!("must be zero or more, got {start}")));
    }
    if let Some(duration) = ctx.descriptor.duration() {
        if start >= duration {
            return Err(BuildError::invalid(
                "start",
                format!("{start}s is beyond the {duration}s input"),
            ));
        }
    }
    let length = match p.end {
        Some(end) if !end.is_finite() || end <= start => {
            return Err(BuildError::invalid("end", format!("must be after start ({start}s)")));
        }
        Some(end) => Some(end - start),
        None => None,
    };

    inv.arg("-ss").arg(secs(start)).input(ctx.input());
    if let Some(length) = length {
        inv.arg("-t").arg(secs(length));
    }
    inv.args(["-map", "0", "-c", "copy", "-avoid_negative_ts", "make_zero"])
        .output_arg();

    let remaining = ctx.descriptor.duration().map(|d| d - start);
    inv.set_progress_duration(match (length, remaining) {
        (Some(l), Some(r)) => Some(l.min(r)),
        (l, r) => l.or(r),
    });
    Ok(())
}

pub(crate) fn split_parts(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let parts = count(ctx.params.parts, "parts")?;
    let duration = derive::require_duration(ctx.descriptor)?;
    let segment = derive::segment_for_parts(duration, parts)?;
    segment_args(ctx, inv, segment);
    Ok(())
}

pub(crate) fn split_size(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let target = required(ctx.params.target_size_mb, "target_size_mb")?;
    positive("target_size_mb", target)?;
    let duration = derive::require_duration(ctx.descriptor)?;
    let size = derive::require_size(ctx.descriptor)?;
    let segment = derive::segment_for_size(duration, size, target)?;
    segment_args(ctx, inv, segment);
    Ok(())
}

fn segment_args(ctx: &RecipeContext<'_>, inv: &mut Invocation, segment: f64) {
    inv.input(ctx.input())
        .args(["-map", "0", "-c", "copy", "-f", "segment"])
        .arg("-segment_time").arg(secs(segment))
        .args(["-reset_timestamps", "1"])
        .output_arg();
}

pub(crate) fn merge(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    if ctx.params.clips.is_empty() {
        return Err(BuildError::MissingSecondaryInput);
    }
    let list = filters::concat_list(
        std::iter::once(ctx.input()).chain(ctx.params.clips.iter().map(|p| p.as_path())),
    );
    let file_name = inv
        .output()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merge".to_string());
    let list_path = ctx.settings.staging_dir.join(format!("{file_name}.concat.txt"));

    inv.args(["-f", "concat", "-safe", "0", "-i"])
        .arg(list_path.to_string_lossy())
        .args(["-map", "0", "-c", "copy"])
        .output_arg();
    // Clip durations are unknown here.
    inv.stage(list_path, list).set_progress_duration(None);
    Ok(())
}

/// `loop_count` extra plays after the first.
pub(crate) fn repeat(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let extra = count(ctx.params.loop_count, "loop_count")?;
    let plays = extra
        .checked_add(1)
        .ok_or_else(|| BuildError::invalid("loop_count", format!("{extra} is too large")))?;
    inv.arg("-stream_loop").arg(extra.to_string())
        .input(ctx.input())
        .args(["-map", "0", "-c", "copy"])
        .output_arg()
        .set_progress_duration(ctx.descriptor.duration().map(|d| d * f64::from(plays)));
    Ok(())
}

pub(crate) fn reverse(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    inv.input(ctx.input());
    if ctx.is_video() {
        // Audio is optional on video inputs.
        inv.args(["-map", "0:v", "-map", "0:a?", "-vf", "reverse"]);
        ctx.video_codec(inv, true)?;
    }
    inv.args(["-af", "areverse"]);
    ctx.audio_codec(inv);
    inv.output_arg();
    Ok(())
}

pub(crate) fn speed(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let factor = positive("speed", required(ctx.params.speed, "speed")?)?;
    retime(ctx, inv, factor)?;
    inv.set_progress_duration(ctx.descriptor.duration().map(|d| d / factor));
    Ok(())
}

pub(crate) fn fit_duration(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let target = positive(
        "target_duration",
        required(ctx.params.target_duration, "target_duration")?,
    )?;
    let duration = derive::require_duration(ctx.descriptor)?;
    let factor = derive::fit_factor(duration, target)?;
    retime(ctx, inv, factor)?;
    inv.set_progress_duration(Some(target));
    Ok(())
}

fn retime(ctx: &RecipeContext<'_>, inv: &mut Invocation, factor: f64) -> Result<(), BuildError> {
    let atempo = tempo::atempo_chain(factor)?;
    inv.input(ctx.input());
    if ctx.is_video() {
        inv.arg("-filter:v").arg(format!("setpts=PTS/{factor}"));
        ctx.video_codec(inv, true)?;
    }
    inv.arg("-filter:a").arg(atempo);
    ctx.audio_codec(inv);
    inv.output_arg();
    Ok(())
}

pub(crate) fn summary(ctx: &RecipeContext<'_>, inv: &mut Invocation) -> Result<(), BuildError> {
    let clips = count(ctx.params.clip_count, "clip_count")?;
    let clip = positive(
        "clip_seconds",
        required(ctx.params.clip_seconds, "clip_seconds")?,
    )?;
    let duration = derive::require_duration(ctx.descriptor)?;
    let interval = duration / f64::from(clips);
    if clip >= interval {
        return Err(BuildError::invalid(
            "clip_seconds",
            format!(
                "{clip}s clips do not fit {clips} times into {duration}s (interval {})",
                secs(interval)
            ),
        ));
    }

    let (video, audio) = filters::summary_select(interval, clip);
    inv.input(ctx.input()).arg("-vf").arg(video);
    ctx.video_codec(inv, true)?;
    inv.arg("-af").arg(audio);
    ctx.audio_codec(inv);
    inv.output_arg()
        .set_progress_duration(Some(clip * f64::from(clips)));
    Ok(())
}
