//! Filter-graph templates.
//!
//! Each function renders one family of filter expression. Values are inserted
//! as-is; paths and free text go through the escaping helpers first.

use std::path::Path;

use crate::params::Corner;

use super::derive::secs;

/// Scale to fit inside `width`x`height`, then letterbox to exactly that size.
pub fn scale_pad(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1"
    )
}

/// Center crop to 9:16 and scale to 1080x1920.
pub fn vertical_crop() -> String {
    "crop='min(iw,ih*9/16)':'min(ih,iw*16/9)',scale=1080:1920,setsar=1".to_string()
}

/// Two-pass palette GIF in a single graph.
pub fn gif_palette(fps: f64, width: u32) -> String {
    format!(
        "fps={fps},scale={width}:-1:flags=lanczos,split[s0][s1];\
         [s0]palettegen[p];[s1][p]paletteuse"
    )
}

/// Grid of evenly spaced frames.
pub fn contact_sheet(fps: f64, columns: u32, rows: u32, tile_width: u32) -> String {
    format!("fps={fps},scale={tile_width}:-1,tile={columns}x{rows}:padding=4:margin=4")
}

/// Overlay input 1, scaled by `scale`, on input 0 at `corner`.
pub fn picture_in_picture(scale: f64, corner: Corner, margin: u32) -> String {
    let (x, y) = overlay_position(corner, margin, "W", "H", "w", "h");
    format!("[1:v]scale=iw*{scale}:-1[pip];[0:v][pip]overlay={x}:{y}[v]")
}

pub fn transpose(rotation: i32) -> Option<&'static str> {
    match rotation.rem_euclid(360) {
        90 => Some("transpose=1"),
        180 => Some("transpose=1,transpose=1"),
        270 => Some("transpose=2"),
        _ => None,
    }
}

pub fn drawtext(text: &str, font_size: u32, corner: Corner, margin: u32) -> String {
    let (x, y) = overlay_position(corner, margin, "w", "h", "tw", "th");
    format!(
        "drawtext=text={}:expansion=none:fontsize={font_size}:fontcolor=white@0.8:\
         box=1:boxcolor=black@0.4:boxborderw=8:x={x}:y={y}",
        escape_value(text)
    )
}

pub fn subtitles(path: &Path) -> String {
    format!("subtitles={}", escape_path(path))
}

pub fn fade_video(fade: f64, out_start: f64) -> String {
    format!(
        "fade=t=in:st=0:d={f},fade=t=out:st={s}:d={f}",
        f = secs(fade),
        s = secs(out_start)
    )
}

pub fn fade_audio(fade: f64, out_start: f64) -> String {
    format!(
        "afade=t=in:st=0:d={f},afade=t=out:st={s}:d={f}",
        f = secs(fade),
        s = secs(out_start)
    )
}

/// Keep `clip` seconds out of every `interval`, for video and audio.
pub fn summary_select(interval: f64, clip: f64) -> (String, String) {
    let cond = format!("lt(mod(t,{}),{})", secs(interval), secs(clip));
    (
        format!("select='{cond}',setpts=N/FRAME_RATE/TB"),
        format!("aselect='{cond}',asetpts=N/SR/TB"),
    )
}

pub fn waveform(width: u32, height: u32) -> String {
    format!("showwavespic=s={width}x{height}:split_channels=1")
}

pub fn denoise() -> &'static str {
    "hqdn3d=4:3:6:4.5"
}

pub fn rnnoise(model: &Path) -> String {
    format!("arnndn=m={}", escape_path(model))
}

pub fn whisper(model: &Path, language: &str, destination: &Path) -> String {
    format!(
        "whisper=model={}:language={}:queue=3:destination={}:format=srt",
        escape_path(model),
        escape_value(language),
        escape_path(destination)
    )
}

/// Concat demuxer list: one quoted `file` line per clip.
pub fn concat_list<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
    paths
        .into_iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
        .collect()
}

fn overlay_position(
    corner: Corner,
    margin: u32,
    outer_w: &str,
    outer_h: &str,
    inner_w: &str,
    inner_h: &str,
) -> (String, String) {
    let right = format!("{outer_w}-{inner_w}-{margin}");
    let bottom = format!("{outer_h}-{inner_h}-{margin}");
    let m = margin.to_string();
    match corner {
        Corner::TopLeft => (m.clone(), m),
        Corner::TopRight => (right, m),
        Corner::BottomLeft => (m, bottom),
        Corner::BottomRight => (right, bottom),
        Corner::Center => (
            format!("({outer_w}-{inner_w})/2"),
            format!("({outer_h}-{inner_h})/2"),
        ),
    }
}

/// Escape an option value, then the result for the filter-graph level.
fn escape_value(value: &str) -> String {
    let mut level1 = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            level1.push('\\');
        }
        level1.push(c);
    }
    let mut level2 = String::with_capacity(level1.len());
    for c in level1.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            level2.push('\\');
        }
        level2.push(c);
    }
    level2
}

fn escape_path(path: &Path) -> String {
    escape_value(&path.to_string_lossy())
}
