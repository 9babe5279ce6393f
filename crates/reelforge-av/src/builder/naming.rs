//! Output path derivation.
//!
//! Names are `<stem><suffix>[<counter>].<ext>`. When the name is taken an
//! incrementing `_N` is appended before the extension until a free name is
//! found. Numbered templates are checked by expanding their first index.
//! A literal `%` in a template name is written `%%`.

use std::path::{Path, PathBuf};

/// Upper bound on collision probing before giving up and reusing the last candidate.
const MAX_ATTEMPTS: u32 = 10_000;

/// Resolve a free output path in `dir`.
pub fn resolve_output(
    dir: &Path,
    stem: &str,
    suffix: &str,
    counter: Option<&str>,
    ext: &str,
) -> PathBuf {
    let mut candidate = dir.join(file_name(stem, suffix, counter, None, ext));
    for n in 1..=MAX_ATTEMPTS {
        if !is_taken(&candidate, counter.is_some()) {
            return candidate;
        }
        candidate = dir.join(file_name(stem, suffix, counter, Some(n), ext));
    }
    tracing::warn!(path = %candidate.display(), "no free output name found");
    candidate
}

fn file_name(stem: &str, suffix: &str, counter: Option<&str>, n: Option<u32>, ext: &str) -> String {
    let mut name = match counter {
        Some(counter) => format!("{}{counter}", escape(&format!("{stem}{suffix}"))),
        None => format!("{stem}{suffix}"),
    };
    if let Some(n) = n {
        name.push_str(&format!("_{n}"));
    }
    name.push('.');
    name.push_str(ext);
    name
}

fn escape(literal: &str) -> String {
    literal.replace('%', "%%")
}

fn unescape(template: &str) -> String {
    template.replace("%%", "%")
}

fn is_taken(candidate: &Path, numbered: bool) -> bool {
    if !numbered {
        return candidate.exists();
    }
    // Segment muxers count from 0, image sequences from 1.
    [0, 1]
        .into_iter()
        .filter_map(|index| expand_template(candidate, index))
        .any(|p| p.exists())
}

/// Substitute `index` for the first `%0Nd` directive in the file name.
pub fn expand_template(template: &Path, index: u32) -> Option<PathBuf> {
    let name = template.file_name()?.to_str()?;
    let (prefix, width, rest) = split_directive(name)?;
    let expanded = format!("{prefix}{index:0width$}{rest}");
    Some(template.with_file_name(expanded))
}

/// Whether `candidate` is a file produced from the numbered `template`.
pub fn matches_template(template: &str, candidate: &str) -> bool {
    let Some((prefix, _, rest)) = split_directive(template) else {
        return template == candidate;
    };
    candidate
        .strip_prefix(prefix.as_str())
        .and_then(|c| c.strip_suffix(rest.as_str()))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Split at the first `%0Nd`, skipping `%%`. Prefix and rest come back unescaped.
fn split_directive(name: &str) -> Option<(String, usize, String)> {
    let bytes = name.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'%') {
            i += 2;
            continue;
        }
        let tail = &name[i + 1..];
        let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
        if tail.as_bytes().get(digits) != Some(&b'd') {
            return None;
        }
        let width = tail[..digits].trim_start_matches('0').parse().unwrap_or(1);
        return Some((unescape(&name[..i]), width, unescape(&tail[digits + 1..])));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn plain_name() {
        let dir = TempDir::new().unwrap();
        let out = resolve_output(dir.path(), "clip", "_trimmed", None, "mp4");
        assert_eq!(out, dir.path().join("clip_trimmed.mp4"));
    }

    #[test]
    fn collisions_increment() {
        let dir = TempDir::new().unwrap();
        let first = resolve_output(dir.path(), "clip", "_trimmed", None, "mp4");
        std::fs::write(&first, b"x").unwrap();

        let second = resolve_output(dir.path(), "clip", "_trimmed", None, "mp4");
        assert_eq!(second, dir.path().join("clip_trimmed_1.mp4"));
        std::fs::write(&second, b"x").unwrap();

        let third = resolve_output(dir.path(), "clip", "_trimmed", None, "mp4");
        assert_eq!(third, dir.path().join("clip_trimmed_2.mp4"));
    }

    #[test]
    fn numbered_collision_checks_first_index() {
        let dir = TempDir::new().unwrap();
        let template = resolve_output(dir.path(), "clip", "_part", Some("%03d"), "mp4");
        assert_eq!(template, dir.path().join("clip_part%03d.mp4"));

        std::fs::write(dir.path().join("clip_part000.mp4"), b"x").unwrap();
        let next = resolve_output(dir.path(), "clip", "_part", Some("%03d"), "mp4");
        assert_eq!(next, dir.path().join("clip_part%03d_1.mp4"));
    }

    #[test]
    fn image_sequences_start_at_one() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("clip_frame0001.png"), b"x").unwrap();
        let next = resolve_output(dir.path(), "clip", "_frame", Some("%04d"), "png");
        assert_eq!(next, dir.path().join("clip_frame%04d_1.png"));
    }

    #[test]
    fn expand_and_match() {
        let t = Path::new("/out/clip_part%03d.mp4");
        assert_eq!(
            expand_template(t, 7).unwrap(),
            PathBuf::from("/out/clip_part007.mp4")
        );
        assert!(matches_template("clip_part%03d.mp4", "clip_part012.mp4"));
        assert!(!matches_template("clip_part%03d.mp4", "clip_part.mp4"));
        assert!(!matches_template("clip_part%03d.mp4", "clip_partABC.mp4"));
        assert!(!matches_template("clip_part%03d.mp4", "other_part001.mp4"));
        assert!(expand_template(Path::new("/out/plain.mp4"), 1).is_none());
    }

    #[test]
    fn percent_in_stem_is_escaped_in_templates() {
        let dir = TempDir::new().unwrap();
        let template = resolve_output(dir.path(), "50%done", "_part", Some("%03d"), "mp4");
        assert_eq!(template, dir.path().join("50%%done_part%03d.mp4"));
        assert_eq!(
            expand_template(&template, 0).unwrap(),
            dir.path().join("50%done_part000.mp4")
        );
        assert!(matches_template("50%%done_part%03d.mp4", "50%done_part004.mp4"));
        assert!(!matches_template("50%%done_part%03d.mp4", "50%%done_part004.mp4"));

        std::fs::write(dir.path().join("50%done_part000.mp4"), b"x").unwrap();
        let next = resolve_output(dir.path(), "50%done", "_part", Some("%03d"), "mp4");
        assert_eq!(next, dir.path().join("50%%done_part%03d_1.mp4"));
    }

    #[test]
    fn percent_in_plain_name_stays_literal() {
        let dir = TempDir::new().unwrap();
        let out = resolve_output(dir.path(), "50%done", "_trimmed", None, "mp4");
        assert_eq!(out, dir.path().join("50%done_trimmed.mp4"));
    }
}
