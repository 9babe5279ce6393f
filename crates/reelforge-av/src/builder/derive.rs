//! Numeric parameters derived from media metadata.

use reelforge_common::MediaDescriptor;

use crate::error::BuildError;

/// Bytes per megabyte for size targets.
pub const BYTES_PER_MB: f64 = 1_000_000.0;

/// Duration of the input, or `MissingMetadata`. Zero counts as unknown.
pub fn require_duration(descriptor: &MediaDescriptor) -> Result<f64, BuildError> {
    descriptor
        .duration()
        .filter(|d| *d > 0.0)
        .ok_or_else(|| BuildError::missing_metadata("duration"))
}

/// Size of the input, or `MissingMetadata`. Zero counts as unknown.
pub fn require_size(descriptor: &MediaDescriptor) -> Result<u64, BuildError> {
    Some(descriptor.size_bytes())
        .filter(|s| *s > 0)
        .ok_or_else(|| BuildError::missing_metadata("size"))
}

/// A strictly positive, finite value.
pub fn positive(field: &'static str, value: f64) -> Result<f64, BuildError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(BuildError::invalid(field, format!("must be a positive number, got {value}")))
    }
}

/// Segment length that splits `duration` into `parts` equal pieces.
pub fn segment_for_parts(duration: f64, parts: u32) -> Result<f64, BuildError> {
    if parts == 0 {
        return Err(BuildError::invalid("parts", "must be at least 1"));
    }
    Ok(duration / f64::from(parts))
}

/// Segment length whose stream-copied size approximates `target_mb`.
pub fn segment_for_size(duration: f64, size_bytes: u64, target_mb: f64) -> Result<f64, BuildError> {
    let target_bytes = positive("target_size_mb", target_mb)? * BYTES_PER_MB;
    let size = size_bytes as f64;
    if target_bytes >= size {
        return Err(BuildError::invalid(
            "target_size_mb",
            format!(
                "target of {target_mb} MB is not smaller than the {:.1} MB source",
                size / BYTES_PER_MB
            ),
        ));
    }
    Ok(duration * target_bytes / size)
}

/// Frame rate that yields `count` frames over `duration`.
pub fn fps_for_count(duration: f64, count: u32, field: &'static str) -> Result<f64, BuildError> {
    if count == 0 {
        return Err(BuildError::invalid(field, "must be at least 1"));
    }
    Ok(f64::from(count) / duration)
}

/// Speed factor that stretches `duration` onto `target`.
pub fn fit_factor(duration: f64, target: f64) -> Result<f64, BuildError> {
    Ok(duration / positive("target_duration", target)?)
}

/// Fixed-precision seconds for argument lists.
pub fn secs(value: f64) -> String {
    format!("{value:.3}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use reelforge_common::MediaKind;

    fn video(size: u64, duration: Option<f64>) -> MediaDescriptor {
        let d = MediaDescriptor::new("/media/clip.mp4", MediaKind::Video, size);
        match duration {
            Some(secs) => d.with_duration(secs),
            None => d,
        }
    }

    #[test]
    fn four_parts_of_two_minutes() {
        let seg = segment_for_parts(120.0, 4).unwrap();
        assert_eq!(secs(seg), "30.000");
    }

    #[test]
    fn size_target_scales_duration() {
        let seg = segment_for_size(120.0, 100_000_000, 50.0).unwrap();
        assert_eq!(secs(seg), "60.000");
    }

    #[test]
    fn size_target_must_be_smaller_than_source() {
        assert_matches!(
            segment_for_size(120.0, 10_000_000, 50.0),
            Err(BuildError::InvalidParameter { field: "target_size_mb", .. })
        );
        assert_matches!(
            segment_for_size(120.0, 10_000_000, 0.0),
            Err(BuildError::InvalidParameter { field: "target_size_mb", .. })
        );
    }

    #[test]
    fn zero_parts_is_invalid() {
        assert_matches!(
            segment_for_parts(120.0, 0),
            Err(BuildError::InvalidParameter { field: "parts", .. })
        );
    }

    #[test]
    fn missing_or_zero_metadata() {
        assert_matches!(
            require_duration(&video(10, None)),
            Err(BuildError::MissingMetadata { field: "duration" })
        );
        assert_matches!(
            require_duration(&video(10, Some(0.0))),
            Err(BuildError::MissingMetadata { field: "duration" })
        );
        assert_eq!(require_duration(&video(10, Some(42.0))).unwrap(), 42.0);

        assert_matches!(
            require_size(&video(0, Some(42.0))),
            Err(BuildError::MissingMetadata { field: "size" })
        );
    }

    #[test]
    fn frame_rate_and_fit_factor() {
        assert!((fps_for_count(120.0, 12, "frame_count").unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(fit_factor(90.0, 60.0).unwrap(), 1.5);
        assert_matches!(
            fit_factor(90.0, -1.0),
            Err(BuildError::InvalidParameter { field: "target_duration", .. })
        );
    }
}
