//! Progress extraction from the tool's periodic stats line.
//!
//! Only `time=HH:MM:SS.ss` markers are recognised. `time=N/A`, negative
//! times and `out_time=` lines from `-progress` output are ignored.

use std::sync::LazyLock;

use regex::Regex;

static TIME_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)time=(\d{2,}):([0-5]\d):([0-5]\d(?:\.\d+)?)").unwrap()
});

/// Seconds of output processed, if `line` carries a time marker.
pub fn parse_time_marker(line: &str) -> Option<f64> {
    let caps = TIME_MARKER.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Turns time markers into monotonically non-decreasing fractions.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    duration: Option<f64>,
    last: f64,
}

impl ProgressTracker {
    /// `duration` of the output timeline; `None` or zero disables reporting.
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
            last: 0.0,
        }
    }

    /// Whether `line` is a stats line, regardless of whether it advanced progress.
    pub fn is_marker(line: &str) -> bool {
        TIME_MARKER.is_match(line)
    }

    /// The new fraction in `[0, 1]` when `line` advances progress.
    pub fn observe(&mut self, line: &str) -> Option<f64> {
        let duration = self.duration?;
        let processed = parse_time_marker(line)?;
        let fraction = (processed / duration).clamp(0.0, 1.0);
        if fraction > self.last {
            self.last = fraction;
            Some(fraction)
        } else {
            None
        }
    }

    pub fn last(&self) -> f64 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str =
        "frame=  240 fps= 60 q=28.0 size=    1024kB time=00:01:00.00 bitrate= 139.8kbits/s speed=2.01x";

    #[test]
    fn parses_stats_line() {
        assert_eq!(parse_time_marker(STATS), Some(60.0));
        assert_eq!(parse_time_marker("time=01:02:03.5"), Some(3723.5));
        assert_eq!(parse_time_marker("size=1kB time=00:00:07 bitrate=1"), Some(7.0));
    }

    #[test]
    fn ignores_other_shapes() {
        assert_eq!(parse_time_marker("size=N/A time=N/A bitrate=N/A"), None);
        assert_eq!(parse_time_marker("time=-00:00:00.04"), None);
        assert_eq!(parse_time_marker("out_time=00:00:05.000000"), None);
        assert_eq!(parse_time_marker("time=5.0"), None);
        assert_eq!(parse_time_marker("Duration: 00:02:00.00, start: 0.000000"), None);
    }

    #[test]
    fn sixty_of_one_twenty_is_half() {
        let mut tracker = ProgressTracker::new(Some(120.0));
        assert_eq!(tracker.observe(STATS), Some(0.5));
    }

    #[test]
    fn fraction_is_capped_and_monotonic() {
        let mut tracker = ProgressTracker::new(Some(10.0));
        assert_eq!(tracker.observe("time=00:00:05.00"), Some(0.5));
        assert_eq!(tracker.observe("time=00:00:04.00"), None);
        assert_eq!(tracker.observe("time=00:00:05.00"), None);
        assert_eq!(tracker.observe("time=00:00:30.00"), Some(1.0));
        assert_eq!(tracker.last(), 1.0);
    }

    #[test]
    fn unknown_or_zero_duration_reports_nothing() {
        assert_eq!(ProgressTracker::new(None).observe(STATS), None);
        assert_eq!(ProgressTracker::new(Some(0.0)).observe(STATS), None);
    }

    #[test]
    fn marker_detection() {
        assert!(ProgressTracker::is_marker(STATS));
        assert!(!ProgressTracker::is_marker("Stream #0:0: Video: h264"));
    }
}
