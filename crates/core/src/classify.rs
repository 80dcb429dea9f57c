//! Lyric filtering.
//!
//! Anime subtitle files interleave dialogue with karaoke captions for the
//! opening and ending songs. Those captions are not dialogue and are removed
//! before ids are assigned. Two layers decide:
//!
//! 1. the style name, when the typesetter gave lyrics their own style;
//! 2. a timing window plus text shape, for files that did not.
//!
//! Both are heuristics and will misfire on some files.

use crate::time::parse_time;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Style names used for song captions. Compared upper-cased.
const LYRIC_STYLES: &[&str] = &[
    "OPJ", "OPC", "EDJ", "EDJ2", "EDC", "OP", "ED", "SONG", "MUSIC", "LYRIC", "LYRICS",
];

static LYRIC_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // plain romaji / English line
        r"^[A-Za-z\s]+$",
        r"[♪♫♬♩]",
        r"^\s*[A-Z][a-z\s]*$",
        // ASCII word boundaries: kana next to "yeah" still counts as a break
        r"(?i)(?-u:\b)(la\s+la|na\s+na|oh\s+oh|yeah|wow)(?-u:\b)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Where the opening and ending songs are expected to play, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricWindows {
    pub opening_start: f64,
    pub opening_end: f64,
    pub ending_start: f64,
}

impl Default for LyricWindows {
    /// Tuned for a ~24 minute TV episode.
    fn default() -> Self {
        Self {
            opening_start: 30.0,
            opening_end: 180.0,
            ending_start: 1200.0,
        }
    }
}

impl LyricWindows {
    /// Whether `seconds` falls inside the opening or ending window.
    pub fn contains(&self, seconds: f64) -> bool {
        (seconds >= self.opening_start && seconds <= self.opening_end)
            || seconds >= self.ending_start
    }
}

/// Decides which dialogue events are song lyrics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LyricFilter {
    pub windows: LyricWindows,
}

impl LyricFilter {
    pub fn new(windows: LyricWindows) -> Self {
        Self { windows }
    }

    /// True when the event should be dropped as a lyric caption.
    pub fn is_lyric(&self, style: &str, text: &str, start: &str) -> bool {
        if is_lyric_style(style) {
            debug!(style, text, "dropping event with lyric style");
            return true;
        }
        if self.is_lyric_content(text, start) {
            debug!(start, text, "dropping lyric-shaped event in song window");
            return true;
        }
        false
    }

    /// Timing + text-shape check. Outside the song windows this never fires.
    pub fn is_lyric_content(&self, text: &str, start: &str) -> bool {
        if !self.windows.contains(parse_time(start)) {
            return false;
        }
        LYRIC_PATTERNS.iter().any(|re| re.is_match(text))
    }
}

/// Style rule: exact match, or either name containing the other
/// (`OPJ_2`, `Song-Romaji`, and abbreviations like `LYR` all count).
/// Every token contains the empty string, so an unstyled event matches too.
pub fn is_lyric_style(style: &str) -> bool {
    let upper = style.to_uppercase();
    LYRIC_STYLES
        .iter()
        .any(|token| *token == upper || upper.contains(token) || token.contains(upper.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lyric_styles_are_matched_loosely() {
        assert!(is_lyric_style("OPJ"));
        assert!(is_lyric_style("opc"));
        assert!(is_lyric_style("EDJ2"));
        assert!(is_lyric_style("Song-Romaji"));
        assert!(is_lyric_style("LYR"));
        assert!(!is_lyric_style("zhengwen"));
        assert!(!is_lyric_style("Default"));
    }

    #[test]
    fn empty_style_counts_as_lyric() {
        assert!(is_lyric_style(""));
        assert!(LyricFilter::default().is_lyric("", "お姉ちゃん", "0:10:00.00"));
    }

    #[test]
    fn lyric_style_drops_regardless_of_time_and_text() {
        let filter = LyricFilter::default();
        assert!(filter.is_lyric("OPJ", "お姉ちゃん", "0:10:00.00"));
        assert!(filter.is_lyric("OPJ", "Yeah", "0:00:01.00"));
    }

    #[test]
    fn lyric_shaped_text_dropped_only_in_windows() {
        let filter = LyricFilter::default();
        assert!(filter.is_lyric("zhengwen", "Yeah yeah yeah", "0:01:00.00"));
        assert!(!filter.is_lyric("zhengwen", "Yeah yeah yeah", "0:10:00.00"));
        assert!(filter.is_lyric("zhengwen", "Yeah yeah yeah", "0:20:00.00"));
    }

    #[test]
    fn each_pattern_fires_in_window() {
        let filter = LyricFilter::default();
        let start = "0:00:45.00";
        assert!(filter.is_lyric_content("kimi no koe", start));
        assert!(filter.is_lyric_content("♪ 君の声 ♪", start));
        assert!(filter.is_lyric_content("Dreaming", start));
        assert!(filter.is_lyric_content("la la 歌おう", start));
        assert!(filter.is_lyric_content("Yeahだよ", start));
        assert!(filter.is_lyric_content("夢wow夢", start));
        assert!(!filter.is_lyric_content("yeahs だよ", start));
        assert!(!filter.is_lyric_content("はッ ８時！", start));
        assert!(!filter.is_lyric_content("What?", start));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let w = LyricWindows::default();
        assert!(!w.contains(29.99));
        assert!(w.contains(30.0));
        assert!(w.contains(180.0));
        assert!(!w.contains(180.01));
        assert!(!w.contains(1199.99));
        assert!(w.contains(1200.0));
    }

    #[test]
    fn custom_windows_move_the_heuristic() {
        let filter = LyricFilter::new(LyricWindows {
            opening_start: 0.0,
            opening_end: 10.0,
            ending_start: 2400.0,
        });
        assert!(filter.is_lyric_content("Yeah", "0:00:05.00"));
        assert!(!filter.is_lyric_content("Yeah", "0:01:00.00"));
        assert!(!filter.is_lyric_content("Yeah", "0:21:00.00"));
    }
}
