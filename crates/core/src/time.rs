//! Conversion between ASS timestamps (`H:MM:SS.CC`) and seconds.

/// Parse `H:MM:SS.CC` into seconds.
/// Anything that is not three numeric `:`-separated parts yields `0.0`, so a
/// zero result from untrusted input may mean "invalid" rather than "start".
pub fn parse_time(t: &str) -> f64 {
    let parts: Vec<&str> = t.split(':').collect();
    if parts.len() != 3 {
        return 0.0;
    }
    let h: u64 = match parts[0].trim().parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    let m: u64 = match parts[1].trim().parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    let s: f64 = match parts[2].trim().parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    h as f64 * 3600.0 + m as f64 * 60.0 + s
}

/// Format seconds back to `HH:MM:SS.CC`.
pub fn format_time(seconds: f64) -> String {
    let h = (seconds / 3600.0).floor() as u64;
    let m = ((seconds % 3600.0) / 60.0).floor() as u64;
    let s = seconds % 60.0;
    format!("{h:02}:{m:02}:{s:05.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn parses_timestamps() {
        assert!(close(parse_time("0:00:31.29"), 31.29));
        assert!(close(parse_time("0:01:02.50"), 62.5));
        assert!(close(parse_time("1:30:00.00"), 5400.0));
    }

    #[test]
    fn malformed_timestamps_are_zero() {
        assert_eq!(parse_time("invalid"), 0.0);
        assert_eq!(parse_time("1:2"), 0.0);
        assert_eq!(parse_time(""), 0.0);
        assert_eq!(parse_time("a:b:c"), 0.0);
    }

    #[test]
    fn huge_components_do_not_overflow() {
        let t = parse_time("18446744073709551615:00:00.00");
        assert!(t.is_finite());
        assert!(t > 1e22);
        assert!(close(parse_time("0:18446744073709551615:00.00"), 18446744073709551615.0 * 60.0));
    }

    #[test]
    fn formats_seconds() {
        assert_eq!(format_time(31.29), "00:00:31.29");
        assert_eq!(format_time(62.5), "00:01:02.50");
        assert_eq!(format_time(5400.0), "01:30:00.00");
        assert_eq!(format_time(0.0), "00:00:00.00");
        assert_eq!(format_time(3661.5), "01:01:01.50");
    }

    /// Formatting then parsing stays within a centisecond across the range.
    #[test]
    fn format_then_parse_is_close() {
        let mut s = 0.0;
        while s <= 359_999.99 {
            let back = parse_time(&format_time(s));
            assert!(close(back, s), "{s} came back as {back}");
            s += 1234.567;
        }
        assert!(close(parse_time(&format_time(359_999.99)), 359_999.99));
    }
}
