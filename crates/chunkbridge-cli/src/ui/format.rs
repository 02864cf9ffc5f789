//! Number and duration formatting for reports.

use std::time::Duration;

/// Group digits in threes: `1234567` -> `1,234,567`.
///
/// ```
/// use chunkbridge_cli::ui::format::format_thousands;
///
/// assert_eq!(format_thousands(1_500), "1,500");
/// ```
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;
    let mut groups: Vec<&str> = Vec::with_capacity(digits.len() / 3 + 1);
    if head > 0 {
        groups.push(&digits[..head]);
    }
    groups.extend(
        digits.as_bytes()[head..]
            .chunks(3)
            .filter_map(|g| std::str::from_utf8(g).ok()),
    );
    groups.join(",")
}

/// Format an elapsed time compactly: `850ms`, `12.3s`, `4m 05s`.
pub fn format_duration(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1_000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        let secs = elapsed.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// `1 row` / `3 rows`.
pub fn plural(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", format_thousands(count), noun)
    } else {
        format!("{} {}s", format_thousands(count), noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(16_384), "16,384");
        assert_eq!(format_thousands(200_000), "200,000");
        assert_eq!(format_thousands(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(850)), "850ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
        assert_eq!(format_duration(Duration::from_secs(245)), "4m 05s");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "row"), "1 row");
        assert_eq!(plural(0, "row"), "0 rows");
        assert_eq!(plural(1500, "chunk"), "1,500 chunks");
    }
}
