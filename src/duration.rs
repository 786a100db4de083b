use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ParseDurationError {}

impl std::fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "invalid duration, expected e.g. \"100ms\" or \"5s\"")
    }
}

impl std::fmt::Debug for ParseDurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "invalid duration")
    }
}

impl std::error::Error for ParseDurationError {}

fn unit_duration(num: u64, unit: &str) -> Result<Duration, ParseDurationError> {
    match unit {
        "ns" => Ok(Duration::from_nanos(num)),
        "µs" | "us" => Ok(Duration::from_micros(num)),
        "ms" => Ok(Duration::from_millis(num)),
        "s" => Ok(Duration::from_secs(num)),
        "m" => num.checked_mul(60).map(Duration::from_secs).ok_or(ParseDurationError {}),
        "h" => num.checked_mul(3600).map(Duration::from_secs).ok_or(ParseDurationError {}),
        _ => Err(ParseDurationError {}),
    }
}

/// Parse duration strings like "200ms", "17s", "2m30s", "3h" into `Duration`.
///
/// A number without a unit is rejected.
pub fn parse_duration(s: &str) -> Result<Duration, ParseDurationError> {
    let mut num: u64 = 0;
    let mut total = Duration::ZERO;
    let mut unit_str = String::new();
    let mut seen_digit = false;
    for c in s.trim().chars() {
        if let Some(digit) = c.to_digit(10) {
            if !unit_str.is_empty() {
                total = total
                    .checked_add(unit_duration(num, &unit_str)?)
                    .ok_or(ParseDurationError {})?;
                num = 0;
                unit_str.clear();
            }
            num = num
                .checked_mul(10)
                .and_then(|n| n.checked_add(digit as u64))
                .ok_or(ParseDurationError {})?;
            seen_digit = true;
        } else {
            if !seen_digit {
                return Err(ParseDurationError {});
            }
            unit_str.push(c);
        }
    }
    if unit_str.is_empty() {
        return Err(ParseDurationError {});
    }
    total
        .checked_add(unit_duration(num, &unit_str)?)
        .ok_or(ParseDurationError {})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("4ns").unwrap(), Duration::from_nanos(4));
        assert_eq!(parse_duration("4us").unwrap(), Duration::from_micros(4));
        assert_eq!(parse_duration("4µs").unwrap(), Duration::from_micros(4));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("0ms").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_bare_numbers() {
        assert_eq!(parse_duration("1"), Err(ParseDurationError {}));
        assert_eq!(parse_duration("1s1"), Err(ParseDurationError {}));
        assert_eq!(parse_duration(""), Err(ParseDurationError {}));
        assert_eq!(parse_duration("ms"), Err(ParseDurationError {}));
        assert_eq!(parse_duration("3d"), Err(ParseDurationError {}));
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(parse_duration("6000000000000000h"), Err(ParseDurationError {}));
        assert_eq!(parse_duration("400000000000000000m"), Err(ParseDurationError {}));
        assert_eq!(
            parse_duration("18446744073709551615s1s"),
            Err(ParseDurationError {})
        );
        assert_eq!(parse_duration("99999999999999999999s"), Err(ParseDurationError {}));
        assert_eq!(
            parse_duration("5124095576030431h"),
            Ok(Duration::from_secs(5124095576030431 * 3600))
        );
    }
}
