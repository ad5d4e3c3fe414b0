//! Reading `<timestamp> [DF|UF] <hex bytes...>` log lines.

use crate::decode::RawMessage;

/// One usable line of the input log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Seconds since the epoch, as written by the receiver.
    pub timestamp: f64,
    pub message: RawMessage,
}

/// Parse a single line. Anything that does not look like a record gives `None`.
///
/// The hex payload may be split over several whitespace separated tokens,
/// they are concatenated before decoding.
pub fn parse_line(line: &str) -> Option<LogRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    let timestamp: f64 = parts[0].parse().ok()?;
    if !timestamp.is_finite() {
        return None;
    }

    let hex_parts = if parts.len() >= 3 && (parts[1] == "DF" || parts[1] == "UF") {
        &parts[2..]
    } else {
        &parts[1..]
    };

    let payload: String = hex_parts.concat();
    let message = RawMessage::from_hex(&payload)?;

    Some(LogRecord { timestamp, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1766986424.606828104 8D4840D6202CC371C32CE0576098")]
    #[case("1766986424.606828104 DF 8D4840D6202CC371C32CE0576098")]
    #[case("1766986424.606828104 DF 8D 4840D6 202CC371 C32CE0576098")]
    #[case("  1766986424.606828104\t8d4840d6202cc371c32ce0576098  ")]
    fn test_parse_line_accepts(#[case] line: &str) {
        let rec = parse_line(line).unwrap();
        assert!((rec.timestamp - 1766986424.606828104).abs() < 1e-6);
        assert_eq!(rec.message.to_string(), "8D4840D6202CC371C32CE0576098");
    }

    #[rstest]
    #[case("")]
    #[case("1766986424.6")]
    #[case("abc 8D4840D6202CC371C32CE0576098")]
    #[case("1.0 8D4840D6202CC371C32CE057609Z")]
    #[case("1.0 8D4840D6202CC371C32CE057609")]
    #[case("1.0 DF XYZ")]
    #[case("nan 8D4840D6202CC371C32CE0576098")]
    fn test_parse_line_rejects(#[case] line: &str) {
        assert!(parse_line(line).is_none());
    }

    #[test]
    fn test_uf_marker_is_skipped() {
        let rec = parse_line("2.5 UF 5D40621D4F94D0").unwrap();
        assert_eq!(rec.timestamp, 2.5);
        assert_eq!(rec.message.len(), 7);
    }
}
