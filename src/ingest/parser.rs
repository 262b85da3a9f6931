//! Line parser for `timestamp_ns,value` text

use crate::storage::Sample;

/// Marker identifying a header line
pub const HEADER_MARKER: &str = "Timestamp,Value";

/// Classification of one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Sample(Sample),
    Blank,
    /// Skipped and counted; carries the reason
    Malformed(&'static str),
}

/// Whether `line` is the optional leading header
pub fn is_header(line: &str) -> bool {
    line.contains(HEADER_MARKER)
}

/// Parses a data line.
///
/// Fields beyond the second are ignored. Surrounding whitespace on the line
/// and on each field is tolerated.
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() {
        return ParsedLine::Blank;
    }

    let mut fields = line.split(',');
    let (Some(ts), Some(value)) = (fields.next(), fields.next()) else {
        return ParsedLine::Malformed("expected two fields");
    };

    let Ok(timestamp_ns) = ts.trim().parse::<i64>() else {
        return ParsedLine::Malformed("timestamp is not an integer");
    };
    let Ok(value) = value.trim().parse::<i64>() else {
        return ParsedLine::Malformed("value is not an integer");
    };

    ParsedLine::Sample(Sample::new(timestamp_ns, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse_line("100,5"), ParsedLine::Sample(Sample::new(100, 5)));
        assert_eq!(
            parse_line("  -3 , -7 \r"),
            ParsedLine::Sample(Sample::new(-3, -7))
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        assert_eq!(parse_line("1,2,3"), ParsedLine::Sample(Sample::new(1, 2)));
    }

    #[test]
    fn test_blank() {
        assert_eq!(parse_line(""), ParsedLine::Blank);
        assert_eq!(parse_line("   \n"), ParsedLine::Blank);
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse_line("12"), ParsedLine::Malformed(_)));
        assert!(matches!(parse_line("abc,1"), ParsedLine::Malformed(_)));
        assert!(matches!(parse_line("1,1.5"), ParsedLine::Malformed(_)));
        assert!(matches!(
            parse_line("99999999999999999999,1"),
            ParsedLine::Malformed(_)
        ));
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header("Timestamp,Value"));
        assert!(is_header("\u{feff}Timestamp,Value\r\n"));
        assert!(!is_header("0,10"));
    }
}
