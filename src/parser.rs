//! Line grammar for the interactive session.
//!
//! A line is one of:
//! - `C#...!`: passthrough, forwarded without the leading `C`
//! - `ct<n>`: set the default move duration
//! - `<id>,<pulse>[,<duration>]`, optionally chained with `;`

use crate::codec::{has_passthrough_prefix, strip_passthrough, PassthroughError};
use crate::constants::*;
use crate::types::{MoveCommand, PassthroughCommand, SetDefaultCommand};
use std::fmt;
use std::str::Split;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Field {
    Id,
    Pulse,
    Duration,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Id => "id",
            Field::Pulse => "pulse",
            Field::Duration => "duration",
        })
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum SegmentError {
    #[error("expected at least <id>,<pulse>")]
    TooFewFields,
    #[error("{field} is not an integer: {token:?}")]
    NotAnInteger { field: Field, token: String },
    #[error("{field} out of range: {value}")]
    OutOfRange { field: Field, value: i64 },
}

/// Why an input item was skipped instead of dispatched.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Diagnostic {
    InvalidSegment { segment: String, reason: SegmentError },
    InvalidDefault { raw: String },
    InvalidPassthrough { reason: PassthroughError },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InvalidSegment { segment, reason } => {
                write!(f, "Skip invalid segment: {} ({})", segment, reason)
            }
            Diagnostic::InvalidDefault { raw } => {
                write!(f, "Invalid time value for ct command: {:?}", raw)
            }
            Diagnostic::InvalidPassthrough { reason } => write!(
                f,
                "Invalid C# command (must start with C# and end with !): {}",
                reason
            ),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParsedItem {
    Move(MoveCommand),
    SetDefault(SetDefaultCommand),
    Passthrough(PassthroughCommand),
    Skipped(Diagnostic),
}

fn parse_int(field: Field, token: &str) -> Result<i64, SegmentError> {
    let token = token.trim();
    token.parse::<i64>().map_err(|_| SegmentError::NotAnInteger {
        field,
        token: token.to_string(),
    })
}

/// Parse one `<id>,<pulse>[,<duration>]` segment. Out-of-range values are
/// rejected here; clamping only happens when the frame is encoded.
pub fn parse_segment(segment: &str, default_duration: u32) -> Result<MoveCommand, SegmentError> {
    let mut parts = segment.split(FIELD_SEPARATOR);
    let (id, pulse) = match (parts.next(), parts.next()) {
        (Some(id), Some(pulse)) => (id, pulse),
        _ => return Err(SegmentError::TooFewFields),
    };

    let id = parse_int(Field::Id, id)?;
    let pulse = parse_int(Field::Pulse, pulse)?;
    let duration = match parts.next() {
        Some(token) => parse_int(Field::Duration, token)?,
        None => default_duration as i64,
    };

    if !(0..=MAX_SERVO_ID as i64).contains(&id) {
        return Err(SegmentError::OutOfRange { field: Field::Id, value: id });
    }
    if pulse <= 0 {
        return Err(SegmentError::OutOfRange { field: Field::Pulse, value: pulse });
    }
    if duration <= 0 {
        return Err(SegmentError::OutOfRange { field: Field::Duration, value: duration });
    }

    Ok(MoveCommand {
        id: id as u16,
        pulse: u32::try_from(pulse).unwrap_or(u32::MAX),
        duration: u32::try_from(duration).unwrap_or(u32::MAX),
    })
}

fn parse_set_default(raw: &str) -> ParsedItem {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => ParsedItem::SetDefault(SetDefaultCommand {
            value: u32::try_from(value).unwrap_or(u32::MAX),
        }),
        _ => ParsedItem::Skipped(Diagnostic::InvalidDefault { raw: raw.to_string() }),
    }
}

fn parse_passthrough(line: &str) -> ParsedItem {
    match strip_passthrough(line) {
        Ok(payload) => ParsedItem::Passthrough(PassthroughCommand {
            payload: payload.to_string(),
        }),
        Err(reason) => ParsedItem::Skipped(Diagnostic::InvalidPassthrough { reason }),
    }
}

/// Lazy, restartable sequence of items parsed from one input line.
#[derive(Debug, Clone)]
pub struct ParsedLine<'a> {
    inner: Inner<'a>,
}

#[derive(Debug, Clone)]
enum Inner<'a> {
    Single(Option<ParsedItem>),
    Segments {
        segments: Split<'a, char>,
        default_duration: u32,
    },
}

impl Iterator for ParsedLine<'_> {
    type Item = ParsedItem;

    fn next(&mut self) -> Option<ParsedItem> {
        match &mut self.inner {
            Inner::Single(item) => item.take(),
            Inner::Segments { segments, default_duration } => {
                for segment in segments.by_ref() {
                    let segment = segment.trim();
                    if segment.is_empty() {
                        continue;
                    }
                    return Some(match parse_segment(segment, *default_duration) {
                        Ok(cmd) => ParsedItem::Move(cmd),
                        Err(reason) => ParsedItem::Skipped(Diagnostic::InvalidSegment {
                            segment: segment.to_string(),
                            reason,
                        }),
                    });
                }
                None
            }
        }
    }
}

/// Classify a line: passthrough first, then `ct`, then move segments.
pub fn parse_line(line: &str, default_duration: u32) -> ParsedLine<'_> {
    let line = line.trim();

    let inner = if has_passthrough_prefix(line) {
        Inner::Single(Some(parse_passthrough(line)))
    } else if let Some(raw) = line.strip_prefix(SET_DEFAULT_PREFIX) {
        Inner::Single(Some(parse_set_default(raw)))
    } else {
        Inner::Segments {
            segments: line.split(SEGMENT_SEPARATOR),
            default_duration,
        }
    };

    ParsedLine { inner }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(id: u16, pulse: u32, duration: u32) -> ParsedItem {
        ParsedItem::Move(MoveCommand { id, pulse, duration })
    }

    #[test]
    fn segment_with_explicit_duration() {
        assert_eq!(
            parse_segment("0,1640,1000", 1000),
            Ok(MoveCommand { id: 0, pulse: 1640, duration: 1000 })
        );
    }

    #[test]
    fn segment_uses_default_duration() {
        assert_eq!(
            parse_segment("0,1640", 750),
            Ok(MoveCommand { id: 0, pulse: 1640, duration: 750 })
        );
    }

    #[test]
    fn segment_tolerates_padding_and_extra_fields() {
        assert_eq!(
            parse_segment(" 3 , 1200 , 80 ,junk", 1000),
            Ok(MoveCommand { id: 3, pulse: 1200, duration: 80 })
        );
    }

    #[test]
    fn segment_rejects_instead_of_clamping() {
        assert_eq!(
            parse_segment("0,1640,0", 1000),
            Err(SegmentError::OutOfRange { field: Field::Duration, value: 0 })
        );
        assert_eq!(
            parse_segment("1000,1500", 1000),
            Err(SegmentError::OutOfRange { field: Field::Id, value: 1000 })
        );
        assert_eq!(
            parse_segment("-1,1500", 1000),
            Err(SegmentError::OutOfRange { field: Field::Id, value: -1 })
        );
        assert_eq!(
            parse_segment("1,0", 1000),
            Err(SegmentError::OutOfRange { field: Field::Pulse, value: 0 })
        );
    }

    #[test]
    fn segment_passes_high_pulse_through() {
        assert_eq!(
            parse_segment("5,9999,1", 1000),
            Ok(MoveCommand { id: 5, pulse: 9999, duration: 1 })
        );
    }

    #[test]
    fn segment_rejects_non_integers() {
        assert_eq!(parse_segment("0", 1000), Err(SegmentError::TooFewFields));
        assert_eq!(
            parse_segment("0,bad", 1000),
            Err(SegmentError::NotAnInteger { field: Field::Pulse, token: "bad".into() })
        );
        assert!(parse_segment("0,1500,1.5", 1000).is_err());
        assert!(parse_segment("0,,", 1000).is_err());
    }

    #[test]
    fn line_yields_moves_in_order() {
        let items: Vec<_> = parse_line("0,1500;1,2000", 1000).collect();
        assert_eq!(items, vec![mv(0, 1500, 1000), mv(1, 2000, 1000)]);
    }

    #[test]
    fn bad_segment_does_not_suppress_later_ones() {
        let items: Vec<_> = parse_line("0,bad;1,2000", 1000).collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            &items[0],
            ParsedItem::Skipped(Diagnostic::InvalidSegment { segment, .. }) if segment == "0,bad"
        ));
        assert_eq!(items[1], mv(1, 2000, 1000));
    }

    #[test]
    fn empty_segments_are_dropped() {
        let items: Vec<_> = parse_line(" ; 0,1500 ;; ", 1000).collect();
        assert_eq!(items, vec![mv(0, 1500, 1000)]);
        assert_eq!(parse_line("", 1000).count(), 0);
        assert_eq!(parse_line("   ", 1000).count(), 0);
    }

    #[test]
    fn parsed_line_is_restartable() {
        let line = parse_line("0,1500;1,2000;2,2500", 1000);
        assert_eq!(line.clone().count(), 3);
        assert_eq!(line.collect::<Vec<_>>().len(), 3);
    }

    #[test]
    fn ct_sets_default() {
        let items: Vec<_> = parse_line("ct500", 1000).collect();
        assert_eq!(items, vec![ParsedItem::SetDefault(SetDefaultCommand { value: 500 })]);
    }

    #[test]
    fn invalid_ct_is_a_diagnostic() {
        for line in ["ct0", "ct-5", "ct", "ctabc"] {
            let items: Vec<_> = parse_line(line, 1000).collect();
            assert!(
                matches!(items.as_slice(), [ParsedItem::Skipped(Diagnostic::InvalidDefault { .. })]),
                "{line}"
            );
        }
    }

    #[test]
    fn ct_prefix_is_case_sensitive() {
        let items: Vec<_> = parse_line("CT500", 1000).collect();
        assert!(matches!(
            items.as_slice(),
            [ParsedItem::Skipped(Diagnostic::InvalidSegment { .. })]
        ));
    }

    #[test]
    fn passthrough_wins_over_segments() {
        let items: Vec<_> = parse_line("  c#000PRAD1500;1,2!  ", 1000).collect();
        assert_eq!(
            items,
            vec![ParsedItem::Passthrough(PassthroughCommand {
                payload: "#000PRAD1500;1,2!".into()
            })]
        );
    }

    #[test]
    fn unterminated_passthrough_is_a_diagnostic() {
        let items: Vec<_> = parse_line("C#000PRAD1500", 1000).collect();
        assert_eq!(
            items,
            vec![ParsedItem::Skipped(Diagnostic::InvalidPassthrough {
                reason: PassthroughError::MissingTerminator
            })]
        );
    }
}
