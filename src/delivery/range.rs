//! HTTP `Range` header parsing.
//!
//! Only the single-range form `bytes=<start>-[<end>]` is accepted. Anything
//! else that is present but cannot be honoured (suffix ranges, multiple
//! ranges, other units, garbage, a start past the end of the file) is
//! reported as [`RangeOutcome::Unsatisfiable`] so the caller answers 416
//! instead of computing a bogus span.

/// A closed byte interval `[start, end]` within a resource of `total` bytes.
///
/// Always satisfies `start <= end < total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteRange {
    /// Number of bytes covered (`end - start + 1`).
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

/// Result of interpreting a `Range` header against a resource size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No header: serve the whole resource.
    NoRange,
    /// A valid span, already clamped to the resource.
    Satisfied(ByteRange),
    /// Header present but unusable: answer 416.
    Unsatisfiable,
}

/// Interpret `header` against a resource of `total` bytes.
pub fn parse_range(header: Option<&str>, total: u64) -> RangeOutcome {
    let Some(header) = header else {
        return RangeOutcome::NoRange;
    };

    match parse_bounds(header) {
        Some((start, end)) if start < total => {
            let end = end.unwrap_or(total - 1).min(total - 1);
            if start > end {
                RangeOutcome::Unsatisfiable
            } else {
                RangeOutcome::Satisfied(ByteRange { start, end, total })
            }
        }
        _ => RangeOutcome::Unsatisfiable,
    }
}

/// Split `bytes=START-END` into `(start, Some(end))` or `(start, None)`.
fn parse_bounds(header: &str) -> Option<(u64, Option<u64>)> {
    let set = header.trim().strip_prefix("bytes=")?;
    let (start, end) = set.split_once('-')?;

    let start = parse_offset(start.trim())?;
    let end = match end.trim() {
        "" => None,
        e => Some(parse_offset(e)?),
    };

    // An explicit end below the start is malformed, not merely clamped.
    if matches!(end, Some(e) if e < start) {
        return None;
    }

    Some((start, end))
}

/// Digits only: `u64::from_str` would also accept a leading `+`.
fn parse_offset(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn satisfied(start: u64, end: u64, total: u64) -> RangeOutcome {
        RangeOutcome::Satisfied(ByteRange { start, end, total })
    }

    #[test]
    fn absent_header_is_no_range() {
        assert_eq!(parse_range(None, 1000), RangeOutcome::NoRange);
    }

    #[test]
    fn closed_range() {
        assert_eq!(parse_range(Some("bytes=100-199"), 1000), satisfied(100, 199, 1000));
        assert_eq!(parse_range(Some("bytes=0-0"), 1000), satisfied(0, 0, 1000));
        assert_eq!(parse_range(Some("bytes=999-999"), 1000), satisfied(999, 999, 1000));
    }

    #[test]
    fn open_ended_range_runs_to_last_byte() {
        assert_eq!(parse_range(Some("bytes=500-"), 1000), satisfied(500, 999, 1000));
        assert_eq!(parse_range(Some("bytes=0-"), 1), satisfied(0, 0, 1));
    }

    #[test]
    fn end_past_size_is_clamped() {
        assert_eq!(parse_range(Some("bytes=0-2000"), 1000), satisfied(0, 999, 1000));
        assert_eq!(
            parse_range(Some("bytes=10-18446744073709551615"), 1000),
            satisfied(10, 999, 1000)
        );
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        assert_eq!(parse_range(Some(" bytes= 10 - 20 "), 1000), satisfied(10, 20, 1000));
    }

    // A start at or past the end used to yield a negative or zero-length
    // span; it must be rejected outright.
    #[test]
    fn start_at_or_past_size_is_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=1000-"), 1000), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=1000-1005"), 1000), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=5000-"), 1000), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn inverted_range_is_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=200-100"), 1000), RangeOutcome::Unsatisfiable);
    }

    #[test]
    fn malformed_headers_are_unsatisfiable() {
        for header in [
            "",
            "bytes=",
            "bytes=-",
            "bytes=-500",
            "bytes=abc-def",
            "bytes=+5-10",
            "bytes=5",
            "bytes=0-1,5-6",
            "items=0-10",
            "0-10",
            "bytes=1.5-3",
        ] {
            assert_eq!(
                parse_range(Some(header), 1000),
                RangeOutcome::Unsatisfiable,
                "header {header:?}"
            );
        }
    }

    #[test]
    fn any_range_on_empty_resource_is_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=0-"), 0), RangeOutcome::Unsatisfiable);
        assert_eq!(parse_range(None, 0), RangeOutcome::NoRange);
    }

    #[test]
    fn parse_is_idempotent() {
        let a = parse_range(Some("bytes=3-7"), 10);
        let b = parse_range(Some("bytes=3-7"), 10);
        assert_eq!(a, b);
    }

    #[test]
    fn byte_range_helpers() {
        let r = ByteRange { start: 100, end: 199, total: 1000 };
        assert_eq!(r.length(), 100);
        assert_eq!(r.content_range(), "bytes 100-199/1000");
    }

    #[test]
    fn every_valid_span_has_exact_length() {
        let total = 17;
        for start in 0..total {
            for end in start..total {
                let header = format!("bytes={start}-{end}");
                match parse_range(Some(&header), total) {
                    RangeOutcome::Satisfied(r) => {
                        assert_eq!(r.length(), end - start + 1);
                        assert!(r.end < total);
                    }
                    other => panic!("{header}: {other:?}"),
                }
            }
        }
    }
}
