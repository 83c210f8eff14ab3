//! Pagination cursors.
//!
//! Cursors are opaque to the storefront but encode a plain result offset as
//! `offset:<N>`. A cursor that cannot be read means "start from the
//! beginning"; it is never an error.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static OFFSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"offset:\s*(\d+)\s*$").expect("offset pattern is valid"));

/// Extract the offset from a cursor.
///
/// Returns `None` for a missing or malformed cursor.
pub fn decode(cursor: Option<&str>) -> Option<u64> {
    let captures = OFFSET_PATTERN.captures(cursor?)?;
    captures.get(1)?.as_str().parse().ok()
}

/// Encode an offset as a cursor.
pub fn encode(offset: u64) -> String {
    format!("offset:{offset}")
}

/// Cursor of the previous page, if the current page is not the first.
pub fn encode_previous(offset: u64, count: u64) -> Option<String> {
    (offset > 0).then(|| encode(offset.saturating_sub(count)))
}

/// Cursor of the next page, if results remain after the current page.
pub fn encode_next(offset: u64, count: u64, total: u64) -> Option<String> {
    let next = offset.saturating_add(count);
    (next < total).then(|| encode(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_reads_offset() {
        assert_eq!(decode(Some("offset:24")), Some(24));
        assert_eq!(decode(Some("offset:0")), Some(0));
    }

    #[test]
    fn decode_malformed_is_none() {
        assert_eq!(decode(None), None);
        assert_eq!(decode(Some("")), None);
        assert_eq!(decode(Some("page:2")), None);
        assert_eq!(decode(Some("offset:")), None);
        assert_eq!(decode(Some("offset:abc")), None);
        assert_eq!(decode(Some("offset:-5")), None);
        assert_eq!(decode(Some("offset:99999999999999999999999")), None);
    }

    #[test]
    fn next_cursor_round_trips() {
        for offset in [0_u64, 1, 10, 24, 100] {
            for count in [0_u64, 1, 5, 24] {
                for total in [0_u64, 1, 30, 200] {
                    match encode_next(offset, count, total) {
                        Some(cursor) => {
                            assert!(offset + count < total);
                            assert_eq!(decode(Some(&cursor)), Some(offset + count));
                        }
                        None => assert!(offset + count >= total),
                    }
                }
            }
        }
    }

    #[test]
    fn previous_cursor_clamps_at_zero() {
        assert_eq!(encode_previous(0, 10), None);
        assert_eq!(encode_previous(4, 10), Some("offset:0".to_string()));
        assert_eq!(encode_previous(24, 24), Some("offset:0".to_string()));
        assert_eq!(encode_previous(48, 24), Some("offset:24".to_string()));
        assert_eq!(decode(encode_previous(30, 7).as_deref()), Some(23));
    }

    #[test]
    fn first_page_of_text_search() {
        assert_eq!(encode_next(0, 2, 5), Some("offset:2".to_string()));
        assert_eq!(encode_previous(0, 2), None);
    }

    #[test]
    fn last_page() {
        assert_eq!(encode_next(4, 1, 5), None);
        assert_eq!(encode_previous(4, 1), Some("offset:3".to_string()));
    }
}
