//! Line-order normalization for newline-delimited payloads.

/// Delimiter between independently produced lines.
pub const LINE_DELIMITER: char = '\n';

/// Sort the lines of `payload` lexicographically.
///
/// A trailing delimiter stays trailing, so the number of elements produced by
/// splitting on the delimiter is unchanged.
pub fn sort_lines(payload: &str) -> String {
    let (body, trailing) = match payload.strip_suffix(LINE_DELIMITER) {
        Some(body) => (body, true),
        None => (payload, false),
    };

    let mut lines: Vec<&str> = body.split(LINE_DELIMITER).collect();
    lines.sort_unstable();

    let mut sorted = lines.join("\n");
    if trailing {
        sorted.push(LINE_DELIMITER);
    }
    sorted
}
