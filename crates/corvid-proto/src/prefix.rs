//! Message prefix handling.
//!
//! A prefix identifies the origin of a message: either a bare name or the
//! structured `nick[!user]@host` form. The nick part may not contain `@`,
//! `!`, or spaces; a `!user` segment is only valid together with an
//! `@host` segment.

/// Check whether a prefix matches the `nick[!user]@host` shape.
///
/// Accepted forms: `name`, `name@host`, `name!user@host` (each part may
/// be empty). Rejected: spaces anywhere, or a `!user` segment with no
/// `@host` after it.
pub fn validate_prefix(s: &str) -> bool {
    if s.contains(' ') {
        return false;
    }

    match s.find(['!', '@']) {
        // First separator is '!': the user segment must be closed by '@'
        Some(pos) if s.as_bytes()[pos] == b'!' => s[pos + 1..].contains('@'),
        _ => true,
    }
}

/// Extract the nickname from a prefix.
///
/// Returns the first run of characters up to a `!` separator, so
/// `nick!user@host` yields `nick`. An empty prefix yields an empty
/// string.
///
/// # Example
///
/// ```
/// use corvid_proto::prefix::nickname;
///
/// assert_eq!(nickname("nick!user@host"), "nick");
/// assert_eq!(nickname("services."), "services.");
/// ```
pub fn nickname(prefix: &str) -> &str {
    prefix
        .split(['!', ':'])
        .find(|part| !part.is_empty())
        .unwrap_or("")
}
