/// Map the missing-value sentinels (blank, `nan`) to `None`. Anything else
/// is returned as read, surrounding whitespace included.
pub fn clean_str(raw: &str) -> Option<&str> {
    if is_missing(raw.trim()) {
        None
    } else {
        Some(raw)
    }
}

pub fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("nan")
}
