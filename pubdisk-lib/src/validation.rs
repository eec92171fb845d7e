/// longest public link accepted from the landing form
pub const MAX_PUBLIC_LINK_CHARS: usize = 500;

/// checks that a string has no control characters and is within the given
/// number of characters
pub fn check_control<G>(given: G, max_chars: Option<usize>) -> bool
where
    G: AsRef<str>
{
    let mut char_count = 0;

    for ch in given.as_ref().chars() {
        if ch.is_control() {
            return false;
        }

        char_count += 1;

        if let Some(max) = max_chars {
            if char_count > max {
                return false;
            }
        }
    }

    true
}

/// a public link is opaque to us but must be non-empty once trimmed, free of
/// control characters and no longer than the form limit
pub fn public_link_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    let trimmed = given.as_ref().trim();

    !trimmed.is_empty() && check_control(trimmed, Some(MAX_PUBLIC_LINK_CHARS))
}
