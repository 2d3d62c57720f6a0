/// Split an id into the part before its trailing digits and the digits.
///
/// `"Streamer12"` gives `("Streamer", "12")`, `"Streamer"` gives
/// `("Streamer", "")` and `"42"` gives `("", "42")`.
pub fn split_numeric_suffix(id: &str) -> (&str, &str) {
    let base = id.trim_end_matches(|c: char| c.is_ascii_digit());
    (base, &id[base.len()..])
}

/// Pick a streamer id for `desired` that does not clash with `registered`.
///
/// A registered id clashes when its non-digit base equals `desired`, or when
/// it is all digits and equals `desired`. On any clash the result is
/// `desired` followed by one more than the largest clashing suffix (an
/// empty suffix counts as 0), so the first duplicate of "Foo" is "Foo1".
pub fn sanitize_streamer_id<'a, I>(desired: &str, registered: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut highest: Option<u128> = None;

    for id in registered {
        let (base, suffix) = split_numeric_suffix(id);
        let collides = if base.is_empty() {
            suffix == desired
        } else {
            base == desired
        };
        if !collides {
            continue;
        }

        let value = if suffix.is_empty() {
            0
        } else {
            suffix.parse::<u128>().unwrap_or(u128::MAX)
        };
        highest = Some(highest.map_or(value, |h| h.max(value)));
    }

    match highest {
        Some(max) => format!("{}{}", desired, max.saturating_add(1)),
        None => desired.to_owned(),
    }
}
