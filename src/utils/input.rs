//! Lenient parsing for numbers typed into forms.

use std::str::FromStr;

/// Parses `raw` after trimming, falling back to `default` when it is empty,
/// non-numeric or out of range for `T`.
pub fn number_or<T: FromStr>(raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_on_garbage() {
        assert_eq!(number_or::<u32>("45", 30), 45);
        assert_eq!(number_or::<u32>(" 90 ", 30), 90);
        assert_eq!(number_or::<u32>("", 30), 30);
        assert_eq!(number_or::<u32>("ten", 30), 30);
        assert_eq!(number_or::<u32>("-5", 30), 30);
        assert_eq!(number_or::<u32>("1.5", 60), 60);
    }
}
