//! Parsing of free-text numeric inputs before any request is issued.

use crate::error::ApiError;

/// A band id typed by the user: a positive integer.
pub fn parse_band_id(input: &str) -> Result<i64, ApiError> {
    match input.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::Validation(format!(
            "band id must be a positive integer, got {:?}",
            input.trim()
        ))),
    }
}

/// A singles-count threshold for the counting operations. Any integer.
pub fn parse_singles_threshold(input: &str) -> Result<i64, ApiError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| ApiError::Validation(format!("expected a number, got {:?}", input.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_id_accepts_positive_integers() {
        assert_eq!(parse_band_id("42"), Ok(42));
        assert_eq!(parse_band_id(" 7 "), Ok(7));
    }

    #[test]
    fn band_id_rejects_everything_else() {
        for bad in ["0", "-3", "", "abc", "4.5"] {
            assert!(
                matches!(parse_band_id(bad), Err(ApiError::Validation(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn threshold_accepts_zero_and_negatives() {
        assert_eq!(parse_singles_threshold("0"), Ok(0));
        assert_eq!(parse_singles_threshold("-1"), Ok(-1));
        assert!(matches!(
            parse_singles_threshold("many"),
            Err(ApiError::Validation(_))
        ));
    }
}
