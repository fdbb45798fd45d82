use thiserror::Error;

/// InputValueError is used if some game option or parameter does not fulfill the posed
/// requirements, e.g., a negative speed or an empty slice.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("invalid input value: {0}")]
pub struct InputValueError(pub String);

/// argmax returns the index of the maximum value in the array x. Ties are resolved in favour of
/// the lowest index since only strictly greater values replace the current maximum.
pub fn argmax<T: std::cmp::PartialOrd + std::marker::Copy>(x: &[T]) -> Result<usize, InputValueError> {
    let (&first, rest) = x
        .split_first()
        .ok_or_else(|| InputValueError(String::from("argmax of an empty slice")))?;
    let mut idx_max = 0;
    let mut val_max = first;

    for (i, &val) in rest.iter().enumerate() {
        if val > val_max {
            val_max = val;
            idx_max = i + 1;
        }
    }

    Ok(idx_max)
}

/// lin_interp maps x from the range [x0, x1] onto [f0, f1], clamping at the range ends.
pub fn lin_interp(x: f64, x0: f64, x1: f64, f0: f64, f1: f64) -> f64 {
    if x1 <= x0 || x <= x0 {
        return f0;
    }
    if x >= x1 {
        return f1;
    }
    f0 + (x - x0) * (f1 - f0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_picks_largest() {
        assert_eq!(argmax(&[0.3, 0.9, 0.1]), Ok(1));
    }

    #[test]
    fn argmax_prefers_lowest_index_on_tie() {
        assert_eq!(argmax(&[1.0, 5.0, 7.0, 3.0, 7.0, 2.0]), Ok(2));
        assert_eq!(argmax(&[4, 4, 4]), Ok(0));
    }

    #[test]
    fn argmax_single_element() {
        assert_eq!(argmax(&[42]), Ok(0));
    }

    #[test]
    fn argmax_empty_is_error() {
        let empty: [f64; 0] = [];
        assert!(argmax(&empty).is_err());
    }

    #[test]
    fn lin_interp_clamps() {
        assert_eq!(lin_interp(-1.0, 0.0, 100.0, 0.0, 10.0), 0.0);
        assert_eq!(lin_interp(50.0, 0.0, 100.0, 0.0, 10.0), 5.0);
        assert_eq!(lin_interp(150.0, 0.0, 100.0, 0.0, 10.0), 10.0);
    }
}
