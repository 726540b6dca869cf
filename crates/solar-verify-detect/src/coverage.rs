use solar_verify_core::BinaryMask;

/// Percentage of set cells in `mask`, in `[0, 100]`. An empty mask has zero
/// coverage.
pub fn coverage_percent(mask: &BinaryMask) -> f64 {
    if mask.is_empty() {
        return 0.0;
    }
    let pct = mask.count_nonzero() as f64 / mask.len() as f64 * 100.0;
    pct.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_and_clear_masks_have_zero_coverage() {
        assert_eq!(coverage_percent(&BinaryMask::new(0, 0)), 0.0);
        assert_eq!(coverage_percent(&BinaryMask::new(10, 4)), 0.0);
    }

    #[test]
    fn coverage_is_the_set_fraction() {
        let mut mask = BinaryMask::new(10, 10);
        for x in 0..10 {
            mask.set(x, 0, true);
            mask.set(x, 1, true);
        }
        assert_relative_eq!(coverage_percent(&mask), 20.0);
    }

    #[test]
    fn full_mask_is_one_hundred_percent() {
        let mut mask = BinaryMask::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                mask.set(x, y, true);
            }
        }
        assert_relative_eq!(coverage_percent(&mask), 100.0);
    }
}
