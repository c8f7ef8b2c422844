use core_types::{ForwardPeriod, MonthlySeries, ReturnSeries};

/// Decimal places used when returns leave the engine.
pub const RETURN_DECIMALS: u32 = 4;
/// Decimal places used for monthly average prices.
pub const PRICE_DECIMALS: u32 = 2;

/// `(current / previous) - 1` for every bucket after the first.
///
/// The first bucket, and any bucket next to an absent or zero value, is absent.
pub fn month_over_month(monthly: &MonthlySeries) -> ReturnSeries {
    let values: Vec<Option<f64>> = monthly.values().collect();

    monthly
        .buckets()
        .enumerate()
        .map(|(i, bucket)| {
            let value = match i {
                0 => None,
                _ => growth(values[i - 1], values[i]),
            };
            (bucket, value)
        })
        .collect()
}

/// `(monthly[i + horizon] / monthly[i]) - 1` for every bucket `i`.
///
/// The horizon is counted in buckets of the series. The last `horizon` buckets have
/// no future value and are always absent.
pub fn forward_returns(monthly: &MonthlySeries, period: ForwardPeriod) -> ReturnSeries {
    let horizon = period.months();
    let values: Vec<Option<f64>> = monthly.values().collect();

    monthly
        .buckets()
        .enumerate()
        .map(|(i, bucket)| {
            let future = values.get(i + horizon).copied().flatten();
            (bucket, growth(values[i], future))
        })
        .collect()
}

/// Fractional change from `from` to `to`, or `None` when it cannot be computed.
pub fn growth(from: Option<f64>, to: Option<f64>) -> Option<f64> {
    let (from, to) = (from?, to?);
    if from == 0.0 {
        return None;
    }
    Some(to / from - 1.0).filter(|r| r.is_finite())
}

/// Rounds to `decimals` places using the exact decimal value of `value`.
///
/// Exact ties go to the even digit, so `0.125` becomes `0.12`. Scaling by a power of
/// ten first would round on the scaled product instead, which can land on the
/// other side of a half step.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    format!("{value:.prec$}", prec = decimals as usize)
        .parse()
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core_types::YearMonth;

    fn series(values: &[Option<f64>]) -> MonthlySeries {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let i = i as u32;
                (YearMonth::new(2020 + (i / 12) as i32, i % 12 + 1), *v)
            })
            .collect()
    }

    #[test]
    fn test_month_over_month_scenario() {
        let returns = month_over_month(&series(&[Some(100.0), Some(110.0), Some(121.0)]));
        let values: Vec<_> = returns.values().collect();

        assert_eq!(values[0], None);
        assert_relative_eq!(values[1].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(values[2].unwrap(), 0.10, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_series_has_exactly_zero_returns() {
        let returns = month_over_month(&series(&[Some(42.5); 6]));
        let values: Vec<_> = returns.values().collect();

        assert_eq!(values[0], None);
        assert!(values[1..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_absence_and_zero_propagate() {
        let returns = month_over_month(&series(&[
            Some(10.0),
            None,
            Some(10.0),
            Some(0.0),
            Some(5.0),
        ]));
        let values: Vec<_> = returns.values().collect();

        assert_eq!(values, vec![None, None, None, Some(-1.0), None]);
    }

    #[test]
    fn test_forward_return_uses_future_bucket() {
        let monthly = series(&[Some(100.0), Some(120.0), Some(150.0), Some(90.0)]);
        let returns = forward_returns(&monthly, ForwardPeriod::ThreeMonths);
        let values: Vec<_> = returns.values().collect();

        assert_relative_eq!(values[0].unwrap(), -0.1, epsilon = 1e-12);
        assert_eq!(&values[1..], &[None, None, None]);
    }

    #[test]
    fn test_forward_tail_is_absent() {
        let monthly = series(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]);
        let returns = forward_returns(&monthly, ForwardPeriod::OneMonth);
        let values: Vec<_> = returns.values().collect();

        assert_eq!(values.len(), 5);
        assert_eq!(values[4], None);
        assert_relative_eq!(values[0].unwrap(), 1.0);
        assert_relative_eq!(values[3].unwrap(), 0.25);
    }

    #[test]
    fn test_one_year_forward_over_eight_months_is_all_absent() {
        let monthly = series(&[Some(100.0); 8]);
        let returns = forward_returns(&monthly, ForwardPeriod::OneYear);

        assert_eq!(returns.len(), 8);
        assert!(returns.values().all(|v| v.is_none()));
    }

    #[test]
    fn test_forward_skips_zero_and_absent_operands() {
        let monthly = series(&[Some(0.0), None, Some(4.0), Some(8.0)]);
        let returns = forward_returns(&monthly, ForwardPeriod::OneMonth);
        let values: Vec<_> = returns.values().collect();

        assert_eq!(values, vec![None, None, Some(1.0), None]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(-0.123449, 4), -0.1234);
        assert_eq!(round_to(1234.5678, 2), 1234.57);
        assert!(round_to(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_round_to_ties_and_binary_neighbours() {
        // Exact binary ties go to the even digit.
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(0.375, 2), 0.38);
        assert_eq!(round_to(-0.125, 2), -0.12);
        assert_eq!(round_to(2.5, 0), 2.0);
        // 2.675 is stored just below the half step.
        assert_eq!(round_to(2.675, 2), 2.67);
        // 1.0005 * 10^3 overshoots to exactly 1000.5 and a scaled round gives 1.001.
        assert_eq!(round_to(1.0005, 3), 1.0);
    }
}
