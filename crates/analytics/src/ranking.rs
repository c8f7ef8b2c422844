//! Cross-sectional comparison of one index against its peers.
//!
//! Every function here is pure; gathering the peer series is the caller's job.

use chrono::{Datelike, NaiveDate};
use core_types::{RankSeries, ReturnSeries};

/// Years covered by the trailing average of monthly returns.
pub const TRAILING_AVERAGE_YEARS: i32 = 3;
/// Years covered by the cumulative-return percentile.
pub const RANK_WINDOW_YEARS: i32 = 4;

pub const AVERAGE_DECIMALS: u32 = 6;
pub const PERCENTILE_DECIMALS: u32 = 2;

/// Mean of the present returns whose bucket year is strictly greater than
/// `latest_year - years`, `latest_year` being the year of the series' last bucket.
pub fn trailing_average(returns: &ReturnSeries, years: i32) -> Option<f64> {
    let latest_year = returns.last_bucket()?.year;
    let cutoff = latest_year - years;

    let (sum, count) = returns
        .iter()
        .filter(|(bucket, _)| bucket.year > cutoff)
        .filter_map(|(_, value)| value)
        .fold((0.0_f64, 0_usize), |(sum, count), r| (sum + r, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Cumulative return `(last / first) - 1` between the first and last present daily
/// observations dated after `after_year`.
///
/// Needs at least two present observations and a non-zero first one.
pub fn window_cumulative_return(
    dates: &[NaiveDate],
    values: &[Option<f64>],
    after_year: i32,
) -> Option<f64> {
    let start = dates.partition_point(|d| d.year() <= after_year);
    let mut present = values.get(start..)?.iter().flatten().copied();

    let first = present.next()?;
    let last = present.last()?;
    if first == 0.0 {
        return None;
    }
    Some(last / first - 1.0).filter(|r| r.is_finite())
}

/// Share of the comparison set strictly below `target`, in percent.
///
/// The set is `target` itself plus `peers`, so the best of `n` indices scores
/// `(n - 1) / n * 100` and an index compared with nobody scores `0`.
pub fn percentile_rank(target: f64, peers: &[f64]) -> f64 {
    let below = peers.iter().filter(|&&p| p < target).count();
    below as f64 / (peers.len() + 1) as f64 * 100.0
}

/// `1 + (number of peers strictly above target)`. `None` without peers.
///
/// Peers equal to the target do not push it down, so tied indices share a rank.
pub fn rank_position(target: f64, peers: &[f64]) -> Option<u32> {
    if peers.is_empty() {
        return None;
    }
    let better = peers.iter().filter(|&&p| p > target).count();
    Some(better as u32 + 1)
}

/// Rank of the target's return against the same-bucket returns of every peer.
///
/// The caller must not include the target among `peers`. Buckets where the target is
/// absent, or where no peer has a value, are absent.
pub fn monthly_rank_positions(target: &ReturnSeries, peers: &[&ReturnSeries]) -> RankSeries {
    target
        .iter()
        .map(|(bucket, value)| {
            let rank = value.and_then(|target_return| {
                let same_bucket: Vec<f64> =
                    peers.iter().filter_map(|peer| peer.get(&bucket)).collect();
                rank_position(target_return, &same_bucket)
            });
            (bucket, rank)
        })
        .collect()
}
