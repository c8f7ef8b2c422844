use chrono::NaiveDate;
use core_types::{MonthlySeries, YearMonth};

/// Reduces one index column of the daily table to one arithmetic mean per
/// `(year, month)` bucket.
///
/// Absent daily values are skipped. A bucket whose every value is absent is itself
/// absent. `dates` must be sorted ascending, which `TimeSeriesTable` guarantees, so
/// each bucket is a contiguous run of rows.
pub fn monthly_average(dates: &[NaiveDate], values: &[Option<f64>]) -> MonthlySeries {
    let mut points: Vec<(YearMonth, Option<f64>)> = Vec::new();
    let mut current: Option<YearMonth> = None;
    let mut sum = 0.0_f64;
    let mut count = 0_usize;

    for (date, value) in dates.iter().zip(values.iter()) {
        let bucket = YearMonth::from_date(date);
        if current != Some(bucket) {
            if let Some(done) = current {
                points.push((done, mean(sum, count)));
            }
            current = Some(bucket);
            sum = 0.0;
            count = 0;
        }
        if let Some(v) = value {
            sum += v;
            count += 1;
        }
    }

    if let Some(done) = current {
        points.push((done, mean(sum, count)));
    }

    MonthlySeries::new(points)
}

fn mean(sum: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| sum / count as f64)
}
