use core_types::{HeatmapMatrix, PeriodSeries};

/// Reshapes a bucket series into the year -> month -> value matrix.
///
/// One cell per bucket, absence kept as an explicit `None` cell. No arithmetic is
/// done here; rounding for presentation happens before the series is handed in.
pub fn build_matrix<T: Copy>(series: &PeriodSeries<T>) -> HeatmapMatrix<T> {
    let mut matrix = HeatmapMatrix::new();
    for (bucket, value) in series.iter() {
        matrix.insert(bucket, value);
    }
    matrix
}
