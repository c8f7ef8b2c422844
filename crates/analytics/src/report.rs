use core_types::{ForwardPeriod, HeatmapMatrix};
use serde::{Deserialize, Serialize};

/// Every metric for one index, as served to the dashboard.
///
/// `heatmap` holds the forward-return matrix when `forward_period` is set and the
/// month-over-month matrix otherwise. `monthly_profits` is always month-over-month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapReport {
    pub index: String,
    pub forward_period: Option<ForwardPeriod>,
    pub heatmap: HeatmapMatrix<f64>,
    pub monthly_price: HeatmapMatrix<f64>,
    pub monthly_profits: HeatmapMatrix<f64>,
    pub avg_monthly_profits_3y: Option<f64>,
    pub rank_percentile_4y: Option<f64>,
    pub inverse_rank_percentile: Option<f64>,
    /// Rank positions per month, 1 being the best performer.
    pub monthly_rank_percentile: HeatmapMatrix<u32>,
}
