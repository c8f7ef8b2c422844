use crate::aggregator;
use crate::cache::{CacheKey, CacheStats, Operation, ResultCache};
use crate::error::AnalyticsError;
use crate::matrix::build_matrix;
use crate::ranking::{
    self, AVERAGE_DECIMALS, PERCENTILE_DECIMALS, RANK_WINDOW_YEARS, TRAILING_AVERAGE_YEARS,
};
use crate::report::HeatmapReport;
use crate::returns::{self, PRICE_DECIMALS, RETURN_DECIMALS, round_to};
use core_types::{ForwardPeriod, HeatmapMatrix, MonthlySeries, ReturnSeries, TimeSeriesTable};
use std::sync::Arc;
use tracing::{debug, info};

/// The statistics engine for one loaded dataset.
///
/// Construct it once per table and share it (it is `Send + Sync`). Every operation
/// validates the index name first and fails with `AnalyticsError::UnknownIndex`
/// before doing any work.
#[derive(Debug)]
pub struct HeatmapService {
    table: Arc<TimeSeriesTable>,
    cache: ResultCache,
}

impl HeatmapService {
    pub fn new(table: impl Into<Arc<TimeSeriesTable>>) -> Self {
        let table = table.into();
        info!(
            rows = table.row_count(),
            indices = table.index_count(),
            "Heatmap service initialized."
        );
        Self {
            table,
            cache: ResultCache::new(),
        }
    }

    /// Valid index names, in table column order.
    pub fn index_names(&self) -> &[String] {
        self.table.index_names()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn column(&self, index_name: &str) -> Result<&[Option<f64>], AnalyticsError> {
        self.table
            .column(index_name)
            .ok_or_else(|| AnalyticsError::UnknownIndex(index_name.to_string()))
    }

    fn parse_period(token: &str) -> Result<ForwardPeriod, AnalyticsError> {
        token
            .parse()
            .map_err(|_| AnalyticsError::InvalidPeriod(token.to_string()))
    }

    // --- Series (cached) ---

    /// Mean of the daily values in each `(year, month)` bucket.
    pub fn monthly_average(&self, index_name: &str) -> Result<Arc<MonthlySeries>, AnalyticsError> {
        let values = self.column(index_name)?;
        self.cache.get_or_try_insert_with(
            CacheKey::new(index_name, Operation::MonthlyAverage),
            || Ok(aggregator::monthly_average(self.table.dates(), values)),
        )
    }

    pub fn month_over_month_returns(
        &self,
        index_name: &str,
    ) -> Result<Arc<ReturnSeries>, AnalyticsError> {
        self.column(index_name)?;
        self.cache.get_or_try_insert_with(
            CacheKey::new(index_name, Operation::MonthOverMonth),
            || {
                let monthly = self.monthly_average(index_name)?;
                Ok(returns::month_over_month(&monthly))
            },
        )
    }

    pub fn forward_returns(
        &self,
        index_name: &str,
        period: ForwardPeriod,
    ) -> Result<Arc<ReturnSeries>, AnalyticsError> {
        self.column(index_name)?;
        self.cache.get_or_try_insert_with(
            CacheKey::new(index_name, Operation::ForwardReturn).with_arg(period),
            || {
                let monthly = self.monthly_average(index_name)?;
                Ok(returns::forward_returns(&monthly, period))
            },
        )
    }

    // --- Matrices ---

    /// Month-over-month returns, rounded to 4 decimals.
    pub fn heatmap_matrix(&self, index_name: &str) -> Result<HeatmapMatrix<f64>, AnalyticsError> {
        let returns = self.month_over_month_returns(index_name)?;
        Ok(build_matrix(&returns.map(|r| round_to(r, RETURN_DECIMALS))))
    }

    /// Forward returns for a period token such as `"1Y"`, rounded to 4 decimals.
    pub fn forward_return_matrix(
        &self,
        index_name: &str,
        forward_period: &str,
    ) -> Result<HeatmapMatrix<f64>, AnalyticsError> {
        self.column(index_name)?;
        let period = Self::parse_period(forward_period)?;
        self.forward_matrix(index_name, period)
    }

    fn forward_matrix(
        &self,
        index_name: &str,
        period: ForwardPeriod,
    ) -> Result<HeatmapMatrix<f64>, AnalyticsError> {
        let returns = self.forward_returns(index_name, period)?;
        Ok(build_matrix(&returns.map(|r| round_to(r, RETURN_DECIMALS))))
    }

    /// Monthly average prices, rounded to 2 decimals.
    pub fn monthly_price_matrix(
        &self,
        index_name: &str,
    ) -> Result<HeatmapMatrix<f64>, AnalyticsError> {
        let monthly = self.monthly_average(index_name)?;
        Ok(build_matrix(&monthly.map(|p| round_to(p, PRICE_DECIMALS))))
    }

    /// Rank of the index's monthly return among all other indices, 1 being best.
    pub fn monthly_rank_matrix(
        &self,
        index_name: &str,
    ) -> Result<HeatmapMatrix<u32>, AnalyticsError> {
        let target = self.month_over_month_returns(index_name)?;

        let peers = self
            .peer_names(index_name)
            .map(|peer| {
                self.month_over_month_returns(peer).map_err(|e| {
                    AnalyticsError::InternalError(format!("returns for peer '{peer}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let peer_refs: Vec<&ReturnSeries> = peers.iter().map(Arc::as_ref).collect();

        debug!(index = index_name, peers = peer_refs.len(), "Ranking monthly returns.");
        Ok(build_matrix(&ranking::monthly_rank_positions(&target, &peer_refs)))
    }

    // --- Scalars ---

    /// Average month-over-month return over the last three years, 6 decimals.
    pub fn avg_monthly_return_3y(&self, index_name: &str) -> Result<Option<f64>, AnalyticsError> {
        let returns = self.month_over_month_returns(index_name)?;
        Ok(ranking::trailing_average(&returns, TRAILING_AVERAGE_YEARS)
            .map(|avg| round_to(avg, AVERAGE_DECIMALS)))
    }

    /// Percentage of the comparable indices, this one included, whose four-year
    /// cumulative return is strictly below this index's, 2 decimals. Peers without
    /// enough data are left out; absent only when this index lacks data itself.
    pub fn rank_percentile_4y(&self, index_name: &str) -> Result<Option<f64>, AnalyticsError> {
        let values = self.column(index_name)?;
        let Some(latest_year) = self.table.latest_year() else {
            return Ok(None);
        };
        let after_year = latest_year - RANK_WINDOW_YEARS;
        let dates = self.table.dates();

        let Some(target) = ranking::window_cumulative_return(dates, values, after_year) else {
            debug!(index = index_name, "Not enough observations for the 4y window.");
            return Ok(None);
        };

        let mut peer_returns = Vec::with_capacity(self.table.index_count());
        for peer in self.peer_names(index_name) {
            let peer_values = self.table.column(peer).ok_or_else(|| {
                AnalyticsError::InternalError(format!("column '{peer}' is listed but not stored"))
            })?;
            match ranking::window_cumulative_return(dates, peer_values, after_year) {
                Some(r) => peer_returns.push(r),
                None => debug!(peer = %peer, "Peer skipped, not enough observations."),
            }
        }

        let percentile = ranking::percentile_rank(target, &peer_returns);
        Ok(Some(round_to(percentile, PERCENTILE_DECIMALS)))
    }

    /// `100 - rank_percentile_4y`, absent when the percentile is.
    pub fn inverse_rank_percentile(&self, index_name: &str) -> Result<Option<f64>, AnalyticsError> {
        Ok(inverse_of(self.rank_percentile_4y(index_name)?))
    }

    // --- Bundle ---

    /// Every metric for one index. With a forward period the `heatmap` field holds
    /// forward returns; without one it repeats the month-over-month matrix.
    pub fn report(
        &self,
        index_name: &str,
        forward_period: Option<&str>,
    ) -> Result<HeatmapReport, AnalyticsError> {
        self.column(index_name)?;
        let period = forward_period.map(Self::parse_period).transpose()?;

        let monthly_profits = self.heatmap_matrix(index_name)?;
        let heatmap = match period {
            Some(period) => self.forward_matrix(index_name, period)?,
            None => monthly_profits.clone(),
        };
        let rank_percentile_4y = self.rank_percentile_4y(index_name)?;

        let report = HeatmapReport {
            index: index_name.to_string(),
            forward_period: period,
            heatmap,
            monthly_price: self.monthly_price_matrix(index_name)?,
            monthly_profits,
            avg_monthly_profits_3y: self.avg_monthly_return_3y(index_name)?,
            rank_percentile_4y,
            inverse_rank_percentile: inverse_of(rank_percentile_4y),
            monthly_rank_percentile: self.monthly_rank_matrix(index_name)?,
        };

        debug!(index = index_name, cache = ?self.cache.stats(), "Report built.");
        Ok(report)
    }

    fn peer_names<'a>(&'a self, index_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.table
            .index_names()
            .iter()
            .map(String::as_str)
            .filter(move |name| *name != index_name)
    }
}

fn inverse_of(rank_percentile: Option<f64>) -> Option<f64> {
    rank_percentile.map(|p| round_to(100.0 - p, PERCENTILE_DECIMALS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use core_types::YearMonth;

    /// One observation on the first day of each month, starting January 2020.
    fn monthly_table(columns: &[(&str, Vec<Option<f64>>)]) -> TimeSeriesTable {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let dates = (0..n)
            .map(|i| {
                NaiveDate::from_ymd_opt(2020 + (i / 12) as i32, (i % 12) as u32 + 1, 1).unwrap()
            })
            .collect();
        let columns = columns
            .iter()
            .map(|(name, values)| (name.to_string(), values.clone()))
            .collect();
        TimeSeriesTable::new(dates, columns).unwrap()
    }

    fn values(raw: &[f64]) -> Vec<Option<f64>> {
        raw.iter().copied().map(Some).collect()
    }

    /// `n` points that sit at `first` and jump to `last` on the final point.
    fn jump(n: usize, first: f64, last: f64) -> Vec<Option<f64>> {
        let mut v = vec![Some(first); n];
        v[n - 1] = Some(last);
        v
    }

    #[test]
    fn test_unknown_index_fails_every_operation() {
        let service = HeatmapService::new(monthly_table(&[("A", values(&[1.0, 2.0]))]));
        let unknown = AnalyticsError::UnknownIndex("B".to_string());

        assert_eq!(service.monthly_average("B").unwrap_err(), unknown);
        assert_eq!(service.heatmap_matrix("B").unwrap_err(), unknown);
        assert_eq!(service.forward_return_matrix("B", "1M").unwrap_err(), unknown);
        assert_eq!(service.forward_return_matrix("B", "5Y").unwrap_err(), unknown);
        assert_eq!(service.monthly_price_matrix("B").unwrap_err(), unknown);
        assert_eq!(service.avg_monthly_return_3y("B").unwrap_err(), unknown);
        assert_eq!(service.rank_percentile_4y("B").unwrap_err(), unknown);
        assert_eq!(service.inverse_rank_percentile("B").unwrap_err(), unknown);
        assert_eq!(service.monthly_rank_matrix("B").unwrap_err(), unknown);
        assert_eq!(service.report("B", None).unwrap_err(), unknown);
        assert!(service.cache_stats().entries == 0);
    }

    #[test]
    fn test_invalid_forward_period() {
        let service = HeatmapService::new(monthly_table(&[("A", values(&[1.0, 2.0]))]));
        assert_eq!(
            service.forward_return_matrix("A", "5Y").unwrap_err(),
            AnalyticsError::InvalidPeriod("5Y".to_string())
        );
        assert_eq!(
            service.report("A", Some("2W")).unwrap_err(),
            AnalyticsError::InvalidPeriod("2W".to_string())
        );
    }

    #[test]
    fn test_month_over_month_matrix() {
        let service = HeatmapService::new(monthly_table(&[("A", values(&[100.0, 110.0, 121.0]))]));
        let matrix = service.heatmap_matrix("A").unwrap();

        assert_eq!(matrix.get(2020, 1), Some(&None));
        assert_eq!(matrix.get(2020, 2), Some(&Some(0.1)));
        assert_eq!(matrix.get(2020, 3), Some(&Some(0.1)));
    }

    #[test]
    fn test_monthly_average_is_cached() {
        let service = HeatmapService::new(monthly_table(&[("A", values(&[1.0, 2.0, 3.0]))]));

        let first = service.monthly_average("A").unwrap();
        let second = service.monthly_average("A").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Returns reuse the cached averages instead of rescanning the table.
        service.month_over_month_returns("A").unwrap();
        let stats = service.cache_stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 2);
    }

    #[test]
    fn test_forward_matrix_tail_and_short_series() {
        let service = HeatmapService::new(monthly_table(&[(
            "A",
            values(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0, 106.0, 107.0]),
        )]));

        let one_year = service.forward_return_matrix("A", "1Y").unwrap();
        assert_eq!(one_year.cell_count(), 8);
        assert!(one_year.rows().values().flat_map(|m| m.values()).all(Option::is_none));

        let three_months = service.forward_return_matrix("A", "3M").unwrap();
        assert_eq!(three_months.get(2020, 1), Some(&Some(0.03)));
        for month in 6..=8 {
            assert_eq!(three_months.get(2020, month), Some(&None));
        }
    }

    #[test]
    fn test_monthly_price_matrix_rounds_to_cents() {
        let service = HeatmapService::new(monthly_table(&[("A", values(&[1234.5678, 10.0]))]));
        let matrix = service.monthly_price_matrix("A").unwrap();
        assert_eq!(matrix.get(2020, 1), Some(&Some(1234.57)));
        assert_eq!(matrix.get(2020, 2), Some(&Some(10.0)));
    }

    #[test]
    fn test_tied_indices_both_rank_first() {
        let service = HeatmapService::new(monthly_table(&[
            ("A", values(&[100.0, 110.0, 99.0])),
            ("B", values(&[200.0, 220.0, 198.0])),
            ("C", values(&[100.0, 105.0, 100.0])),
        ]));

        let a = service.monthly_rank_matrix("A").unwrap();
        let b = service.monthly_rank_matrix("B").unwrap();
        let c = service.monthly_rank_matrix("C").unwrap();

        assert_eq!(a.get(2020, 1), Some(&None));
        assert_eq!(a.get(2020, 2), Some(&Some(1)));
        assert_eq!(b.get(2020, 2), Some(&Some(1)));
        assert_eq!(c.get(2020, 2), Some(&Some(3)));
        assert_eq!(c.get(2020, 3), Some(&Some(1)));
    }

    #[test]
    fn test_single_index_ranks_against_itself() {
        let service = HeatmapService::new(monthly_table(&[("A", values(&[1.0, 2.0, 3.0]))]));
        let ranks = service.monthly_rank_matrix("A").unwrap();
        assert!(ranks.rows().values().flat_map(|m| m.values()).all(Option::is_none));
        assert_eq!(service.rank_percentile_4y("A").unwrap(), Some(0.0));
        assert_eq!(service.inverse_rank_percentile("A").unwrap(), Some(100.0));
    }

    #[test]
    fn test_best_of_three_is_below_one_hundred() {
        let service = HeatmapService::new(monthly_table(&[
            ("A", values(&[100.0, 300.0])),
            ("B", values(&[100.0, 200.0])),
            ("C", values(&[100.0, 150.0])),
        ]));

        assert_eq!(service.rank_percentile_4y("A").unwrap(), Some(66.67));
        assert_eq!(service.rank_percentile_4y("B").unwrap(), Some(33.33));
        assert_eq!(service.rank_percentile_4y("C").unwrap(), Some(0.0));
        assert_eq!(service.inverse_rank_percentile("A").unwrap(), Some(33.33));
    }

    #[test]
    fn test_rank_percentile_counts_target_and_skips_thin_peers() {
        let mut thin = vec![None; 48];
        thin[10] = Some(100.0);
        let service = HeatmapService::new(monthly_table(&[
            ("T", jump(48, 100.0, 200.0)),
            ("P1", jump(48, 100.0, 150.0)),
            ("P2", jump(48, 100.0, 300.0)),
            ("THIN", thin),
        ]));

        let rank = service.rank_percentile_4y("T").unwrap().unwrap();
        let inverse = service.inverse_rank_percentile("T").unwrap().unwrap();
        // T, P1 and P2 are comparable; only P1 is below T.
        assert_relative_eq!(rank, 33.33);
        assert_relative_eq!(rank + inverse, 100.0, epsilon = 1e-9);

        assert_relative_eq!(service.rank_percentile_4y("P2").unwrap().unwrap(), 66.67);
        assert_relative_eq!(service.rank_percentile_4y("P1").unwrap().unwrap(), 0.0);
        assert_eq!(service.rank_percentile_4y("THIN").unwrap(), None);
    }

    #[test]
    fn test_rank_percentile_uses_trailing_window_only() {
        // 60 months, 2020-2024. The 4y window starts in 2021, so the 2020 crash of
        // "B" is outside it.
        let mut a = vec![Some(100.0); 60];
        a[59] = Some(110.0);
        let mut b = vec![Some(100.0); 60];
        b[0] = Some(1000.0);
        b[59] = Some(120.0);
        let service = HeatmapService::new(monthly_table(&[("A", a), ("B", b)]));

        assert_relative_eq!(service.rank_percentile_4y("B").unwrap().unwrap(), 50.0);
        assert_relative_eq!(service.rank_percentile_4y("A").unwrap().unwrap(), 0.0);
        assert_relative_eq!(service.inverse_rank_percentile("A").unwrap().unwrap(), 100.0);
    }

    #[test]
    fn test_avg_monthly_return_3y() {
        let mut raw = vec![100.0];
        for i in 0..47 {
            let factor = if i < 11 { 1.10 } else { 1.01 };
            raw.push(raw[i] * factor);
        }
        let service = HeatmapService::new(monthly_table(&[("A", values(&raw))]));

        let avg = service.avg_monthly_return_3y("A").unwrap().unwrap();
        assert_relative_eq!(avg, 0.01, epsilon = 1e-9);

        let empty = HeatmapService::new(monthly_table(&[("A", vec![Some(1.0), None])]));
        assert_eq!(empty.avg_monthly_return_3y("A").unwrap(), None);
    }

    #[test]
    fn test_report_bundles_every_metric() {
        let service = HeatmapService::new(monthly_table(&[
            ("A", values(&[100.0, 110.0, 121.0, 133.1])),
            ("B", values(&[100.0, 100.0, 100.0, 100.0])),
        ]));

        let plain = service.report("A", None).unwrap();
        assert_eq!(plain.index, "A");
        assert_eq!(plain.forward_period, None);
        assert_eq!(plain.heatmap, plain.monthly_profits);
        assert_eq!(plain.rank_percentile_4y, Some(50.0));
        assert_eq!(plain.inverse_rank_percentile, Some(50.0));
        assert_eq!(plain.monthly_rank_percentile.get(2020, 2), Some(&Some(1)));
        assert_eq!(plain.monthly_price.get(2020, 4), Some(&Some(133.1)));

        let forward = service.report("A", Some("1M")).unwrap();
        assert_eq!(forward.forward_period, Some(ForwardPeriod::OneMonth));
        assert_eq!(forward.heatmap.get(2020, 1), Some(&Some(0.1)));
        assert_eq!(forward.heatmap.get(2020, 4), Some(&None));
        assert_eq!(forward.monthly_profits, plain.monthly_profits);

        let json = serde_json::to_value(&forward).unwrap();
        assert_eq!(json["forward_period"], "1M");
        assert_eq!(json["monthly_profits"]["2020"]["1"], serde_json::Value::Null);
        assert_eq!(json["monthly_rank_percentile"]["2020"]["3"], 1);
    }

    #[test]
    fn test_monthly_average_buckets_follow_table() {
        let service = HeatmapService::new(monthly_table(&[("A", values(&[1.0; 14]))]));
        let monthly = service.monthly_average("A").unwrap();
        assert_eq!(monthly.len(), 14);
        assert_eq!(monthly.first_bucket(), Some(YearMonth::new(2020, 1)));
        assert_eq!(monthly.last_bucket(), Some(YearMonth::new(2021, 2)));
    }
}
