use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, Utc};
use linfa::prelude::*;
use linfa_svm::Svm;
use ndarray::{s, Array1, Array2};
use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::market_data::MarketDataProvider;
use crate::models::{DateRange, ForecastPoint, ForecastRequest, ForecastResult, SvrParams};
use crate::services::indicators::mean_absolute_error;
use crate::services::price_service;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 60;
pub const MAX_HORIZON_DAYS: i64 = 365;
const MAX_FOLDS: usize = 5;
const MIN_OBSERVATIONS: usize = 10;
/// Stopping tolerance and shrinking as in libsvm's defaults.
const SOLVER_TOLERANCE: f64 = 1e-3;
/// Wall-clock cap on the grid search; candidates not started by then are
/// skipped.
pub const SEARCH_BUDGET: StdDuration = StdDuration::from_secs(20);

/// Hyper-parameter grid for the RBF-kernel SVR search.
#[derive(Debug, Clone)]
pub struct SvrGrid {
    pub c: Vec<f64>,
    pub epsilon: Vec<f64>,
    pub gamma: Vec<f64>,
}

impl Default for SvrGrid {
    fn default() -> Self {
        Self {
            c: vec![0.001, 0.01, 0.1, 1.0, 100.0, 1000.0],
            epsilon: vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0,
                150.0, 1000.0,
            ],
            gamma: vec![0.0001, 0.001, 0.005, 0.01, 0.1, 1.0, 5.0, 8.0, 40.0, 100.0, 1000.0],
        }
    }
}

impl SvrGrid {
    /// Candidates in grid order (C outermost, gamma innermost).
    pub fn candidates(&self) -> Vec<SvrParams> {
        self.c
            .iter()
            .flat_map(|&c| {
                self.epsilon.iter().flat_map(move |&epsilon| {
                    self.gamma.iter().map(move |&gamma| SvrParams { c, epsilon, gamma })
                })
            })
            .collect()
    }
}

/// Output of the model step, before dates are attached.
#[derive(Debug, Clone)]
pub struct SvrForecast {
    pub predictions: Vec<f64>,
    pub params: SvrParams,
    pub holdout_mae: f64,
    pub training_size: usize,
}

/// Parse the horizon text box. Missing, non-numeric, and out-of-range values
/// are input errors.
pub fn parse_horizon(input: Option<&str>) -> Result<i64, AppError> {
    let raw = input.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        AppError::Validation("Please enter the number of days to forecast".into())
    })?;

    let days: i64 = raw
        .parse()
        .map_err(|_| AppError::Validation(format!("Number of days must be a whole number, got '{}'", raw)))?;

    validate_horizon(days)?;
    Ok(days)
}

pub fn validate_horizon(days: i64) -> Result<(), AppError> {
    if days < 1 {
        return Err(AppError::Validation(format!(
            "Number of days must be at least 1, got {}",
            days
        )));
    }
    if days > MAX_HORIZON_DAYS {
        return Err(AppError::Validation(format!(
            "Number of days must be at most {}, got {}",
            MAX_HORIZON_DAYS, days
        )));
    }
    Ok(())
}

/// Contiguous, unshuffled k-fold boundaries. The first `n % k` folds get one
/// extra row.
fn fold_bounds(n: usize, k: usize) -> Vec<(usize, usize)> {
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let bounds = (start, start + len);
            start += len;
            bounds
        })
        .collect()
}

fn fit_svr(
    params: &SvrParams,
    x: &Array2<f64>,
    y: &Array1<f64>,
) -> Result<Svm<f64, f64>, linfa_svm::SvmError> {
    let dataset = Dataset::new(x.clone(), y.clone());
    Svm::<f64, f64>::params()
        .c_svr(params.c, Some(params.epsilon))
        .gaussian_kernel(1.0 / params.gamma)
        .eps(SOLVER_TOLERANCE)
        .shrinking(true)
        .fit(&dataset)
}

/// Mean validation MAE across folds; infinite when any fold fails to fit.
fn cross_validate(params: &SvrParams, x: &Array2<f64>, y: &Array1<f64>, folds: usize) -> f64 {
    let n = y.len();
    let mut total = 0.0;

    for (start, end) in fold_bounds(n, folds) {
        let train_idx: Vec<usize> = (0..start).chain(end..n).collect();
        let x_train = x.select(ndarray::Axis(0), &train_idx);
        let y_train = y.select(ndarray::Axis(0), &train_idx);
        let x_valid = x.slice(s![start..end, ..]).to_owned();
        let y_valid = y.slice(s![start..end]).to_vec();

        let Ok(model) = fit_svr(params, &x_train, &y_train) else {
            return f64::INFINITY;
        };
        let predicted = model.predict(&x_valid);
        total += mean_absolute_error(&y_valid, &predicted.to_vec());
    }

    total / folds as f64
}

/// Grid-search an RBF SVR on `closes` indexed by day number and predict the
/// next `horizon` days.
pub fn fit_and_predict(closes: &[f64], horizon: usize, grid: &SvrGrid) -> Result<SvrForecast, AppError> {
    let n = closes.len();
    if n < MIN_OBSERVATIONS {
        return Err(AppError::Validation(format!(
            "Not enough price history to forecast: need at least {} observations, got {}",
            MIN_OBSERVATIONS, n
        )));
    }
    if horizon == 0 {
        return Err(AppError::Validation("Number of days must be at least 1".into()));
    }

    // 10% hold-out, rounded up
    let test_size = n.div_ceil(10);
    let train_size = n - test_size;

    let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64);
    let y = Array1::from(closes.to_vec());
    let x_train = x.slice(s![..train_size, ..]).to_owned();
    let y_train = y.slice(s![..train_size]).to_owned();
    let x_test = x.slice(s![train_size.., ..]).to_owned();
    let y_test = y.slice(s![train_size..]).to_vec();

    let folds = MAX_FOLDS.min(train_size);
    let candidates = grid.candidates();
    if candidates.is_empty() {
        return Err(AppError::Internal("SVR grid has no candidates".into()));
    }

    let deadline = Instant::now() + SEARCH_BUDGET;
    let scores: Vec<Option<f64>> = candidates
        .par_iter()
        .map(|params| {
            if Instant::now() >= deadline {
                return None;
            }
            Some(cross_validate(params, &x_train, &y_train, folds))
        })
        .collect();

    let skipped = scores.iter().filter(|s| s.is_none()).count();
    if skipped > 0 {
        warn!(
            "SVR search budget of {:?} exhausted; skipped {} of {} candidates",
            SEARCH_BUDGET,
            skipped,
            candidates.len()
        );
    }

    // first candidate wins ties
    let (best_idx, best_score) = scores
        .iter()
        .map(|s| s.unwrap_or(f64::INFINITY))
        .enumerate()
        .fold((0, f64::INFINITY), |(bi, bs), (i, s)| if s < bs { (i, s) } else { (bi, bs) });
    if !best_score.is_finite() {
        warn!("No SVR candidate produced a finite validation score; using first grid entry");
    }
    let params = candidates[best_idx];

    let model = fit_svr(&params, &x_train, &y_train)
        .map_err(|e| AppError::Internal(format!("SVR fit failed: {}", e)))?;

    let holdout_mae = mean_absolute_error(&y_test, &model.predict(&x_test).to_vec());

    let last_index = (n - 1) as f64;
    let x_future = Array2::from_shape_fn((horizon, 1), |(i, _)| last_index + (i + 1) as f64);
    let predictions = model.predict(&x_future).to_vec();

    Ok(SvrForecast {
        predictions,
        params,
        holdout_mae,
        training_size: train_size,
    })
}

pub async fn generate_forecast(
    provider: &dyn MarketDataProvider,
    request: &ForecastRequest,
    lookback_days: i64,
    grid: SvrGrid,
) -> Result<ForecastResult, AppError> {
    validate_horizon(request.horizon_days)?;
    let ticker = price_service::normalize_ticker(&request.ticker)?;

    info!(
        "Generating forecast for {} ({} days ahead, {} day lookback)",
        ticker, request.horizon_days, lookback_days
    );

    let today = Utc::now().date_naive();
    let start = Duration::try_days(lookback_days)
        .and_then(|window| today.checked_sub_signed(window))
        .ok_or_else(|| AppError::Internal(format!("lookback of {} days is out of range", lookback_days)))?;
    let range = DateRange::new(start, Some(today));
    let bars = provider.fetch_history(&ticker, Some(range)).await.map_err(|e| {
        error!("Failed to fetch forecast history for {}: {}", ticker, e);
        AppError::from(e)
    })?;
    let bars = price_service::normalize_bars(bars, Some(range), today);

    let Some(last_date) = bars.last().map(|b| b.date) else {
        return Err(AppError::Validation(format!(
            "No recent price history for {} to forecast from",
            ticker
        )));
    };

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let horizon = request.horizon_days as usize;

    let fitted = tokio::task::spawn_blocking(move || fit_and_predict(&closes, horizon, &grid))
        .await
        .map_err(|e| AppError::Internal(format!("forecast task failed: {}", e)))??;

    info!(
        "✓ Forecast for {}: C={} epsilon={} gamma={} holdout MAE={:.4}",
        ticker, fitted.params.c, fitted.params.epsilon, fitted.params.gamma, fitted.holdout_mae
    );

    let points = fitted
        .predictions
        .into_iter()
        .enumerate()
        .map(|(i, predicted_close)| ForecastPoint {
            date: last_date + Duration::days(i as i64 + 1),
            predicted_close,
        })
        .collect();

    Ok(ForecastResult {
        ticker,
        points,
        params: fitted.params,
        holdout_mae: fitted.holdout_mae,
        training_size: fitted.training_size,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> SvrGrid {
        SvrGrid {
            c: vec![1.0, 100.0],
            epsilon: vec![0.1, 1.0],
            gamma: vec![0.01, 0.1],
        }
    }

    #[test]
    fn test_parse_horizon() {
        assert_eq!(parse_horizon(Some(" 5 ")).unwrap(), 5);
        assert!(matches!(parse_horizon(Some("0")), Err(AppError::Validation(_))));
        assert!(matches!(parse_horizon(Some("-3")), Err(AppError::Validation(_))));
        assert!(matches!(parse_horizon(Some("ten")), Err(AppError::Validation(_))));
        assert!(matches!(parse_horizon(Some("")), Err(AppError::Validation(_))));
        assert!(matches!(parse_horizon(None), Err(AppError::Validation(_))));
        assert!(matches!(parse_horizon(Some("366")), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_fold_bounds_cover_all_rows() {
        assert_eq!(fold_bounds(12, 5), vec![(0, 3), (3, 6), (6, 8), (8, 10), (10, 12)]);
        assert_eq!(fold_bounds(2, 2), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_grid_candidate_order() {
        let grid = small_grid();
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0], SvrParams { c: 1.0, epsilon: 0.1, gamma: 0.01 });
        assert_eq!(candidates[1], SvrParams { c: 1.0, epsilon: 0.1, gamma: 0.1 });
        assert_eq!(candidates[7], SvrParams { c: 100.0, epsilon: 1.0, gamma: 0.1 });
        assert_eq!(SvrGrid::default().candidates().len(), 6 * 15 * 11);
    }

    #[test]
    fn test_fit_and_predict_returns_horizon_points() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin() * 2.0 + i as f64 * 0.1).collect();
        let out = fit_and_predict(&closes, 7, &small_grid()).unwrap();

        assert_eq!(out.predictions.len(), 7);
        assert!(out.predictions.iter().all(|p| p.is_finite()));
        assert_eq!(out.training_size, 36);
        assert!(out.holdout_mae.is_finite());
    }

    #[test]
    fn test_fit_and_predict_needs_history() {
        assert!(matches!(
            fit_and_predict(&[], 3, &small_grid()),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            fit_and_predict(&[1.0, 2.0, 3.0, 4.0, 5.0], 3, &small_grid()),
            Err(AppError::Validation(_))
        ));
    }

    struct FlatProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for FlatProvider {
        async fn fetch_history(
            &self,
            _ticker: &str,
            _range: Option<DateRange>,
        ) -> Result<Vec<crate::models::PriceBar>, crate::external::market_data::MarketDataError> {
            Ok(Vec::new())
        }

        async fn fetch_company_info(
            &self,
            ticker: &str,
        ) -> Result<crate::models::CompanyInfo, crate::external::market_data::MarketDataError> {
            Err(crate::external::market_data::MarketDataError::NotFound(ticker.to_string()))
        }

        fn name(&self) -> &'static str {
            "flat"
        }
    }

    #[tokio::test]
    async fn test_oversized_lookback_is_an_error_not_a_panic() {
        let request = ForecastRequest { ticker: "AAPL".into(), horizon_days: 5 };
        let result = generate_forecast(&FlatProvider, &request, i64::MAX, small_grid()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[test]
    fn test_default_grid_on_lookback_window() {
        // about 41 trading days in a 60 calendar-day window
        let closes: Vec<f64> = (0..41)
            .map(|i| 180.0 + (i as f64 * 0.35).sin() * 4.0 + i as f64 * 0.2)
            .collect();

        let started = Instant::now();
        let out = fit_and_predict(&closes, 5, &SvrGrid::default()).unwrap();
        let elapsed = started.elapsed();

        assert_eq!(out.predictions.len(), 5);
        assert!(out.predictions.iter().all(|p| p.is_finite()));
        assert!(out.holdout_mae.is_finite());
        assert_eq!(out.training_size, 36);
        // in-flight fits may finish after the budget runs out
        assert!(
            elapsed < SEARCH_BUDGET + StdDuration::from_secs(10),
            "default grid search took {:?}",
            elapsed
        );
    }

    #[test]
    fn test_fit_and_predict_minimum_history() {
        let closes: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let out = fit_and_predict(&closes, 2, &small_grid()).unwrap();
        assert_eq!(out.predictions.len(), 2);
        assert_eq!(out.training_size, 9);
    }
}
