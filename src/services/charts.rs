//! Figure builders. All of them are pure: the same input always yields an
//! identical `Figure`.

use crate::models::{Figure, ForecastResult, Layout, PriceSeries, Trace, TraceMode};
use crate::services::indicators::ewm_mean;

pub const EMA_SPAN: usize = 20;

/// Open and close prices overlaid as two lines.
pub fn get_stock_price_fig(series: &PriceSeries) -> Figure {
    let dates = series.dates();

    Figure {
        data: vec![
            Trace::scatter("Close", TraceMode::Lines, dates.clone(), series.closes()),
            Trace::scatter("Open", TraceMode::Lines, dates, series.opens()),
        ],
        layout: Layout::new("Closing and Openning Price vs Date", "Date", "value"),
    }
}

/// 20-period exponential moving average of the close.
pub fn get_more(series: &PriceSeries) -> Figure {
    let ema = ewm_mean(&series.closes(), EMA_SPAN);

    Figure {
        data: vec![Trace::scatter(
            "EWA_20",
            TraceMode::LinesMarkers,
            series.dates(),
            ema,
        )],
        layout: Layout::new("Exponential Moving Average vs Date", "Date", "EWA_20"),
    }
}

pub fn get_forecast_fig(forecast: &ForecastResult) -> Figure {
    let (dates, values): (Vec<_>, Vec<_>) = forecast
        .points
        .iter()
        .map(|p| (p.date, p.predicted_close))
        .unzip();

    Figure {
        data: vec![Trace::scatter("data", TraceMode::LinesMarkers, dates, values)],
        layout: Layout::new(
            format!("Predicted Close Price of next {} days", forecast.points.len()),
            "Date",
            "Closed Price",
        ),
    }
}
