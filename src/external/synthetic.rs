use crate::external::market_data::{MarketDataError, MarketDataProvider};
use crate::models::{CompanyInfo, DateRange, PriceBar};
use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Offline provider producing a deterministic random walk per ticker.
///
/// The walk always starts at `epoch`, so a given (ticker, date) pair maps to
/// the same bar whatever range is requested. Weekends are skipped.
pub struct SyntheticProvider {
    epoch: NaiveDate,
    full_history_days: i64,
}

impl SyntheticProvider {
    pub fn new(epoch: NaiveDate) -> Self {
        Self {
            epoch,
            full_history_days: 5 * 365,
        }
    }

    fn seed_for(ticker: &str) -> u64 {
        // FNV-1a
        ticker.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
            (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
    }

    fn generate(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let mut rng = StdRng::seed_from_u64(Self::seed_for(ticker));
        let mut close = 20.0 + rng.random::<f64>() * 180.0;

        let mut out = Vec::new();
        let mut date = self.epoch;
        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let open = close * (1.0 + (rng.random::<f64>() - 0.5) * 0.01);
                close = (close * (1.0 + (rng.random::<f64>() - 0.5) * 0.02)).max(0.01);
                let high = open.max(close) * (1.0 + rng.random::<f64>() * 0.005);
                let low = open.min(close) * (1.0 - rng.random::<f64>() * 0.005);
                let volume = rng.random_range(100_000..5_000_000);

                if date >= start {
                    out.push(PriceBar { date, open, high, low, close, volume });
                }
            }
            date += Duration::days(1);
        }
        out
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticProvider {
    async fn fetch_history(
        &self,
        ticker: &str,
        range: Option<DateRange>,
    ) -> Result<Vec<PriceBar>, MarketDataError> {
        let today = Utc::now().date_naive();
        let (start, end) = match range {
            Some(range) => (range.start, range.end_or(today).min(today)),
            None => (today - Duration::days(self.full_history_days), today),
        };
        Ok(self.generate(ticker, start.max(self.epoch), end))
    }

    async fn fetch_company_info(&self, ticker: &str) -> Result<CompanyInfo, MarketDataError> {
        Ok(CompanyInfo {
            ticker: ticker.to_string(),
            name: format!("{} Synthetic Corp.", ticker),
            logo_url: String::new(),
            summary: format!(
                "{} is a simulated company. Its prices are a seeded random walk for offline use.",
                ticker
            ),
            website: None,
            sector: None,
            industry: None,
        })
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SyntheticProvider {
        SyntheticProvider::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
    }

    #[test]
    fn test_same_ticker_same_bars() {
        let p = provider();
        let start = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2020, 3, 31).unwrap();
        assert_eq!(p.generate("MSFT", start, end), p.generate("MSFT", start, end));
        assert_ne!(p.generate("MSFT", start, end), p.generate("AAPL", start, end));
    }

    #[test]
    fn test_bars_do_not_depend_on_requested_window() {
        let p = provider();
        let wide = p.generate(
            "GOOG",
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 6, 30).unwrap(),
        );
        let narrow = p.generate(
            "GOOG",
            NaiveDate::from_ymd_opt(2020, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 6, 30).unwrap(),
        );
        let tail: Vec<_> = wide.into_iter().filter(|b| b.date >= narrow[0].date).collect();
        assert_eq!(tail, narrow);
    }

    #[test]
    fn test_weekends_skipped_and_ohlc_consistent() {
        let p = provider();
        let bars = p.generate(
            "IBM",
            NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
        );
        assert_eq!(bars.len(), 20);
        for bar in &bars {
            assert!(!matches!(bar.date.weekday(), Weekday::Sat | Weekday::Sun));
            assert!(bar.high >= bar.open.max(bar.close));
            assert!(bar.low <= bar.open.min(bar.close));
        }
    }
}
