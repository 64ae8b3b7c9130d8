mod callbacks;
mod company;
mod figure;
mod forecast;
mod price_bar;

pub use callbacks::{CallbackOutput, ChartInput, CompanyPanel, ForecastInput, Panel, SubmitInput};
pub use company::CompanyInfo;
pub use figure::{Axis, AxisTitle, Figure, Layout, Trace, TraceMode};
pub use forecast::{ForecastPoint, ForecastRequest, ForecastResult, SvrParams};
pub use price_bar::{DateRange, PriceBar, PriceSeries};
