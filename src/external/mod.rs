pub mod market_data;
pub mod synthetic;
pub mod yahoo;
