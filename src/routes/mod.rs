pub(crate) mod callbacks;
pub(crate) mod charts;
pub(crate) mod companies;
pub(crate) mod dashboard;
pub(crate) mod forecast;
pub(crate) mod health;
pub(crate) mod prices;
