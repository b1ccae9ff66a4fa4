mod repository;

pub use repository::{JsonSeriesStore, JsonStyle};
