pub mod fields;
pub mod portfolio_csv;
pub mod snapshot_json;
