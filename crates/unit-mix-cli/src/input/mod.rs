pub mod file;
pub mod market_csv;
pub mod stdin;
