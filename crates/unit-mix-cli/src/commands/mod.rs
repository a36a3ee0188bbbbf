pub mod mix;
pub mod scenarios;
