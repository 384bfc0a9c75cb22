pub mod app;
pub mod scenarios;
