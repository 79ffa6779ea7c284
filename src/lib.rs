//! CryptoScope
//!
//! Dashboard front end for a crypto-detection service: resolves which analysis
//! result to show, plays the pipeline animation and renders the result as
//! terminal tabs or an HTML report.

pub mod assistant;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod presenter;
pub mod reporter;
pub mod resolver;
pub mod storage;
pub mod ui;
pub mod upload;
pub mod view;

pub use errors::{ScopeError, ScopeResult};
pub use presenter::{DashboardState, ResultPresenter};
