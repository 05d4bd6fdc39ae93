pub mod catalog;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod goals;
pub mod ledger;
pub mod models;
pub mod service;

pub use error::{LedgerError, Result};
