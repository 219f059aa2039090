//! # Payables Engine
//!
//! Turns a ledger export of payable invoice line items into the subset that
//! is eligible for payment, plus a per-supplier summary of that subset.
//! A second dataset of supplier closing balances is used to hold back
//! suppliers who still carry an outstanding balance.
//!
//! ## Design Principles
//!
//! - **Declarative rules**: every eligibility check is an entry in one ordered
//!   rule table, toggled by configuration
//! - **Total normalization**: blank or placeholder cells degrade to defaults
//!   instead of failing the run
//! - **Stable filtering**: surviving rows keep their input order, so `first`
//!   aggregation is deterministic
//! - **All or nothing**: schema problems are detected before any output exists
//!
//! ## Example
//!
//! ```
//! use payables_engine::{process, EngineConfig, Table};
//!
//! let invoices = Table::from_rows(
//!     &["Supplier", "Net Due Date", "Due/Not", "Name", "WHT availability",
//!       "Diageo/Tolaram", "Document Currency Value", "Payable after WHT"],
//!     &[["S1", "2024-01-01", "Due", "Acme", "Yes", "Tolaram", "100", "95"]],
//! );
//! let mut config = EngineConfig::default();
//! config.filters = payables_engine::FilterConfig::disabled();
//!
//! let output = process(&invoices, &Table::default(), &config).unwrap();
//! assert_eq!(output.filtered.len(), 1);
//! assert_eq!(output.summary.len(), 1);
//! ```

pub mod aggregate;
pub mod amount;
pub mod balance;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod record;
pub mod table;

pub use aggregate::{aggregate, Reducer};
pub use amount::Amount;
pub use balance::BalanceResolver;
pub use config::{
    AggregationSpec, ColumnNames, EngineConfig, FilterConfig, GroupingConfig, InputConfig,
    OutputConfig,
};
pub use engine::{process, read_table, write_table, PayablesEngine, ProcessOutput};
pub use error::{EngineError, Result};
pub use filter::{FilterPipeline, Rule};
pub use record::{InvoiceRecord, RecordNormalizer, SupplierBalanceRecord};
pub use table::{Cell, Table};
