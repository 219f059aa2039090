//! Engine configuration.
//!
//! The engine itself only consumes an already-parsed [`EngineConfig`]. The
//! TOML helpers here exist for callers (the CLI) that keep settings in a file.
//! Every field has a default matching the standard payables run, so a config
//! file only needs to mention what it changes.

use crate::aggregate::Reducer;
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub filters: FilterConfig,
    pub grouping: GroupingConfig,
    pub columns: ColumnNames,
    pub input: InputConfig,
    pub output: OutputConfig,
}

impl EngineConfig {
    /// Parses and validates configuration from TOML text.
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Checks everything that can be checked before any data is seen.
    pub fn validate(&self) -> Result<()> {
        self.grouping.validate()
    }
}

/// Toggleable eligibility rules and their parameters.
///
/// Rules are applied in a fixed order by [`crate::filter::FilterPipeline`].
/// The due-date validation has no toggle: it always runs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// GL long texts whose line items are dropped. Empty disables the rule.
    pub exclude_gl_texts: Vec<String>,

    /// Required payment method. `None` or `""` disables the rule.
    pub payment_method: Option<String>,

    /// Required currency. `None` or `""` disables the rule.
    pub currency: Option<String>,

    pub exclude_suppliers_with_balance: bool,
    pub exclude_payment_block: bool,
    pub exclude_ntc_vendor: bool,
    pub exclude_blank_suppliers: bool,
    pub exclude_blank_bank_accounts: bool,
}

impl FilterConfig {
    /// A configuration where only the always-on due validation remains.
    pub fn disabled() -> Self {
        FilterConfig {
            exclude_gl_texts: Vec::new(),
            payment_method: None,
            currency: None,
            exclude_suppliers_with_balance: false,
            exclude_payment_block: false,
            exclude_ntc_vendor: false,
            exclude_blank_suppliers: false,
            exclude_blank_bank_accounts: false,
        }
    }

    /// The payment method rows must carry, if that rule is active.
    pub fn required_payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref().filter(|s| !s.is_empty())
    }

    /// The currency rows must carry, if that rule is active.
    pub fn required_currency(&self) -> Option<&str> {
        self.currency.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            exclude_gl_texts: [
                "Intercompany payable",
                "IOU manager",
                "IOU staff",
                "Short Term loan",
                "Trade creditors-Foreign",
                "Vendors bills of exchange",
                "Transport Creditors",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            payment_method: Some("T".to_string()),
            currency: Some("NGN".to_string()),
            exclude_suppliers_with_balance: true,
            exclude_payment_block: true,
            exclude_ntc_vendor: true,
            exclude_blank_suppliers: true,
            exclude_blank_bank_accounts: true,
        }
    }
}

/// How filtered rows are grouped and reduced into the supplier summary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Grouping key columns.
    pub by: Vec<String>,

    /// Output columns in order, each reducing one input column.
    pub aggregations: Vec<AggregationSpec>,
}

impl GroupingConfig {
    /// Resolves every aggregation function, in configured order.
    pub fn reducers(&self) -> Result<Vec<Reducer>> {
        self.aggregations
            .iter()
            .map(|spec| spec.function.parse::<Reducer>())
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.by.is_empty() {
            return Err(EngineError::InvalidConfig(
                "grouping key list is empty".into(),
            ));
        }
        if let Some(blank) = self.by.iter().find(|c| c.trim().is_empty()) {
            return Err(EngineError::InvalidConfig(format!(
                "grouping key contains a blank column name {:?}",
                blank
            )));
        }
        if self.aggregations.is_empty() {
            return Err(EngineError::InvalidConfig(
                "aggregation column list is empty".into(),
            ));
        }

        self.reducers()?;

        let mut outputs: HashSet<&str> = self.by.iter().map(String::as_str).collect();
        for spec in &self.aggregations {
            if self.by.contains(&spec.column) {
                return Err(EngineError::InvalidConfig(format!(
                    "column '{}' is both a grouping key and an aggregation column",
                    spec.column
                )));
            }
            if !outputs.insert(spec.output_name()) {
                return Err(EngineError::InvalidConfig(format!(
                    "duplicate summary column '{}'",
                    spec.output_name()
                )));
            }
        }

        Ok(())
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            by: vec!["Supplier".to_string()],
            aggregations: vec![
                AggregationSpec::new("Name", Reducer::First),
                AggregationSpec::new("WHT availability", Reducer::First),
                AggregationSpec::new("Diageo/Tolaram", Reducer::First),
                AggregationSpec::new("Document Currency Value", Reducer::Sum)
                    .with_output("Sum of Document Currency Value"),
                AggregationSpec::new("Payable after WHT", Reducer::Sum)
                    .with_output("Sum of Payable after WHT"),
            ],
        }
    }
}

/// One summary column.
///
/// `function` stays textual here so that an unsupported name is reported
/// as [`EngineError::InvalidConfig`] during validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AggregationSpec {
    /// Input column to reduce.
    pub column: String,

    /// Reducer name: `first` or `sum`.
    pub function: String,

    /// Summary column name; defaults to `column`.
    #[serde(default)]
    pub output: Option<String>,
}

impl AggregationSpec {
    pub fn new(column: impl Into<String>, reducer: Reducer) -> Self {
        AggregationSpec {
            column: column.into(),
            function: reducer.name().to_string(),
            output: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn output_name(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.column)
    }
}

/// Header names of the columns the rules read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub gl_long_text: String,
    pub payment_method: String,
    pub currency: String,
    pub payment_block: String,
    pub vendor_category: String,
    pub supplier: String,
    pub bank_account: String,
    pub due_status: String,
    pub net_due_date: String,

    /// Supplier column of the balance dataset.
    pub balance_supplier: String,
    pub closing_debit: String,
    pub closing_credit: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            gl_long_text: "G/L Account: Long Text".to_string(),
            payment_method: "Payment Method".to_string(),
            currency: "Currency".to_string(),
            payment_block: "Payment block".to_string(),
            vendor_category: "Diageo".to_string(),
            supplier: "Supplier".to_string(),
            bank_account: "Bank account".to_string(),
            due_status: "Due/Not".to_string(),
            net_due_date: "Net Due Date".to_string(),
            balance_supplier: "Supplier".to_string(),
            closing_debit: "Clsng Blns Debit".to_string(),
            closing_credit: "Clsng Blns Credit".to_string(),
        }
    }
}

/// Where the header row sits in each input file (zero-based line index).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub invoice_header_row: usize,
    pub balance_header_row: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        // Invoice exports carry a title line above the header.
        InputConfig {
            invoice_header_row: 1,
            balance_header_row: 0,
        }
    }
}

/// Output file placement and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_folder: PathBuf,

    /// File name prefix; defaults to today's date as `YYYYMMDD`.
    pub file_prefix: Option<String>,

    /// Render numbers as `1,234.00` / `(1,234.00)` / `-`.
    pub accounting_format: bool,
}

impl OutputConfig {
    pub fn prefix(&self) -> String {
        match self.file_prefix.as_deref() {
            Some(prefix) if !prefix.trim().is_empty() => prefix.trim().to_string(),
            _ => chrono::Local::now().format("%Y%m%d").to_string(),
        }
    }

    /// Paths of the filtered and summary files, sharing one prefix.
    pub fn output_paths(&self) -> (PathBuf, PathBuf) {
        let prefix = self.prefix();
        (
            self.output_folder.join(format!("{}_filtered.csv", prefix)),
            self.output_folder.join(format!("{}_summary.csv", prefix)),
        )
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            output_folder: PathBuf::from("processed_results"),
            file_prefix: None,
            accounting_format: true,
        }
    }
}
