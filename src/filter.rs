//! Eligibility rules for payable line items.
//!
//! Each rule is an entry in a fixed, ordered table ([`Rule::ORDER`]). The
//! pipeline keeps the rules the configuration enables and retains a record
//! only if every one of them passes. Filtering is stable: survivors keep
//! their relative input order, which the `first` reducer depends on.

use crate::config::{ColumnNames, FilterConfig};
use crate::error::Result;
use crate::record::InvoiceRecord;
use crate::table::Table;
use log::info;
use std::collections::HashSet;

/// Payment block codes that stop a line item from being paid.
pub const PAYMENT_BLOCK_CODES: [&str; 4] = ["A", "B", "R", "V"];

/// Vendor category marker, lowercase. Matched as a substring of the
/// lowercased category text.
pub const NTC_VENDOR_MARKER: &str = "ntc- vendor";

/// Literal placeholders left behind when empty bank accounts were stringified upstream.
pub const BLANK_BANK_ACCOUNT_ARTIFACTS: [&str; 2] = ["nan", "None"];

/// A single predicate over an invoice record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// GL long text must not be on the exclude list.
    GlTextExclusion,
    /// Payment method must equal the configured one.
    PaymentMethod,
    /// Currency must equal the configured one.
    Currency,
    /// Payment block code must not be a blocking code.
    PaymentBlock,
    /// Vendor category must not carry the NTC vendor marker.
    VendorCategory,
    /// Supplier must be present.
    BlankSupplier,
    /// Bank account must be present and not a placeholder.
    BlankBankAccount,
    /// Net due date present and status "due". Always enabled.
    DueValidation,
    /// Supplier must not carry an outstanding ledger balance.
    SupplierBalance,
}

impl Rule {
    /// Evaluation order.
    pub const ORDER: [Rule; 9] = [
        Rule::GlTextExclusion,
        Rule::PaymentMethod,
        Rule::Currency,
        Rule::PaymentBlock,
        Rule::VendorCategory,
        Rule::BlankSupplier,
        Rule::BlankBankAccount,
        Rule::DueValidation,
        Rule::SupplierBalance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::GlTextExclusion => "GL text exclusion",
            Rule::PaymentMethod => "payment method",
            Rule::Currency => "currency",
            Rule::PaymentBlock => "payment block exclusion",
            Rule::VendorCategory => "NTC vendor exclusion",
            Rule::BlankSupplier => "blank supplier exclusion",
            Rule::BlankBankAccount => "blank bank account exclusion",
            Rule::DueValidation => "due validation",
            Rule::SupplierBalance => "supplier balance exclusion",
        }
    }

    pub fn is_enabled(&self, filters: &FilterConfig) -> bool {
        match self {
            Rule::GlTextExclusion => filters
                .exclude_gl_texts
                .iter()
                .any(|text| !text.trim().is_empty()),
            Rule::PaymentMethod => filters.required_payment_method().is_some(),
            Rule::Currency => filters.required_currency().is_some(),
            Rule::PaymentBlock => filters.exclude_payment_block,
            Rule::VendorCategory => filters.exclude_ntc_vendor,
            Rule::BlankSupplier => filters.exclude_blank_suppliers,
            Rule::BlankBankAccount => filters.exclude_blank_bank_accounts,
            Rule::DueValidation => true,
            Rule::SupplierBalance => filters.exclude_suppliers_with_balance,
        }
    }

    /// Invoice columns the rule reads.
    pub fn required_columns<'c>(&self, names: &'c ColumnNames) -> Vec<&'c str> {
        match self {
            Rule::GlTextExclusion => vec![names.gl_long_text.as_str()],
            Rule::PaymentMethod => vec![names.payment_method.as_str()],
            Rule::Currency => vec![names.currency.as_str()],
            Rule::PaymentBlock => vec![names.payment_block.as_str()],
            Rule::VendorCategory => vec![names.vendor_category.as_str()],
            Rule::BlankSupplier | Rule::SupplierBalance => vec![names.supplier.as_str()],
            Rule::BlankBankAccount => vec![names.bank_account.as_str()],
            Rule::DueValidation => vec![names.net_due_date.as_str(), names.due_status.as_str()],
        }
    }

    /// Evaluates the rule for one record. Independent of every other rule.
    pub fn passes(
        &self,
        record: &InvoiceRecord,
        filters: &FilterConfig,
        exclusions: &HashSet<String>,
    ) -> bool {
        match self {
            Rule::GlTextExclusion => !filters.exclude_gl_texts.iter().any(|text| {
                let text = text.trim();
                !text.is_empty() && text == record.gl_long_text
            }),
            Rule::PaymentMethod => filters
                .required_payment_method()
                .map_or(true, |method| record.payment_method == method),
            Rule::Currency => filters
                .required_currency()
                .map_or(true, |currency| record.currency == currency),
            Rule::PaymentBlock => !record
                .payment_block_code
                .as_deref()
                .map_or(false, |code| PAYMENT_BLOCK_CODES.contains(&code.trim())),
            Rule::VendorCategory => !record
                .vendor_category_text
                .as_deref()
                .map_or(false, |text| text.to_lowercase().contains(NTC_VENDOR_MARKER)),
            Rule::BlankSupplier => record
                .supplier_id
                .as_deref()
                .map_or(false, |supplier| !supplier.trim().is_empty()),
            Rule::BlankBankAccount => record.bank_account.as_deref().map_or(false, |account| {
                let account = account.trim();
                !account.is_empty() && !BLANK_BANK_ACCOUNT_ARTIFACTS.contains(&account)
            }),
            Rule::DueValidation => {
                record.has_net_due_date && record.due_status.trim().to_lowercase() == "due"
            }
            Rule::SupplierBalance => record
                .supplier_id
                .as_deref()
                .map_or(true, |supplier| !exclusions.contains(supplier.trim())),
        }
    }
}

/// The enabled rules of a [`FilterConfig`], in evaluation order.
pub struct FilterPipeline<'a> {
    filters: &'a FilterConfig,
    rules: Vec<Rule>,
}

impl<'a> FilterPipeline<'a> {
    pub fn new(filters: &'a FilterConfig) -> Self {
        let rules = Rule::ORDER
            .iter()
            .copied()
            .filter(|rule| rule.is_enabled(filters))
            .collect();
        FilterPipeline { filters, rules }
    }

    /// Enabled rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Whether the balance dataset needs to be resolved at all.
    pub fn uses_balances(&self) -> bool {
        self.rules.contains(&Rule::SupplierBalance)
    }

    /// Fails if a column an enabled rule reads is missing from `table`.
    pub fn check_schema(&self, table: &Table, names: &ColumnNames) -> Result<()> {
        for rule in &self.rules {
            for column in rule.required_columns(names) {
                table.require_column("invoice", column)?;
            }
        }
        Ok(())
    }

    /// Returns `true` if every enabled rule passes for `record`.
    pub fn accepts(&self, record: &InvoiceRecord, exclusions: &HashSet<String>) -> bool {
        self.rules
            .iter()
            .all(|rule| rule.passes(record, self.filters, exclusions))
    }

    /// Keeps the records every enabled rule accepts, preserving order.
    ///
    /// `exclusions` is the supplier set from
    /// [`crate::balance::BalanceResolver`]; it is only consulted when the
    /// balance rule is enabled.
    pub fn apply(
        &self,
        mut records: Vec<InvoiceRecord>,
        exclusions: &HashSet<String>,
    ) -> Vec<InvoiceRecord> {
        for rule in &self.rules {
            let before = records.len();
            records.retain(|record| rule.passes(record, self.filters, exclusions));
            info!(
                "Rule '{}' removed {} of {} row(s)",
                rule.name(),
                before - records.len(),
                before
            );
        }
        records
    }
}
