//! Typed invoice and balance records, and the normalizer that builds them.
//!
//! Normalization is total: any cell can be turned into a record. Text used
//! by the filter rules is trimmed, numeric columns are coerced with
//! [`Amount::coerce`] and due dates are parsed where their format allows.

use crate::amount::Amount;
use crate::config::ColumnNames;
use crate::error::Result;
use crate::table::{Cell, Table};
use chrono::{Days, NaiveDate, NaiveDateTime};
use log::debug;

/// One payable line item, normalized.
///
/// The typed fields are the ones the filter rules read; `cells` holds the
/// full normalized row in the invoice table's column order and is what ends
/// up in the filtered output.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub gl_long_text: String,
    pub payment_method: String,
    pub currency: String,
    pub payment_block_code: Option<String>,
    pub vendor_category_text: Option<String>,

    /// Join key into the balance dataset. Not unique across line items.
    pub supplier_id: Option<String>,
    pub bank_account: Option<String>,
    pub due_status: String,

    /// Whether the net due date cell is non-blank, parseable or not.
    pub has_net_due_date: bool,
    /// The net due date, when it is in a recognised format.
    pub net_due_date: Option<NaiveDate>,

    pub cells: Vec<Cell>,
}

/// One ledger balance line.
///
/// Several lines may share a supplier; they are summed, never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierBalanceRecord {
    pub supplier_id: Option<String>,
    pub closing_balance_debit: Amount,
    pub closing_balance_credit: Amount,
}

impl SupplierBalanceRecord {
    pub fn new(supplier_id: &str, debit: Amount, credit: Amount) -> Self {
        let trimmed = supplier_id.trim();
        SupplierBalanceRecord {
            supplier_id: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            closing_balance_debit: debit,
            closing_balance_credit: credit,
        }
    }
}

/// Positions of the filter fields in an invoice table.
#[derive(Debug, Default)]
struct InvoiceColumns {
    gl_long_text: Option<usize>,
    payment_method: Option<usize>,
    currency: Option<usize>,
    payment_block: Option<usize>,
    vendor_category: Option<usize>,
    supplier: Option<usize>,
    bank_account: Option<usize>,
    due_status: Option<usize>,
    net_due_date: Option<usize>,
}

impl InvoiceColumns {
    fn locate(table: &Table, names: &ColumnNames) -> Self {
        InvoiceColumns {
            gl_long_text: table.find_column(&names.gl_long_text),
            payment_method: table.find_column(&names.payment_method),
            currency: table.find_column(&names.currency),
            payment_block: table.find_column(&names.payment_block),
            vendor_category: table.find_column(&names.vendor_category),
            supplier: table.find_column(&names.supplier),
            bank_account: table.find_column(&names.bank_account),
            due_status: table.find_column(&names.due_status),
            net_due_date: table.find_column(&names.net_due_date),
        }
    }

    fn text_positions(&self) -> Vec<usize> {
        [
            self.gl_long_text,
            self.payment_method,
            self.currency,
            self.payment_block,
            self.vendor_category,
            self.supplier,
            self.bank_account,
            self.due_status,
            self.net_due_date,
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Converts raw tables into typed records.
///
/// Columns a record type needs but the table lacks produce empty values;
/// whether that is acceptable is decided by the caller before normalizing.
pub struct RecordNormalizer<'a> {
    names: &'a ColumnNames,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(names: &'a ColumnNames) -> Self {
        RecordNormalizer { names }
    }

    /// Normalizes every invoice row.
    ///
    /// `numeric_columns` are coerced to numbers (the summed aggregation
    /// columns); names missing from the table are ignored.
    pub fn invoices(&self, table: &Table, numeric_columns: &[&str]) -> Vec<InvoiceRecord> {
        let columns = InvoiceColumns::locate(table, self.names);
        let text_positions = columns.text_positions();
        let numeric_positions: Vec<usize> = numeric_columns
            .iter()
            .filter_map(|name| table.find_column(name))
            .collect();

        table
            .rows()
            .iter()
            .map(|row| {
                let mut cells = row.clone();
                for &i in &text_positions {
                    cells[i] = trim_cell(&cells[i]);
                }
                for &i in &numeric_positions {
                    cells[i] = Cell::Number(cells[i].to_amount());
                }
                build_invoice(&columns, cells)
            })
            .collect()
    }

    /// Normalizes every balance row.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::MissingColumn`] if the supplier, debit or credit
    /// column is absent.
    pub fn balances(&self, table: &Table) -> Result<Vec<SupplierBalanceRecord>> {
        let supplier = table.require_column("balance", &self.names.balance_supplier)?;
        let debit = table.require_column("balance", &self.names.closing_debit)?;
        let credit = table.require_column("balance", &self.names.closing_credit)?;

        Ok(table
            .rows()
            .iter()
            .map(|row| SupplierBalanceRecord {
                supplier_id: trim_cell(&row[supplier]).as_text(),
                closing_balance_debit: row[debit].to_amount(),
                closing_balance_credit: row[credit].to_amount(),
            })
            .collect())
    }
}

fn build_invoice(columns: &InvoiceColumns, cells: Vec<Cell>) -> InvoiceRecord {
    let text = |pos: Option<usize>| pos.and_then(|i| cells[i].as_text());
    let due_date = text(columns.net_due_date);

    InvoiceRecord {
        gl_long_text: text(columns.gl_long_text).unwrap_or_default(),
        payment_method: text(columns.payment_method).unwrap_or_default(),
        currency: text(columns.currency).unwrap_or_default(),
        payment_block_code: text(columns.payment_block),
        vendor_category_text: text(columns.vendor_category),
        supplier_id: text(columns.supplier),
        bank_account: text(columns.bank_account),
        due_status: text(columns.due_status).unwrap_or_default(),
        has_net_due_date: due_date.is_some(),
        net_due_date: due_date.as_deref().and_then(parse_due_date),
        cells,
    }
}

/// Trims text; blank text becomes [`Cell::Empty`] and numbers become text.
fn trim_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Empty => Cell::Empty,
        Cell::Text(s) => Cell::from_raw(s.trim()),
        Cell::Number(n) => Cell::Text(n.to_string()),
    }
}

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%d %B %Y",
];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Largest serial day number spreadsheet software accepts (9999-12-31).
const MAX_SERIAL_DAY: u64 = 2_958_465;

/// Parses a due date from the textual or serial-number forms ledger exports use.
///
/// Returns `None` for text in no recognised form; such a cell still counts as
/// a present due date for filtering.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| parse_serial_day(raw));

    if parsed.is_none() {
        debug!("Due date {:?} is not in a recognised format", raw);
    }
    parsed
}

fn parse_serial_day(raw: &str) -> Option<NaiveDate> {
    let whole = raw.split_once('.').map_or(raw, |(int, _)| int);
    let days: u64 = whole.parse().ok()?;
    if days == 0 || days > MAX_SERIAL_DAY {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days))
}
