//! Supplier balance resolution.
//!
//! Works on the full balance dataset, independent of any invoice filtering,
//! so the exclusion set reflects the real ledger state.

use crate::amount::Amount;
use crate::error::{EngineError, Result};
use crate::record::SupplierBalanceRecord;
use log::{debug, info};
use std::collections::{HashMap, HashSet};

/// Computes which suppliers carry an outstanding balance.
pub struct BalanceResolver;

impl BalanceResolver {
    /// Returns the suppliers whose net closing balance is strictly positive.
    ///
    /// Records without a supplier are ignored. All records of one supplier
    /// are summed: `net = sum(debit) + sum(credit)`. Zero and negative nets
    /// are not outstanding.
    ///
    /// # Errors
    ///
    /// [`EngineError::AmountOverflow`] if a supplier's net leaves the decimal range.
    pub fn resolve(records: &[SupplierBalanceRecord]) -> Result<HashSet<String>> {
        let mut nets: HashMap<&str, Amount> = HashMap::new();
        let mut anonymous = 0usize;

        for record in records {
            match record.supplier_id.as_deref().map(str::trim) {
                Some(supplier) if !supplier.is_empty() => {
                    let net = nets.entry(supplier).or_default();
                    *net = net
                        .checked_add(record.closing_balance_debit)
                        .and_then(|n| n.checked_add(record.closing_balance_credit))
                        .ok_or_else(|| {
                            EngineError::AmountOverflow(format!(
                                "closing balance of supplier {}",
                                supplier
                            ))
                        })?;
                }
                _ => anonymous += 1,
            }
        }

        if anonymous > 0 {
            debug!("Ignored {} balance line(s) without a supplier", anonymous);
        }

        let outstanding: HashSet<String> = nets
            .into_iter()
            .filter(|(_, net)| net.is_positive())
            .map(|(supplier, _)| supplier.to_string())
            .collect();

        info!(
            "{} supplier(s) carry an outstanding balance",
            outstanding.len()
        );

        Ok(outstanding)
    }
}
