//! Bracket lookup functionality.
//!
//! This module provides the primitive shared by every progressive table:
//! selecting the bracket that applies to an amount.

use rust_decimal::Decimal;

use crate::models::{Bracket, BracketTable};

/// Returns the bracket that applies to `amount`.
///
/// Brackets are scanned in ascending order and the first one with
/// `amount <= upper_limit` wins. If no bracket matches (the amount is
/// above a bounded last limit), the last bracket is returned.
///
/// # Examples
///
/// ```
/// use folha_engine::calculation::lookup_bracket;
/// use folha_engine::models::{Bracket, BracketTable};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let dec = |s: &str| Decimal::from_str(s).unwrap();
/// let table = BracketTable::new(
///     "inss",
///     vec![
///         Bracket { upper_limit: Some(dec("1518.00")), rate: dec("0.075"), deduction: dec("0") },
///         Bracket { upper_limit: Some(dec("2793.88")), rate: dec("0.09"), deduction: dec("22.77") },
///     ],
///     None,
/// )
/// .unwrap();
///
/// assert_eq!(lookup_bracket(&table, dec("1518.00")).rate, dec("0.075"));
/// assert_eq!(lookup_bracket(&table, dec("1518.01")).rate, dec("0.09"));
/// assert_eq!(lookup_bracket(&table, dec("99999")).rate, dec("0.09"));
/// ```
pub fn lookup_bracket(table: &BracketTable, amount: Decimal) -> &Bracket {
    lookup_bracket_index(table, amount).1
}

/// Like [`lookup_bracket`], also returning the 1-based bracket index.
pub fn lookup_bracket_index(table: &BracketTable, amount: Decimal) -> (usize, &Bracket) {
    table
        .brackets()
        .iter()
        .enumerate()
        .find(|(_, bracket)| bracket.contains(amount))
        .map(|(index, bracket)| (index + 1, bracket))
        .unwrap_or_else(|| (table.brackets().len(), table.last()))
}
