//! Progressive bracket tables.
//!
//! A [`BracketTable`] is the shared shape of the INSS, IRRF and Simples
//! Nacional schedules: an ascending list of upper limits, each with a rate
//! and a fixed amount to subtract ("parcela a deduzir").

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A single row of a progressive table.
///
/// # Example
///
/// ```
/// use folha_engine::models::Bracket;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let bracket = Bracket {
///     upper_limit: Some(Decimal::from_str("2826.65").unwrap()),
///     rate: Decimal::from_str("0.075").unwrap(),
///     deduction: Decimal::from_str("182.16").unwrap(),
/// };
/// assert!(bracket.contains(Decimal::from_str("2500.00").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    /// Inclusive upper limit of the bracket; `None` means unbounded.
    #[serde(default)]
    pub upper_limit: Option<Decimal>,
    /// Nominal rate as a fraction (0.075 = 7.5%).
    pub rate: Decimal,
    /// Amount subtracted from `base × rate`.
    #[serde(default)]
    pub deduction: Decimal,
}

impl Bracket {
    /// Returns true if `amount <= upper_limit` (always true when unbounded).
    pub fn contains(&self, amount: Decimal) -> bool {
        match self.upper_limit {
            Some(limit) => amount <= limit,
            None => true,
        }
    }
}

#[derive(Deserialize)]
struct BracketTableSpec {
    name: String,
    #[serde(default)]
    base_ceiling: Option<Decimal>,
    brackets: Vec<Bracket>,
}

/// A validated, ascending progressive table.
///
/// Construction rejects empty tables, non-increasing limits, an unbounded
/// bracket anywhere but last, and negative rates, deductions or ceilings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BracketTableSpec")]
pub struct BracketTable {
    name: String,
    base_ceiling: Option<Decimal>,
    brackets: Vec<Bracket>,
}

impl BracketTable {
    /// Builds a table, validating its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the table is empty or
    /// malformed.
    ///
    /// # Example
    ///
    /// ```
    /// use folha_engine::models::{Bracket, BracketTable};
    /// use rust_decimal::Decimal;
    ///
    /// let table = BracketTable::new(
    ///     "flat",
    ///     vec![Bracket { upper_limit: None, rate: Decimal::new(10, 2), deduction: Decimal::ZERO }],
    ///     None,
    /// );
    /// assert!(table.is_ok());
    ///
    /// let empty = BracketTable::new("empty", vec![], None);
    /// assert!(empty.is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        brackets: Vec<Bracket>,
        base_ceiling: Option<Decimal>,
    ) -> EngineResult<Self> {
        let name = name.into();

        if brackets.is_empty() {
            return Err(EngineError::configuration(&name, "table has no brackets"));
        }

        if let Some(ceiling) = base_ceiling {
            if ceiling < Decimal::ZERO {
                return Err(EngineError::configuration(
                    &name,
                    format!("base ceiling {} is negative", ceiling),
                ));
            }
        }

        let last = brackets.len() - 1;
        let mut previous: Option<Decimal> = None;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO {
                return Err(EngineError::configuration(
                    &name,
                    format!("bracket {} has negative rate {}", index + 1, bracket.rate),
                ));
            }
            if bracket.deduction < Decimal::ZERO {
                return Err(EngineError::configuration(
                    &name,
                    format!(
                        "bracket {} has negative deduction {}",
                        index + 1,
                        bracket.deduction
                    ),
                ));
            }
            match bracket.upper_limit {
                None if index != last => {
                    return Err(EngineError::configuration(
                        &name,
                        format!("bracket {} is unbounded but is not the last one", index + 1),
                    ));
                }
                None => {}
                Some(limit) => {
                    if let Some(prev) = previous {
                        if limit <= prev {
                            return Err(EngineError::configuration(
                                &name,
                                format!(
                                    "bracket {} limit {} does not exceed previous limit {}",
                                    index + 1,
                                    limit,
                                    prev
                                ),
                            ));
                        }
                    }
                    previous = Some(limit);
                }
            }
        }

        Ok(Self {
            name,
            base_ceiling,
            brackets,
        })
    }

    /// The table's identifier (e.g. "inss").
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional cap applied to the base before lookup (INSS "teto").
    pub fn base_ceiling(&self) -> Option<Decimal> {
        self.base_ceiling
    }

    /// The brackets in ascending order.
    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }

    /// Returns the highest bracket.
    pub fn last(&self) -> &Bracket {
        // Non-empty by construction.
        &self.brackets[self.brackets.len() - 1]
    }
}

impl TryFrom<BracketTableSpec> for BracketTable {
    type Error = EngineError;

    fn try_from(spec: BracketTableSpec) -> Result<Self, Self::Error> {
        BracketTable::new(spec.name, spec.brackets, spec.base_ceiling)
    }
}
