use std::collections::BTreeMap;

use crate::domain::cash::{Cash, Currency};

/// Uninvested cash held in an account, by currency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountBalance {
    pub cash: BTreeMap<Currency, Cash>,
}
