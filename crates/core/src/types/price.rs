//! Type-safe price representation using decimal arithmetic.
//!
//! All catalog and cart arithmetic is done on [`Decimal`] so that totals such
//! as `800 × 3` never drift the way binary floats do. [`Price`] pairs an
//! amount with a currency for display.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paisa).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store currency (PKR).
    #[must_use]
    pub const fn pkr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::PKR)
    }

    /// Format for display, rounded to whole units with thousands separators.
    ///
    /// ```
    /// use azlan_core::Price;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Price::pkr(Decimal::new(125_050, 2)).display(), "Rs. 1,251");
    /// ```
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let digits = rounded.abs().trunc().to_string();
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        format!(
            "{}{sign}{}",
            self.currency_code.symbol(),
            group_thousands(&digits)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Percentage saved when paying `current` instead of `original`.
///
/// Returns 0 when there is no original price or it is not higher than the
/// current one.
#[must_use]
pub fn discount_percentage(current: Decimal, original: Option<Decimal>) -> u32 {
    let Some(original) = original else {
        return 0;
    };
    if original <= current || original.is_zero() {
        return 0;
    }
    ((original - current) * Decimal::ONE_HUNDRED / original)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    PKR,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Display prefix used in front of amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::PKR => "Rs. ",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }
}
