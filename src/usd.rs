use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde_with::SerializeDisplay;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign, Mul},
    str::FromStr,
};

/// Represents an amount of money in USD currency.
///
/// The amount is stored as an exact decimal, so that summing many line items
/// never drifts. Arithmetic saturates at the limits of [`Decimal`] instead of
/// panicking; use [`Usd::checked_mul`] to detect a product that does not fit.
/// The [`Display`] implementation prints the value exactly as parsed
/// (`10.00` stays `10.00`); use [`Usd::grouped`] for report output with
/// thousands separators.
#[derive(Clone, Copy, Default, SerializeDisplay, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Usd(Decimal);

impl Usd {
    pub const ZERO: Usd = Usd(Decimal::ZERO);

    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Formats the amount to 2 decimal places with `,` thousands separators,
    /// for example `1,234,567.89`.
    #[must_use]
    pub fn grouped(self) -> String {
        format_num::format_num!(",.2", self.to_f64())
    }

    /// Returns `self * quantity`, or `None` if the result is out of range.
    #[must_use]
    pub fn checked_mul(self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Returns the average of `count` items totalling `self`, or zero if
    /// `count` is zero.
    #[must_use]
    pub fn mean(self, count: usize) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self(self.0 / Decimal::from(count))
    }

    /// Returns `self` as a percentage of `whole`, or `0.0` if `whole` is zero.
    #[must_use]
    pub fn percent_of(self, whole: Usd) -> f64 {
        if whole.0.is_zero() {
            return 0.0;
        }
        self.0
            .checked_div(whole.0)
            .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
            .and_then(|pct| pct.to_f64())
            .unwrap_or_default()
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for Usd {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Decimal::from_str(s.trim().replace(',', "").as_str())?))
    }
}

impl Add for Usd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<i64> for Usd {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0.saturating_mul(Decimal::from(rhs)))
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}
