use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Label prepended to every rendered currency amount.
pub const CURRENCY_LABEL: &str = "Rs";

/// A monetary value in rupees.
///
/// Wraps `rust_decimal::Decimal` so amounts never pick up binary floating
/// point error. Arithmetic keeps full precision; rounding to cents happens
/// only where the domain asks for it (`Money::rounded`, `round_cents`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Builds an amount rounded to the nearest cent, halves away from zero.
    pub fn rounded(amount: Decimal) -> Self {
        Self(amount).round_cents()
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// `#,##0.00` rendering used by the text reports.
    pub fn grouped(&self) -> String {
        let fixed = fixed_2dp(self.0);
        let (sign, unsigned) = match fixed.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", fixed.as_str()),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, digit) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        format!("{sign}{grouped}.{frac_part}")
    }

    /// Grouped amount with the currency label, e.g. `Rs 1,500.00`.
    pub fn currency(&self) -> String {
        format!("{CURRENCY_LABEL} {}", self.grouped())
    }
}

/// Renders a decimal with exactly two fractional digits.
///
/// This is the rendering the checksum is computed over, so it must stay
/// stable: `10000` becomes `10000.00`, `0.005` becomes `0.01`.
pub fn fixed_2dp(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.rescale(2);
    rounded.to_string()
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fixed_2dp(self.0))
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;
    fn mul(self, rate: Decimal) -> Self::Output {
        Self(self.0 * rate)
    }
}

/// Sums amounts, or `None` once the total leaves the `Decimal` range.
pub fn checked_total(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
    amounts
        .into_iter()
        .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
}
