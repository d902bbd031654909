use crate::error::{DispatchError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// A monetary value.
///
/// Wraps `rust_decimal::Decimal` so fares, wallet balances and earnings are
/// never subject to binary floating-point drift. Money may be negative: a
/// prepaid wallet can be overdrawn by a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Rounds to whole cents, midpoint away from zero.
    pub fn round_to_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
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

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;
    fn mul(self, rhs: Decimal) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

/// A percentage in the closed range 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub fn new(value: Decimal) -> Result<Self> {
        if (Decimal::ZERO..=Decimal::ONE_HUNDRED).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DispatchError::validation(format!(
                "percentage must be between 0 and 100, got {value}"
            )))
        }
    }

    /// For compile-time constants already known to be in range.
    pub(crate) const fn from_trusted(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The percentage as a fraction of one.
    pub fn fraction(&self) -> Decimal {
        self.0 / Decimal::ONE_HUNDRED
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = DispatchError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(pct: Percentage) -> Self {
        pct.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

/// Trip length in kilometres. Supplied by the caller, never derived.
///
/// At most [`Distance::MAX_KM`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Distance(Decimal);

impl Distance {
    pub const MAX_KM: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

    /// Accepts `0..=MAX_KM` kilometres.
    pub fn from_km(km: Decimal) -> Result<Self> {
        if km < Decimal::ZERO {
            return Err(DispatchError::validation(format!(
                "distance must not be negative, got {km}"
            )));
        }
        if km > Self::MAX_KM {
            return Err(DispatchError::validation(format!(
                "distance must not exceed {} km, got {km}",
                Self::MAX_KM
            )));
        }
        Ok(Self(km))
    }

    pub fn km(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Distance {
    type Error = DispatchError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::from_km(value)
    }
}

impl From<Distance> for Decimal {
    fn from(distance: Distance) -> Self {
        distance.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} km", self.0.normalize())
    }
}
