use std::{
    cmp::Ordering,
    fmt::{Debug, Display},
    iter::Sum,
    ops::{AddAssign, Mul},
    str::FromStr,
};

/// Represents a sales amount (a quantity, a price, or their product).
///
/// The [`Display`] implementation formats it to 2 decimal places and honours
/// width and alignment flags, so amounts line up in console tables.
#[derive(Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Amount(f64);

impl Amount {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Orders amounts from largest to smallest. Zero and negative zero
    /// compare equal.
    #[must_use]
    pub fn cmp_descending(&self, other: &Self) -> Ordering {
        other.0.partial_cmp(&self.0).unwrap_or(Ordering::Equal)
    }
}

impl Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&format!("{:.2}", self.0))
    }
}

impl FromStr for Amount {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul for Amount {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, a| {
            acc += a;
            acc
        })
    }
}
