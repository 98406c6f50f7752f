use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};

/// A monetary amount in integer cents. All pricing and ledger math runs on
/// this type so repeated computation never accumulates rounding drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Whole currency units, e.g. `Money::from_major(50)` == 50.00.
    pub const fn from_major(units: i64) -> Self {
        Money(units * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Percentage of this amount, rounded half away from zero to cent
    /// precision.
    pub fn percent(self, pct: i64) -> Money {
        Money(div_round_half(self.0 as i128 * pct as i128, 100) as i64)
    }

    pub fn times(self, n: i64) -> Money {
        Money(self.0 * n)
    }

    /// Parse a decimal string such as "150", "150.5" or "150.00".
    pub fn parse(input: &str) -> Result<Money, MoneyParseError> {
        let s = input.trim();
        let (sign, s) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };
        let (units, frac) = match s.split_once('.') {
            Some((u, f)) => (u, f),
            None => (s, ""),
        };
        if units.is_empty() && frac.is_empty() {
            return Err(MoneyParseError(input.to_string()));
        }
        if frac.len() > 2 {
            return Err(MoneyParseError(input.to_string()));
        }
        let units: i64 = if units.is_empty() {
            0
        } else {
            units.parse().map_err(|_| MoneyParseError(input.to_string()))?
        };
        let mut cents: i64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| MoneyParseError(input.to_string()))?
        };
        if frac.len() == 1 {
            cents *= 10;
        }
        units
            .checked_mul(100)
            .and_then(|total| total.checked_add(cents))
            .and_then(|total| total.checked_mul(sign))
            .map(Money)
            .ok_or_else(|| MoneyParseError(input.to_string()))
    }
}

fn div_round_half(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if r.abs() * 2 >= d.abs() {
        q + n.signum() * d.signum()
    } else {
        q
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid monetary amount: {0}")]
pub struct MoneyParseError(pub String);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;
    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

// On the wire amounts are decimal strings ("150.00"), matching the
// original billing format consumed by clients.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        struct MoneyVisitor;

        impl de::Visitor<'_> for MoneyVisitor {
            type Value = Money;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal amount string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
                Money::parse(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
                Ok(Money::from_major(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
                Ok(Money::from_major(v as i64))
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}
