//! 18-decimal unsigned fixed-point quantity backed by a 256-bit integer.
//!
//! A [`Decimal`] stores a raw integer `r` and represents `r / 10^18`. Token
//! amounts, the running product `P`, kickback fractions and the sum
//! accumulators are all `Decimal`s. Products such as `deposit × ΔS` exceed
//! 128 bits, hence the 256-bit backing.
//!
//! Every operation that can fail is checked and returns an
//! [`ArithmeticError`]; nothing wraps silently. Raw operations (`*_raw`,
//! `*_int`) work on the underlying integer and never rescale; callers state
//! the scaling explicitly, e.g. `a.mul_div(b, Decimal::ONE)` for `a × b`.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::DECIMAL_PRECISION;
use crate::error::{ArithmeticError, ParseDecimalError};

const PRECISION: U256 = U256([DECIMAL_PRECISION as u64, 0, 0, 0]);
const FRACTION_DIGITS: usize = 18;

/// Unsigned 18-decimal fixed-point number.
///
/// # Examples
///
/// ```
/// use ballast_core::Decimal;
/// let half: Decimal = "0.5".parse().unwrap();
/// let ten = Decimal::from_units(10);
/// assert_eq!(ten.decimal_mul(half).unwrap(), Decimal::from_units(5));
/// assert_eq!(half.to_string(), "0.5");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(U256);

impl Decimal {
    pub const ZERO: Self = Self(U256([0, 0, 0, 0]));
    /// `1.0`, i.e. `10^18` raw units.
    pub const ONE: Self = Self(PRECISION);

    /// Wrap a raw integer (already scaled by `10^18`).
    pub fn from_raw(raw: impl Into<U256>) -> Self {
        Self(raw.into())
    }

    /// Whole tokens, scaled up by `10^18`.
    pub fn from_units(units: u64) -> Self {
        Self(U256::from(units) * PRECISION)
    }

    /// The underlying raw integer.
    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(ArithmeticError::Overflow)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(ArithmeticError::Underflow)
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Raw product `self.raw × rhs.raw` with no rescaling.
    pub fn checked_mul_raw(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.0
            .checked_mul(rhs.0)
            .map(Self)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Raw floor quotient `self.raw / rhs.raw` with no rescaling.
    pub fn checked_div_raw(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Self(self.0 / rhs.0))
    }

    /// Raw remainder `self.raw % rhs.raw`.
    pub fn checked_rem_raw(self, rhs: Self) -> Result<Self, ArithmeticError> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Self(self.0 % rhs.0))
    }

    /// Multiply the raw value by an integer constant.
    pub fn checked_mul_int(self, k: u128) -> Result<Self, ArithmeticError> {
        self.0
            .checked_mul(U256::from(k))
            .map(Self)
            .ok_or(ArithmeticError::Overflow)
    }

    /// Floor-divide the raw value by an integer constant.
    pub fn checked_div_int(self, k: u128) -> Result<Self, ArithmeticError> {
        if k == 0 {
            return Err(ArithmeticError::DivisionByZero);
        }
        Ok(Self(self.0 / U256::from(k)))
    }

    /// `floor(self.raw × mul.raw / div.raw)` with a full 256-bit intermediate.
    pub fn mul_div(self, mul: Self, div: Self) -> Result<Self, ArithmeticError> {
        self.checked_mul_raw(mul)?.checked_div_raw(div)
    }

    /// Fixed-point product `self × rhs` (floor).
    pub fn decimal_mul(self, rhs: Self) -> Result<Self, ArithmeticError> {
        self.mul_div(rhs, Self::ONE)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / PRECISION;
        let frac = (self.0 % PRECISION).low_u64();
        if frac == 0 {
            return write!(f, "{int}");
        }
        let digits = format!("{frac:0width$}", width = FRACTION_DIGITS);
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseDecimalError::Empty);
        }
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseDecimalError::Invalid(s.to_string()));
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(ParseDecimalError::Invalid(s.to_string()));
        }
        if frac_part.len() > FRACTION_DIGITS {
            return Err(ParseDecimalError::TooManyDecimals(frac_part.len()));
        }

        let int = if int_part.is_empty() {
            U256::zero()
        } else {
            U256::from_dec_str(int_part).map_err(|_| ParseDecimalError::OutOfRange)?
        };
        let mut frac_digits = frac_part.to_string();
        while frac_digits.len() < FRACTION_DIGITS {
            frac_digits.push('0');
        }
        let frac: u64 = frac_digits
            .parse()
            .map_err(|_| ParseDecimalError::Invalid(s.to_string()))?;

        int.checked_mul(PRECISION)
            .and_then(|scaled| scaled.checked_add(U256::from(frac)))
            .map(Self)
            .ok_or(ParseDecimalError::OutOfRange)
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }
}

struct DecimalVisitor;

impl Visitor<'_> for DecimalVisitor {
    type Value = Decimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal number or string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Decimal, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Decimal, E> {
        Ok(Decimal::from_units(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Decimal, E> {
        u64::try_from(v)
            .map(Decimal::from_units)
            .map_err(|_| E::custom("decimal must be non-negative"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Decimal, E> {
        if !v.is_finite() || v < 0.0 {
            return Err(E::custom("decimal must be finite and non-negative"));
        }
        format!("{v}").parse().map_err(E::custom)
    }
}
