#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Exact rational scores.
//!
//! Every weight and score that feeds a grade is a [`Fraction`]. Conversion to
//! `f64` happens only when a grade is rendered for people or for an LMS.

use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Error returned when a string cannot be read as a fraction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseFractionError {
    /// The input was empty or only whitespace.
    #[error("cannot parse a fraction from an empty string")]
    Empty,
    /// The input contained something other than digits, a sign, `/` or `.`.
    #[error("`{0}` is not a valid fraction (expected `n`, `n/d` or a decimal)")]
    Invalid(String),
    /// The denominator was zero.
    #[error("`{0}` has a zero denominator")]
    ZeroDenominator(String),
}

/// An exact rational number of unbounded size, always in lowest terms with a
/// positive denominator.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fraction(BigRational);

impl Fraction {
    /// Zero.
    pub fn zero() -> Self {
        Fraction(BigRational::zero())
    }

    /// One.
    pub fn one() -> Self {
        Fraction(BigRational::one())
    }

    /// Creates `numer / denom` in lowest terms.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero, like integer division does.
    pub fn new(numer: i128, denom: i128) -> Self {
        assert!(denom != 0, "fraction with zero denominator");
        Fraction(BigRational::new(numer.into(), denom.into()))
    }

    /// Creates `numer / denom`, returning `None` for a zero denominator.
    pub fn checked_new(numer: i128, denom: i128) -> Option<Self> {
        (denom != 0).then(|| Self::new(numer, denom))
    }

    /// A whole number.
    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Fraction(BigRational::from_integer(value.into()))
    }

    /// The numerator in lowest terms.
    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    /// The denominator in lowest terms (always positive).
    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    /// `self / rhs`, or zero when `rhs` is zero.
    ///
    /// Used for weight normalization, where an empty group has total weight
    /// zero and every member of it is worth nothing.
    pub fn div_or_zero(&self, rhs: &Fraction) -> Fraction {
        if rhs.is_zero() { Fraction::zero() } else { self / rhs }
    }

    /// Whether the value is strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// Lossy conversion for presentation.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Fraction::zero()
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

/// `From` for every integer type a weight or count shows up as.
macro_rules! from_integers {
    ($($int:ty),*) => {
        $(
            impl From<$int> for Fraction {
                fn from(value: $int) -> Self {
                    Fraction::from_integer(value)
                }
            }
        )*
    };
}

from_integers!(i32, i64, i128, u32, u64, usize);

impl FromStr for Fraction {
    type Err = ParseFractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ParseFractionError::Empty);
        }
        let invalid = || ParseFractionError::Invalid(text.to_string());
        let integer = |digits: &str| digits.trim().parse::<BigInt>().map_err(|_| invalid());

        if let Some((numer, denom)) = text.split_once('/') {
            let numer = integer(numer)?;
            let denom = integer(denom)?;
            if denom.is_zero() {
                return Err(ParseFractionError::ZeroDenominator(text.to_string()));
            }
            return Ok(Fraction(BigRational::new(numer, denom)));
        }

        if let Some((whole, decimals)) = text.split_once('.') {
            let (negative, digits) = match whole.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, whole.strip_prefix('+').unwrap_or(whole)),
            };
            if !decimals.chars().all(|c| c.is_ascii_digit())
                || !digits.chars().all(|c| c.is_ascii_digit())
                || (digits.is_empty() && decimals.is_empty())
            {
                return Err(invalid());
            }
            let numer = integer(&format!("0{digits}{decimals}"))?;
            let denom = num_traits::pow(BigInt::from(10), decimals.len());
            let magnitude = Fraction(BigRational::new(numer, denom));
            return Ok(if negative { -magnitude } else { magnitude });
        }

        integer(text).map(Fraction::from_integer)
    }
}

/// Implements a binary operator for every owned/borrowed operand pairing.
macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl $trait<&Fraction> for &Fraction {
            type Output = Fraction;

            fn $method(self, rhs: &Fraction) -> Fraction {
                Fraction($trait::$method(&self.0, &rhs.0))
            }
        }

        impl $trait<Fraction> for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: Fraction) -> Fraction {
                Fraction($trait::$method(self.0, rhs.0))
            }
        }

        impl $trait<&Fraction> for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: &Fraction) -> Fraction {
                Fraction($trait::$method(self.0, &rhs.0))
            }
        }

        impl $trait<Fraction> for &Fraction {
            type Output = Fraction;

            fn $method(self, rhs: Fraction) -> Fraction {
                Fraction($trait::$method(&self.0, rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
forward_binop!(Div, div);

impl Neg for Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction {
        Fraction(-self.0)
    }
}

impl Neg for &Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction {
        Fraction(-&self.0)
    }
}

impl AddAssign for Fraction {
    fn add_assign(&mut self, rhs: Fraction) {
        self.0 += rhs.0;
    }
}

impl AddAssign<&Fraction> for Fraction {
    fn add_assign(&mut self, rhs: &Fraction) {
        self.0 += &rhs.0;
    }
}

impl SubAssign for Fraction {
    fn sub_assign(&mut self, rhs: Fraction) {
        self.0 -= rhs.0;
    }
}

impl SubAssign<&Fraction> for Fraction {
    fn sub_assign(&mut self, rhs: &Fraction) {
        self.0 -= &rhs.0;
    }
}

impl Sum for Fraction {
    fn sum<I: Iterator<Item = Fraction>>(iter: I) -> Self {
        iter.fold(Fraction::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Fraction> for Fraction {
    fn sum<I: Iterator<Item = &'a Fraction>>(iter: I) -> Self {
        iter.fold(Fraction::zero(), |acc, x| acc + x)
    }
}

impl Zero for Fraction {
    fn zero() -> Self {
        Fraction::zero()
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Fraction {
    fn one() -> Self {
        Fraction::one()
    }
}

impl Serialize for Fraction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts `"n/d"` strings, integers, and floats (read through their shortest
/// decimal representation, so `0.1` becomes exactly `1/10`).
struct FractionVisitor;

impl de::Visitor<'_> for FractionVisitor {
    type Value = Fraction;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a fraction as an integer, a decimal, or an \"n/d\" string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Fraction, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Fraction, E> {
        Ok(Fraction::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Fraction, E> {
        Ok(Fraction::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Fraction, E> {
        if !v.is_finite() {
            return Err(E::custom(format!("{v} is not a finite number")));
        }
        format!("{v}").parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Fraction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FractionVisitor)
    }
}
