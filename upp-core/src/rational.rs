use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// An exact rational number extended with the two infinities.
///
/// Finite values are arbitrary-precision fractions kept in lowest terms with a
/// positive denominator. The ordering is total: `-inf` is below every finite
/// value and `+inf` is above.
///
/// # Panics
///
/// The arithmetic operators panic where the result is undefined (`inf - inf`,
/// `inf / inf`, `0 * inf`) or on division by zero. The `checked_*` methods
/// report these as [`RationalError`] instead.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational(Repr);

// Variant order drives the derived ordering.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Repr {
    MinusInfinity,
    Finite(BigRational),
    PlusInfinity,
}

/// The ways rational arithmetic can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RationalError {
    /// Any finite or infinite value divided by zero
    #[error("division by zero")]
    DivisionByZero,

    /// An operation with no defined result in the extended rationals
    #[error("undefined operation: {0}")]
    UndefinedOperation(&'static str),

    /// Text that is not a rational literal
    #[error("invalid rational literal `{0}`")]
    Parse(String),
}

impl Rational {
    /// Positive infinity
    pub const PLUS_INFINITY: Rational = Rational(Repr::PlusInfinity);

    /// Negative infinity
    pub const MINUS_INFINITY: Rational = Rational(Repr::MinusInfinity);

    /// Creates the fraction `numerator / denominator`, reduced to lowest terms.
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, RationalError> {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(Repr::Finite(BigRational::new(numerator.into(), denominator))))
    }

    /// Creates a whole number.
    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self(Repr::Finite(BigRational::from_integer(value.into())))
    }

    /// The additive identity
    pub fn zero() -> Self {
        Self(Repr::Finite(BigRational::zero()))
    }

    /// The multiplicative identity
    pub fn one() -> Self {
        Self(Repr::Finite(BigRational::one()))
    }

    /// Borrows the underlying fraction, if finite.
    pub fn as_big_rational(&self) -> Option<&BigRational> {
        match &self.0 {
            Repr::Finite(value) => Some(value),
            _ => None,
        }
    }

    /// Numerator of a finite value in lowest terms
    pub fn numerator(&self) -> Option<&BigInt> {
        self.as_big_rational().map(|value| value.numer())
    }

    /// Denominator of a finite value in lowest terms, always positive
    pub fn denominator(&self) -> Option<&BigInt> {
        self.as_big_rational().map(|value| value.denom())
    }

    pub fn is_finite(&self) -> bool {
        matches!(self.0, Repr::Finite(_))
    }

    pub fn is_plus_infinite(&self) -> bool {
        matches!(self.0, Repr::PlusInfinity)
    }

    pub fn is_minus_infinite(&self) -> bool {
        matches!(self.0, Repr::MinusInfinity)
    }

    pub fn is_zero(&self) -> bool {
        matches!(&self.0, Repr::Finite(value) if value.is_zero())
    }

    /// Strictly greater than zero (true for `+inf`)
    pub fn is_positive(&self) -> bool {
        self.signum() == Ordering::Greater
    }

    /// Strictly less than zero (true for `-inf`)
    pub fn is_negative(&self) -> bool {
        self.signum() == Ordering::Less
    }

    /// Whether a finite value has denominator one
    pub fn is_integer(&self) -> bool {
        matches!(&self.0, Repr::Finite(value) if value.is_integer())
    }

    fn signum(&self) -> Ordering {
        match &self.0 {
            Repr::MinusInfinity => Ordering::Less,
            Repr::PlusInfinity => Ordering::Greater,
            Repr::Finite(value) => value.cmp(&BigRational::zero()),
        }
    }

    /// The greatest integer not above this value. Infinities are returned unchanged.
    pub fn floor(&self) -> Rational {
        match &self.0 {
            Repr::Finite(value) => Self(Repr::Finite(value.floor())),
            _ => self.clone(),
        }
    }

    /// The least integer not below this value. Infinities are returned unchanged.
    pub fn ceil(&self) -> Rational {
        match &self.0 {
            Repr::Finite(value) => Self(Repr::Finite(value.ceil())),
            _ => self.clone(),
        }
    }

    pub fn abs(&self) -> Rational {
        match &self.0 {
            Repr::Finite(value) => Self(Repr::Finite(value.abs())),
            _ => Self::PLUS_INFINITY,
        }
    }

    /// Converts a finite integral value to `usize`, if it fits.
    pub fn to_usize(&self) -> Option<usize> {
        match &self.0 {
            Repr::Finite(value) if value.is_integer() => value.to_integer().to_usize(),
            _ => None,
        }
    }

    /// Sum, failing on `inf + (-inf)`.
    pub fn checked_add(&self, rhs: &Rational) -> Result<Rational, RationalError> {
        Ok(match (&self.0, &rhs.0) {
            (Repr::Finite(a), Repr::Finite(b)) => Self(Repr::Finite(a + b)),
            (Repr::PlusInfinity, Repr::MinusInfinity) | (Repr::MinusInfinity, Repr::PlusInfinity) => {
                return Err(RationalError::UndefinedOperation("infinity minus infinity"));
            }
            (Repr::PlusInfinity, _) | (_, Repr::PlusInfinity) => Self::PLUS_INFINITY,
            (Repr::MinusInfinity, _) | (_, Repr::MinusInfinity) => Self::MINUS_INFINITY,
        })
    }

    /// Difference, failing on `inf - inf`.
    pub fn checked_sub(&self, rhs: &Rational) -> Result<Rational, RationalError> {
        self.checked_add(&-rhs)
    }

    /// Product, failing on `0 * inf`.
    pub fn checked_mul(&self, rhs: &Rational) -> Result<Rational, RationalError> {
        if let (Repr::Finite(a), Repr::Finite(b)) = (&self.0, &rhs.0) {
            return Ok(Self(Repr::Finite(a * b)));
        }
        match (self.signum(), rhs.signum()) {
            (Ordering::Equal, _) | (_, Ordering::Equal) => {
                Err(RationalError::UndefinedOperation("zero times infinity"))
            }
            (a, b) if a == b => Ok(Self::PLUS_INFINITY),
            _ => Ok(Self::MINUS_INFINITY),
        }
    }

    /// Quotient, failing on division by zero and on `inf / inf`.
    pub fn checked_div(&self, rhs: &Rational) -> Result<Rational, RationalError> {
        if rhs.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        match (&self.0, &rhs.0) {
            (Repr::Finite(a), Repr::Finite(b)) => Ok(Self(Repr::Finite(a / b))),
            (Repr::Finite(_), _) => Ok(Self::zero()),
            (_, Repr::Finite(_)) => {
                if self.signum() == rhs.signum() {
                    Ok(Self::PLUS_INFINITY)
                } else {
                    Ok(Self::MINUS_INFINITY)
                }
            }
            _ => Err(RationalError::UndefinedOperation("infinity divided by infinity")),
        }
    }

    /// Greatest common divisor of two positive finite rationals: the largest
    /// `r` such that both `self / r` and `other / r` are integers.
    pub fn gcd(&self, other: &Rational) -> Result<Rational, RationalError> {
        let (a, b) = Self::positive_pair(self, other, "gcd of a non-positive value")?;
        Ok(Self(Repr::Finite(BigRational::new(
            a.numer().gcd(b.numer()),
            a.denom().lcm(b.denom()),
        ))))
    }

    /// Least common multiple of two positive finite rationals: the smallest
    /// `r` that is an integer multiple of both.
    pub fn least_common_multiple(&self, other: &Rational) -> Result<Rational, RationalError> {
        let (a, b) = Self::positive_pair(self, other, "lcm of a non-positive value")?;
        Ok(Self(Repr::Finite(BigRational::new(
            a.numer().lcm(b.numer()),
            a.denom().gcd(b.denom()),
        ))))
    }

    fn positive_pair<'a>(
        a: &'a Rational,
        b: &'a Rational,
        reason: &'static str,
    ) -> Result<(&'a BigRational, &'a BigRational), RationalError> {
        match (&a.0, &b.0) {
            (Repr::Finite(a), Repr::Finite(b)) if a.is_positive() && b.is_positive() => Ok((a, b)),
            _ => Err(RationalError::UndefinedOperation(reason)),
        }
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<BigRational> for Rational {
    fn from(value: BigRational) -> Self {
        Self(Repr::Finite(value))
    }
}

impl From<BigInt> for Rational {
    fn from(value: BigInt) -> Self {
        Self::from_integer(value)
    }
}

macro_rules! from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Rational {
                fn from(value: $t) -> Self {
                    Self::from_integer(value)
                }
            }
        )*
    };
}

from_primitive!(i32, i64, u32, u64, usize);

impl From<&Rational> for Rational {
    fn from(value: &Rational) -> Self {
        value.clone()
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        match &self.0 {
            Repr::Finite(value) => Rational(Repr::Finite(-value)),
            Repr::PlusInfinity => Rational::MINUS_INFINITY,
            Repr::MinusInfinity => Rational::PLUS_INFINITY,
        }
    }
}

impl Neg for Rational {
    type Output = Rational;

    fn neg(self) -> Rational {
        -&self
    }
}

// Operators forward to the checked forms. Like integer division by zero, an
// undefined result is a panic.
macro_rules! forward_binop {
    ($imp:ident, $method:ident, $checked:ident, $assign_imp:ident, $assign_method:ident) => {
        impl $imp<&Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                match self.$checked(rhs) {
                    Ok(value) => value,
                    Err(err) => panic!("{err}"),
                }
            }
        }

        impl $imp<Rational> for &Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                self.$method(&rhs)
            }
        }

        impl $imp<&Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: &Rational) -> Rational {
                (&self).$method(rhs)
            }
        }

        impl $imp<Rational> for Rational {
            type Output = Rational;

            fn $method(self, rhs: Rational) -> Rational {
                (&self).$method(&rhs)
            }
        }

        impl $assign_imp<&Rational> for Rational {
            fn $assign_method(&mut self, rhs: &Rational) {
                *self = (&*self).$method(rhs);
            }
        }

        impl $assign_imp<Rational> for Rational {
            fn $assign_method(&mut self, rhs: Rational) {
                *self = (&*self).$method(&rhs);
            }
        }
    };
}

forward_binop!(Add, add, checked_add, AddAssign, add_assign);
forward_binop!(Sub, sub, checked_sub, SubAssign, sub_assign);
forward_binop!(Mul, mul, checked_mul, MulAssign, mul_assign);
forward_binop!(Div, div, checked_div, DivAssign, div_assign);

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::PlusInfinity => f.write_str("+inf"),
            Repr::MinusInfinity => f.write_str("-inf"),
            Repr::Finite(value) if value.is_integer() => write!(f, "{}", value.numer()),
            Repr::Finite(value) => write!(f, "{}/{}", value.numer(), value.denom()),
        }
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Rational {
    type Err = RationalError;

    /// Accepts `n`, `n/d`, decimal literals such as `-10.25`, and `+inf`/`-inf`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || RationalError::Parse(s.to_owned());
        let integer = |digits: &str| BigInt::from_str(digits).map_err(|_| invalid());

        match text {
            "+inf" | "inf" => return Ok(Self::PLUS_INFINITY),
            "-inf" => return Ok(Self::MINUS_INFINITY),
            _ => {}
        }

        if let Some((numerator, denominator)) = text.split_once('/') {
            return Self::new(integer(numerator.trim())?, integer(denominator.trim())?);
        }

        if let Some((whole, fraction)) = text.split_once('.') {
            if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let negative = whole.starts_with('-');
            let whole = whole.trim_start_matches(['-', '+']);
            let digits = integer(&format!("{whole}{fraction}"))?;
            let scale = num_traits::pow(BigInt::from(10), fraction.len());
            let magnitude = Self::new(digits, scale)?;
            return Ok(if negative { -magnitude } else { magnitude });
        }

        Ok(Self::from_integer(integer(text)?))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Rational {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Rational {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
