//! Exact rational number arithmetic
//!
//! Every matrix entry, factor and answer in the game is a [`Fraction`]. Values
//! are always kept in lowest terms with a positive denominator, so structural
//! equality is numeric equality and no epsilon is ever needed.

use crate::error::{EngineError, Result};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

/// Arbitrary-precision rational number
///
/// Wraps num-rational's BigRational so long elimination sequences can never
/// overflow, while exposing a small JavaScript-friendly API.
#[wasm_bindgen]
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "FractionInput", into = "FractionRepr")]
pub struct Fraction {
    inner: BigRational,
}

/// Serialized form handed to JavaScript
#[derive(Serialize)]
struct FractionRepr {
    s: i8,        // sign: -1, 0 or 1
    n: String,    // absolute numerator (string for big integers)
    d: String,    // denominator
    text: String, // display form, "a/b" or "a"
}

/// Accepted input shapes: level tables mix plain integers, strings like
/// "-3/4" and fraction.js style `{ s, n, d }` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum FractionInput {
    Integer(i64),
    Number(f64),
    Text(String),
    Parts {
        #[serde(default)]
        s: Option<i64>,
        n: IntegerInput,
        d: IntegerInput,
    },
}

/// `n` and `d` arrive as numbers, or as strings when they are too big for one
#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerInput {
    Number(i64),
    Text(String),
}

impl IntegerInput {
    fn into_big_int(self) -> Result<BigInt> {
        match self {
            IntegerInput::Number(v) => Ok(BigInt::from(v)),
            IntegerInput::Text(t) => t.trim().parse().map_err(|_| EngineError::Parse(t)),
        }
    }
}

impl From<Fraction> for FractionRepr {
    fn from(f: Fraction) -> Self {
        FractionRepr {
            s: f.s() as i8,
            n: f.inner.numer().abs().to_string(),
            d: f.inner.denom().to_string(),
            text: f.to_string_repr(),
        }
    }
}

impl TryFrom<FractionInput> for Fraction {
    type Error = EngineError;

    fn try_from(input: FractionInput) -> Result<Fraction> {
        match input {
            FractionInput::Integer(n) => Ok(Fraction::new_raw(n, 1)),
            FractionInput::Number(v) => {
                // Only integral floats are exact; anything else would smuggle
                // rounding error into the level.
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.007_199_254_740_992e15 {
                    Ok(Fraction::new_raw(v as i64, 1))
                } else {
                    Err(EngineError::Parse(v.to_string()))
                }
            }
            FractionInput::Text(s) => s.parse(),
            FractionInput::Parts { s, n, d } => {
                let n = n.into_big_int()?;
                let num = match s {
                    Some(s) if s < 0 => -n.abs(),
                    Some(_) => n.abs(),
                    None => n,
                };
                Fraction::checked(num, d.into_big_int()?)
            }
        }
    }
}

impl Fraction {
    /// Create a new Fraction from numerator and denominator
    ///
    /// # Panics
    /// Panics if `den` is zero. Use [`Fraction::checked`] for untrusted input.
    pub fn new_raw(num: i64, den: i64) -> Self {
        Fraction {
            inner: BigRational::new(BigInt::from(num), BigInt::from(den)),
        }
    }

    /// Create from BigInt numerator and denominator, rejecting a zero denominator
    pub fn checked(num: BigInt, den: BigInt) -> Result<Self> {
        if den.is_zero() {
            return Err(EngineError::DivisionByZero);
        }
        Ok(Fraction {
            inner: BigRational::new(num, den),
        })
    }

    /// Create from BigRational directly
    pub fn from_big_rational(r: BigRational) -> Self {
        Fraction { inner: r }
    }

    pub fn zero() -> Self {
        Fraction {
            inner: BigRational::zero(),
        }
    }

    pub fn one() -> Self {
        Fraction {
            inner: BigRational::one(),
        }
    }
}

#[wasm_bindgen]
impl Fraction {
    /// Create a new Fraction from numerator and denominator
    #[wasm_bindgen(constructor)]
    pub fn new(num: i32, den: i32) -> Result<Fraction> {
        Fraction::checked(BigInt::from(num), BigInt::from(den))
    }

    /// Create a Fraction from a single integer
    #[wasm_bindgen(js_name = fromInt)]
    pub fn from_int(n: i32) -> Fraction {
        Fraction::new_raw(n as i64, 1)
    }

    /// Create a Fraction from a string like "3/4", "-2" or "1.25"
    #[wasm_bindgen(js_name = fromString)]
    pub fn from_string(s: &str) -> Result<Fraction> {
        s.parse()
    }

    /// Add two fractions
    pub fn add(&self, other: &Fraction) -> Fraction {
        Fraction {
            inner: &self.inner + &other.inner,
        }
    }

    /// Subtract two fractions
    pub fn subtract(&self, other: &Fraction) -> Fraction {
        Fraction {
            inner: &self.inner - &other.inner,
        }
    }

    /// Multiply two fractions
    pub fn multiply(&self, other: &Fraction) -> Fraction {
        Fraction {
            inner: &self.inner * &other.inner,
        }
    }

    /// Divide two fractions
    pub fn divide(&self, other: &Fraction) -> Result<Fraction> {
        if other.inner.is_zero() {
            return Err(EngineError::DivisionByZero);
        }
        Ok(Fraction {
            inner: &self.inner / &other.inner,
        })
    }

    /// Get the reciprocal (1/x)
    pub fn reciprocal(&self) -> Result<Fraction> {
        if self.inner.is_zero() {
            return Err(EngineError::DivisionByZero);
        }
        Ok(Fraction {
            inner: self.inner.recip(),
        })
    }

    /// Negate the fraction
    pub fn negate(&self) -> Fraction {
        Fraction {
            inner: -&self.inner,
        }
    }

    /// Get the absolute value
    pub fn abs(&self) -> Fraction {
        Fraction {
            inner: self.inner.abs(),
        }
    }

    /// Check if this fraction equals another
    pub fn equals(&self, other: &Fraction) -> bool {
        self.inner == other.inner
    }

    /// Compare this fraction to another
    /// Returns -1 if self < other, 0 if equal, 1 if self > other
    pub fn compare(&self, other: &Fraction) -> i32 {
        match self.inner.cmp(&other.inner) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    /// Convert to f64 (display and layout only)
    #[wasm_bindgen(js_name = toF64)]
    pub fn to_f64(&self) -> f64 {
        self.inner.to_f64().unwrap_or(0.0)
    }

    /// Get the sign (-1, 0, or 1)
    #[wasm_bindgen(getter)]
    pub fn s(&self) -> i32 {
        if self.inner.is_zero() {
            0
        } else if self.inner.is_positive() {
            1
        } else {
            -1
        }
    }

    /// Get the signed numerator as a string
    #[wasm_bindgen(js_name = numeratorStr)]
    pub fn numerator_str(&self) -> String {
        self.inner.numer().to_string()
    }

    /// Get the denominator as a string
    #[wasm_bindgen(js_name = denominatorStr)]
    pub fn denominator_str(&self) -> String {
        self.inner.denom().to_string()
    }

    /// Convert to string representation "n/d" or "n" if d=1
    #[wasm_bindgen(js_name = toString)]
    pub fn to_string_repr(&self) -> String {
        let numer = self.inner.numer();
        let denom = self.inner.denom();

        if denom.is_one() {
            numer.to_string()
        } else {
            format!("{}/{}", numer, denom)
        }
    }

    #[wasm_bindgen(js_name = isZero)]
    pub fn is_zero(&self) -> bool {
        self.inner.is_zero()
    }

    #[wasm_bindgen(js_name = isOne)]
    pub fn is_one(&self) -> bool {
        self.inner.is_one()
    }

    #[wasm_bindgen(js_name = isInteger)]
    pub fn is_integer(&self) -> bool {
        self.inner.is_integer()
    }

    #[wasm_bindgen(js_name = isNegative)]
    pub fn is_negative(&self) -> bool {
        self.inner.is_negative()
    }
}

impl FromStr for Fraction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Fraction> {
        let s = s.trim();
        let bad = || EngineError::Parse(s.to_string());

        // "n/d"
        if let Some((num_str, den_str)) = s.split_once('/') {
            let num: BigInt = num_str.trim().parse().map_err(|_| bad())?;
            let den: BigInt = den_str.trim().parse().map_err(|_| bad())?;
            return Fraction::checked(num, den);
        }

        if let Ok(n) = s.parse::<BigInt>() {
            return Ok(Fraction::from_big_rational(BigRational::from_integer(n)));
        }

        parse_decimal(s).map(Fraction::from_big_rational).ok_or_else(bad)
    }
}

/// Exact parse of a finite decimal such as "-0.75"
fn parse_decimal(s: &str) -> Option<BigRational> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int_part, frac_part) = body.split_once('.')?;
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let digits = format!("{}{}", int_part, frac_part);
    let mut numer: BigInt = digits.parse().ok()?;
    if negative {
        numer = -numer;
    }
    let denom = num_traits::pow(BigInt::from(10), frac_part.len());
    Some(BigRational::new(numer, denom))
}

// Implement standard traits

impl Default for Fraction {
    fn default() -> Self {
        Fraction::zero()
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fraction({})", self.to_string_repr())
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_repr())
    }
}

impl Neg for Fraction {
    type Output = Fraction;

    fn neg(self) -> Fraction {
        Fraction { inner: -self.inner }
    }
}

impl From<i32> for Fraction {
    fn from(n: i32) -> Self {
        Fraction::new_raw(n as i64, 1)
    }
}

impl From<i64> for Fraction {
    fn from(n: i64) -> Self {
        Fraction::new_raw(n, 1)
    }
}
