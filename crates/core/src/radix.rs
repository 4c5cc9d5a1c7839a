use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest value the codec represents exactly.
pub const MAX_EXACT: u64 = u64::MAX;

const MIN_RADIX: u32 = 2;
const MAX_RADIX: u32 = 36;
const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while parsing or rendering numerals.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RadixError {
    #[error("invalid numeral {numeral:?} for base {radix}")]
    InvalidDigit { numeral: String, radix: u32 },

    #[error("cannot render negative value {0}")]
    NegativeValue(i128),

    #[error("value exceeds the exact integer range (max {max})")]
    PrecisionLoss { max: u64 },

    #[error("unsupported radix: {0}")]
    UnsupportedRadix(u32),

    #[error("unknown base: {0}")]
    UnknownBase(String),
}

impl RadixError {
    fn invalid(numeral: &str, radix: u32) -> Self {
        Self::InvalidDigit {
            numeral: numeral.to_owned(),
            radix,
        }
    }

    fn precision_loss() -> Self {
        Self::PrecisionLoss { max: MAX_EXACT }
    }
}

//
// ─── BASE ─────────────────────────────────────────────────────────────────────
//

/// The positional numeral systems offered by the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Base {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

impl Base {
    pub const ALL: [Base; 4] = [Base::Binary, Base::Octal, Base::Decimal, Base::Hexadecimal];

    #[must_use]
    pub const fn radix(self) -> u32 {
        match self {
            Base::Binary => 2,
            Base::Octal => 8,
            Base::Decimal => 10,
            Base::Hexadecimal => 16,
        }
    }

    /// Maps a numeric radix onto one of the supported bases.
    ///
    /// # Errors
    ///
    /// Returns `RadixError::UnsupportedRadix` for anything other than 2, 8, 10 or 16.
    pub fn from_radix(radix: u32) -> Result<Self, RadixError> {
        Self::ALL
            .into_iter()
            .find(|base| base.radix() == radix)
            .ok_or(RadixError::UnsupportedRadix(radix))
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Base::Binary => "binary",
            Base::Octal => "octal",
            Base::Decimal => "decimal",
            Base::Hexadecimal => "hexadecimal",
        }
    }

    /// A sample numeral in this base, used as an input hint.
    #[must_use]
    pub const fn example(self) -> &'static str {
        match self {
            Base::Binary => "101010",
            Base::Octal => "52",
            Base::Decimal => "42",
            Base::Hexadecimal => "2A",
        }
    }

    /// Canonical (uppercase) digit alphabet, ordered by digit value.
    #[must_use]
    pub fn alphabet(self) -> &'static str {
        let len = self.radix() as usize;
        // DIGITS is ASCII, so any prefix is valid UTF-8.
        std::str::from_utf8(&DIGITS[..len]).unwrap_or_default()
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Base {
    type Err = RadixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2" | "bin" | "binary" => Ok(Base::Binary),
            "8" | "oct" | "octal" => Ok(Base::Octal),
            "10" | "dec" | "decimal" => Ok(Base::Decimal),
            "16" | "hex" | "hexadecimal" => Ok(Base::Hexadecimal),
            _ => Err(RadixError::UnknownBase(s.to_owned())),
        }
    }
}

//
// ─── RADIX-GENERIC ARITHMETIC ─────────────────────────────────────────────────
//

fn check_radix(radix: u32) -> Result<(), RadixError> {
    if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
        Ok(())
    } else {
        Err(RadixError::UnsupportedRadix(radix))
    }
}

fn is_valid_in(numeral: &str, radix: u32) -> bool {
    !numeral.is_empty() && numeral.chars().all(|ch| ch.is_digit(radix))
}

/// Parses a numeral written in any radix from 2 to 36, most significant digit first.
///
/// Letters are accepted in either case. Leading zeros are allowed.
///
/// # Errors
///
/// - `RadixError::UnsupportedRadix` if `radix` is outside 2..=36.
/// - `RadixError::InvalidDigit` if the numeral is empty or has a digit outside the alphabet.
/// - `RadixError::PrecisionLoss` if the value does not fit in [`MAX_EXACT`].
pub fn parse_radix(numeral: &str, radix: u32) -> Result<u64, RadixError> {
    check_radix(radix)?;
    if !is_valid_in(numeral, radix) {
        return Err(RadixError::invalid(numeral, radix));
    }

    numeral.chars().try_fold(0_u64, |acc, ch| {
        let digit = ch
            .to_digit(radix)
            .ok_or_else(|| RadixError::invalid(numeral, radix))?;
        acc.checked_mul(u64::from(radix))
            .and_then(|shifted| shifted.checked_add(u64::from(digit)))
            .ok_or_else(RadixError::precision_loss)
    })
}

/// Renders `value` in any radix from 2 to 36 using repeated division.
///
/// # Errors
///
/// Returns `RadixError::UnsupportedRadix` if `radix` is outside 2..=36.
pub fn format_radix(value: u64, radix: u32) -> Result<String, RadixError> {
    check_radix(radix)?;
    Ok(render(value, radix))
}

// Caller guarantees `radix` is within 2..=36.
fn render(value: u64, radix: u32) -> String {
    if value == 0 {
        return "0".to_owned();
    }

    let radix = u64::from(radix);
    let mut digits = Vec::new();
    let mut rest = value;
    while rest > 0 {
        let index = usize::try_from(rest % radix).unwrap_or_default();
        digits.push(char::from(DIGITS[index]));
        rest /= radix;
    }
    digits.iter().rev().collect()
}

//
// ─── PUBLIC CODEC ─────────────────────────────────────────────────────────────
//

/// Returns true iff `numeral` is non-empty and every character belongs to `base`'s alphabet.
///
/// Hexadecimal letters are accepted in either case. Magnitude is not checked.
#[must_use]
pub fn validate(numeral: &str, base: Base) -> bool {
    is_valid_in(numeral, base.radix())
}

/// Parses a numeral written in `base` into its exact value.
///
/// # Errors
///
/// - `RadixError::InvalidDigit` if [`validate`] would return false.
/// - `RadixError::PrecisionLoss` if the value does not fit in [`MAX_EXACT`].
pub fn parse(numeral: &str, base: Base) -> Result<u64, RadixError> {
    parse_radix(numeral, base.radix())
}

/// Renders a non-negative value as the minimal digit string in `base`.
///
/// Hexadecimal digits are uppercase; zero renders as `"0"`.
///
/// # Errors
///
/// - `RadixError::NegativeValue` if `value < 0`.
/// - `RadixError::PrecisionLoss` if `value` exceeds [`MAX_EXACT`].
pub fn format(value: i128, base: Base) -> Result<String, RadixError> {
    if value < 0 {
        return Err(RadixError::NegativeValue(value));
    }
    let value = u64::try_from(value).map_err(|_| RadixError::precision_loss())?;
    Ok(render(value, base.radix()))
}

/// Converts a numeral from one base to another (`parse` then `format`).
///
/// # Errors
///
/// Propagates any error from [`parse`] or [`format`].
pub fn convert(numeral: &str, from: Base, to: Base) -> Result<String, RadixError> {
    let value = parse(numeral, from)?;
    format(i128::from(value), to)
}

//
// ─── NUMERAL ──────────────────────────────────────────────────────────────────
//

/// A validated numeral in a given base, kept in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Numeral {
    digits: String,
    base: Base,
    value: u64,
}

impl Numeral {
    /// Parses and canonicalizes a numeral (uppercase, no leading zeros).
    ///
    /// # Errors
    ///
    /// Same as [`parse`].
    pub fn parse(numeral: &str, base: Base) -> Result<Self, RadixError> {
        let value = parse(numeral, base)?;
        Ok(Self::from_value(value, base))
    }

    #[must_use]
    pub fn from_value(value: u64, base: Base) -> Self {
        Self {
            digits: render(value, base.radix()),
            base,
            value,
        }
    }

    #[must_use]
    pub fn digits(&self) -> &str {
        &self.digits
    }

    #[must_use]
    pub fn base(&self) -> Base {
        self.base
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Re-renders the same value in another base.
    #[must_use]
    pub fn to_base(&self, base: Base) -> Self {
        Self::from_value(self.value, base)
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

//
// ─── CONVERSION ───────────────────────────────────────────────────────────────
//

/// A conversion direction between two bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conversion {
    pub from: Base,
    pub to: Base,
}

impl Conversion {
    /// Directions offered by the practice screen.
    pub const PRACTICE: [Conversion; 6] = [
        Conversion::new(Base::Decimal, Base::Binary),
        Conversion::new(Base::Binary, Base::Decimal),
        Conversion::new(Base::Decimal, Base::Hexadecimal),
        Conversion::new(Base::Hexadecimal, Base::Decimal),
        Conversion::new(Base::Decimal, Base::Octal),
        Conversion::new(Base::Octal, Base::Decimal),
    ];

    #[must_use]
    pub const fn new(from: Base, to: Base) -> Self {
        Self { from, to }
    }

    /// Reads `numeral` in `self.from` and re-renders it in `self.to`.
    ///
    /// # Errors
    ///
    /// Same as [`parse`].
    pub fn apply(self, numeral: &str) -> Result<Numeral, RadixError> {
        Ok(Numeral::parse(numeral, self.from)?.to_base(self.to))
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from.radix(), self.to.radix())
    }
}

//
// ─── TESTS ────────────────────────────────────────────────────────────────────
//
