use crate::error::{Result, SimError};
use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Widest supported dtype in bytes.
pub const MAX_WIDTH: usize = 8;

/// Fixed-width integer kinds a measurand may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dtype {
    U1,
    U2,
    U4,
    U8,
    I1,
    I2,
    I4,
    I8,
}

impl Dtype {
    pub const ALL: [Dtype; 8] = [
        Dtype::U1,
        Dtype::U2,
        Dtype::U4,
        Dtype::U8,
        Dtype::I1,
        Dtype::I2,
        Dtype::I4,
        Dtype::I8,
    ];

    /// Serialized width in bytes.
    pub fn width(self) -> usize {
        match self {
            Dtype::U1 | Dtype::I1 => 1,
            Dtype::U2 | Dtype::I2 => 2,
            Dtype::U4 | Dtype::I4 => 4,
            Dtype::U8 | Dtype::I8 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(self, Dtype::I1 | Dtype::I2 | Dtype::I4 | Dtype::I8)
    }

    fn bits(self) -> u32 {
        self.width() as u32 * 8
    }

    pub fn min(self) -> i128 {
        if self.is_signed() {
            -(1i128 << (self.bits() - 1))
        } else {
            0
        }
    }

    pub fn max(self) -> i128 {
        if self.is_signed() {
            (1i128 << (self.bits() - 1)) - 1
        } else {
            (1i128 << self.bits()) - 1
        }
    }

    /// Number of distinct values, `2^(8*width)`.
    pub fn modulus(self) -> i128 {
        1i128 << self.bits()
    }

    pub fn contains(self, value: i128) -> bool {
        (self.min()..=self.max()).contains(&value)
    }

    /// Rejects literals that the dtype cannot represent.
    pub fn check(self, value: i128) -> Result<i128> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(SimError::OutOfRange {
                value,
                dtype: self,
                min: self.min(),
                max: self.max(),
            })
        }
    }

    /// Reduces `value` modulo `2^(8*width)` into the representable range,
    /// the way a fixed-width register wraps.
    pub fn wrap(self, value: i128) -> i128 {
        let modulus = self.modulus();
        let folded = value.rem_euclid(modulus);
        if folded > self.max() {
            folded - modulus
        } else {
            folded
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Dtype::U1 => "u1",
            Dtype::U2 => "u2",
            Dtype::U4 => "u4",
            Dtype::U8 => "u8",
            Dtype::I1 => "i1",
            Dtype::I2 => "i2",
            Dtype::I4 => "i4",
            Dtype::I8 => "i8",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dtype {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        Dtype::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| SimError::InvalidDtype(s.to_string()))
    }
}

impl TryFrom<String> for Dtype {
    type Error = SimError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Dtype> for String {
    fn from(dtype: Dtype) -> Self {
        dtype.as_str().to_string()
    }
}

/// One generated value together with the dtype it is serialized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    value: i128,
    dtype: Dtype,
}

impl Sample {
    /// Builds a sample, folding `value` into the dtype's range.
    pub fn new(value: i128, dtype: Dtype) -> Self {
        Self {
            value: dtype.wrap(value),
            dtype,
        }
    }

    pub fn value(&self) -> i128 {
        self.value
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Two's-complement bytes at the dtype's width; most significant byte
    /// first when `msbf` is set.
    pub fn to_bytes(&self, msbf: bool) -> ArrayVec<u8, MAX_WIDTH> {
        let le = (self.value as u128).to_le_bytes();
        let mut bytes: ArrayVec<u8, MAX_WIDTH> =
            le[..self.dtype.width()].iter().copied().collect();
        if msbf {
            bytes.reverse();
        }
        bytes
    }
}
