//! Rhythmic durations and their exact proportions of a whole note.
//!
//! A duration is a power-of-two base value (whole through 64th) plus a
//! dot count. Every proportion stays a rational with a power-of-two
//! denominator; nothing here goes through floating point.

use std::fmt;

use num_rational::Rational64;
use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// Exact fraction of a whole note.
pub type Proportion = Rational64;

/// Shortest supported base value is 1/2^6 = 64th.
pub const SHORTEST_POWER: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDuration", into = "RawDuration")]
pub struct Duration {
    /// Base value as a power of two: 0 = whole, 2 = quarter, 6 = 64th
    power: u8,
    dots: u8,
}

impl Duration {
    pub const WHOLE: Duration = Duration { power: 0, dots: 0 };
    pub const HALF: Duration = Duration { power: 1, dots: 0 };
    pub const QUARTER: Duration = Duration { power: 2, dots: 0 };
    pub const EIGHTH: Duration = Duration { power: 3, dots: 0 };
    pub const SIXTEENTH: Duration = Duration { power: 4, dots: 0 };
    pub const THIRTY_SECOND: Duration = Duration { power: 5, dots: 0 };
    pub const SIXTY_FOURTH: Duration = Duration { power: 6, dots: 0 };

    /// Build a duration from its note-value denominator (1, 2, 4 .. 64).
    ///
    /// Each dot adds the next shorter value, so the dotted tail must
    /// itself be a supported duration: a dotted 64th is rejected.
    pub fn new(denominator: u32, dots: u8) -> Result<Self, EditError> {
        let invalid = EditError::InvalidDuration { denominator, dots };
        if !denominator.is_power_of_two() {
            return Err(invalid);
        }
        let power = denominator.trailing_zeros() as u8;
        if power as u16 + dots as u16 > SHORTEST_POWER as u16 {
            return Err(invalid);
        }
        Ok(Self { power, dots })
    }

    pub fn denominator(&self) -> u32 {
        1 << self.power
    }

    pub fn dots(&self) -> u8 {
        self.dots
    }

    pub fn undotted(&self) -> Self {
        Self { power: self.power, dots: 0 }
    }

    pub fn dotted(&self, dots: u8) -> Result<Self, EditError> {
        Self::new(self.denominator(), dots)
    }

    /// Exact fraction of a whole note, dots included.
    pub fn proportion(&self) -> Proportion {
        let mut term = Proportion::new(1, 1 << self.power);
        let mut total = term;
        for _ in 0..self.dots {
            term /= 2;
            total += term;
        }
        total
    }

    /// The duration worth exactly half of this one, if the next shorter
    /// base value (with the same dots) is still supported.
    pub fn half(&self) -> Option<Self> {
        if self.power + 1 + self.dots > SHORTEST_POWER {
            return None;
        }
        Some(Self { power: self.power + 1, dots: self.dots })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.denominator())?;
        for _ in 0..self.dots {
            f.write_str(".")?;
        }
        Ok(())
    }
}

/// Wire form of a duration; checked against the supported range when read.
#[derive(Serialize, Deserialize)]
struct RawDuration {
    power: u8,
    dots: u8,
}

impl TryFrom<RawDuration> for Duration {
    type Error = EditError;

    fn try_from(raw: RawDuration) -> Result<Self, Self::Error> {
        if raw.power > SHORTEST_POWER {
            return Err(EditError::InvalidDuration {
                denominator: 1u32.checked_shl(raw.power as u32).unwrap_or(0),
                dots: raw.dots,
            });
        }
        Duration::new(1 << raw.power, raw.dots)
    }
}

impl From<Duration> for RawDuration {
    fn from(d: Duration) -> Self {
        RawDuration { power: d.power, dots: d.dots }
    }
}

/// Split `target` into undotted durations by repeatedly halving `from`.
///
/// The largest piece that still fits is taken each time, so the result
/// is the binary expansion of `target` starting at `from`'s base value.
pub fn decompose(target: Proportion, from: Duration) -> Result<Vec<Duration>, EditError> {
    let mut remaining = target;
    let mut current = from.undotted();
    let mut pieces = Vec::new();
    while remaining > Proportion::from_integer(0) {
        while current.proportion() > remaining {
            current = current.half().ok_or_else(|| {
                EditError::UnrepresentableDuration(format!(
                    "{remaining} cannot be filled with durations of 1/64 or longer"
                ))
            })?;
        }
        pieces.push(current);
        remaining -= current.proportion();
    }
    Ok(pieces)
}

/// Rests or notes that fill `target` starting from a whole note.
pub fn fill(target: Proportion) -> Result<Vec<Duration>, EditError> {
    decompose(target, Duration::WHOLE)
}
