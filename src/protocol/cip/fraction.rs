//! Exact rational accumulator
//!
//! Rates such as 44100 samples per second at 8000 cycles per second do not
//! divide evenly, so the per-cycle carry is kept as `integer + numerator /
//! denominator` instead of a float that would drift over long streams.

/// Mixed number `integer + numerator / denominator`
///
/// After every operation `0 <= numerator < denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    integer: i64,
    numerator: i64,
    denominator: i64,
}

impl Fraction {
    /// Normalise `numerator / denominator` into a mixed number
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is not positive.
    #[must_use]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        assert!(denominator > 0, "fraction denominator must be positive");
        Self {
            integer: numerator.div_euclid(denominator),
            numerator: numerator.rem_euclid(denominator),
            denominator,
        }
    }

    /// Whole part
    #[must_use]
    pub fn integer(&self) -> i64 {
        self.integer
    }

    /// Numerator of the proper fractional part
    #[must_use]
    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    /// Denominator
    #[must_use]
    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// Sum of two fractions sharing a denominator, carrying into the whole part
    #[must_use]
    pub fn add(&self, other: &Fraction) -> Fraction {
        debug_assert_eq!(self.denominator, other.denominator);
        let sum = self.numerator + other.numerator;
        Fraction {
            integer: self.integer + other.integer + sum / self.denominator,
            numerator: sum % self.denominator,
            denominator: self.denominator,
        }
    }

    /// Accumulate `other` in place
    pub fn add_assign(&mut self, other: &Fraction) {
        *self = self.add(other);
    }

    /// Remove a whole number of units
    #[must_use]
    pub fn sub_integer(&self, n: i64) -> Fraction {
        Fraction {
            integer: self.integer - n,
            ..*self
        }
    }

    /// Largest integer not above the value
    #[must_use]
    pub fn floor(&self) -> i64 {
        self.integer
    }

    /// Smallest integer not below the value
    #[must_use]
    pub fn ceil(&self) -> i64 {
        self.integer + i64::from(self.numerator > 0)
    }

    /// Keep only the whole part modulo `modulus`, carrying the quotient out
    pub(crate) fn wrap_integer(&mut self, modulus: i64) -> i64 {
        let carry = self.integer / modulus;
        self.integer %= modulus;
        carry
    }
}
