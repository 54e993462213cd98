//! Binary byte operators used to build constraints.
//!
//! Every [`Operator`] has a concrete form over `u8` values and a symbolic form over 8-bit Z3
//! bit-vectors. Both forms agree on every input: arithmetic wraps modulo 256, and `%` with a
//! zero divisor yields the dividend, which is how SMT-LIB defines `bvurem`.
//!
//! A subset of the catalog is *reversible*: for those operators [`Operator::reverse`] returns,
//! for any two bytes `a` and `b`, the operand `n` such that `op(a, n) == b`. This is what allows
//! the generator to relate two secret bytes through an exact equality.

use strum::Display;
use z3::ast::BV;

/// A binary operator over byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Operator {
    /// Wrapping addition.
    #[strum(serialize = "+")]
    Add,
    /// Wrapping subtraction.
    #[strum(serialize = "-")]
    Sub,
    /// Bitwise XOR.
    #[strum(serialize = "^")]
    Xor,
    /// Bitwise OR.
    #[strum(serialize = "|")]
    Or,
    /// Bitwise AND.
    #[strum(serialize = "&")]
    And,
    /// Unsigned remainder, `a % 0 == a`.
    #[strum(serialize = "%")]
    Mod,
    /// Wrapping multiplication.
    #[strum(serialize = "*")]
    Mul,
}

impl Operator {
    /// The full operator catalog.
    pub const ALL: [Self; 7] = [
        Self::Add,
        Self::Sub,
        Self::Xor,
        Self::Or,
        Self::And,
        Self::Mod,
        Self::Mul,
    ];

    /// Operators carrying an inverse, see [`Operator::reverse`].
    pub const REVERSIBLE: [Self; 3] = [Self::Add, Self::Sub, Self::Xor];

    /// Checks whether this operator has an inverse.
    #[must_use]
    pub const fn is_reversible(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Xor)
    }

    /// Applies the operator to two concrete bytes.
    ///
    /// # Arguments
    ///
    /// * `a` - The left operand.
    /// * `b` - The right operand.
    ///
    /// # Returns
    ///
    /// `a <op> b` reduced modulo 256.
    #[must_use]
    pub const fn apply(self, a: u8, b: u8) -> u8 {
        match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::Xor => a ^ b,
            Self::Or => a | b,
            Self::And => a & b,
            Self::Mod => {
                if b == 0 {
                    a
                } else {
                    a % b
                }
            }
            Self::Mul => a.wrapping_mul(b),
        }
    }

    /// Computes the right operand that maps `a` onto `b`.
    ///
    /// For a reversible operator the result `n` satisfies `self.apply(a, n) == b` for every
    /// pair of bytes.
    ///
    /// # Returns
    ///
    /// `Some(n)` for reversible operators, `None` otherwise.
    #[must_use]
    pub const fn reverse(self, a: u8, b: u8) -> Option<u8> {
        match self {
            Self::Add => Some(b.wrapping_sub(a)),
            Self::Sub => Some(a.wrapping_sub(b)),
            Self::Xor => Some(a ^ b),
            Self::Or | Self::And | Self::Mod | Self::Mul => None,
        }
    }

    /// Builds the symbolic application of the operator over two 8-bit bit-vectors.
    #[must_use]
    pub fn symbolic(self, a: &BV, b: &BV) -> BV {
        match self {
            Self::Add => a.bvadd(b),
            Self::Sub => a.bvsub(b),
            Self::Xor => a.bvxor(b),
            Self::Or => a.bvor(b),
            Self::And => a.bvand(b),
            Self::Mod => a.bvurem(b),
            Self::Mul => a.bvmul(b),
        }
    }
}
