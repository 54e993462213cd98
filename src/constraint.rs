//! Constraints over the bytes of a secret.
//!
//! A [`Constraint`] is one of three closed shapes. Each exposes the same three forms through
//! plain methods on the enum:
//!
//! - [`Constraint::symbolic`] - the boolean predicate over the solver's byte terms
//! - [`Constraint::check`] - the same predicate evaluated over concrete bytes
//! - [`std::fmt::Display`] - the stable textual form handed to renderers
//!
//! ```text
//! Compare    secret[0] == (secret[1] ^ 47)
//! Constant   6 == (secret[0] ^ 47)
//! Operation  (secret[0] ^ secret[1]) == 4
//! ```

use std::fmt;

use z3::ast::{Ast, Bool, BV};

use crate::operator::Operator;

/// A predicate over secret-byte positions.
///
/// Constraints compare by structural equality; the generator relies on it to avoid emitting
/// the same constraint twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// `secret[x] == op(secret[y], n)`.
    Compare {
        /// Index constrained by the comparison.
        x: usize,
        /// Index the comparison is relative to.
        y: usize,
        /// Reversible operator linking the two bytes.
        op: Operator,
        /// Operand applied to `secret[y]`.
        n: u8,
    },

    /// `op(secret[x], n) == k`.
    ///
    /// Never produced by the generator. Kept so that callers can pin a byte against a constant
    /// when they build constraint sets themselves.
    Constant {
        /// Index of the constrained byte.
        x: usize,
        /// Expected result.
        k: u8,
        /// Operator applied to the byte.
        op: Operator,
        /// Operand applied to `secret[x]`.
        n: u8,
    },

    /// `op(secret[x], secret[y]) == n`.
    Operation {
        /// Left byte index.
        x: usize,
        /// Right byte index.
        y: usize,
        /// Operator combining the two bytes.
        op: Operator,
        /// Expected result.
        n: u8,
    },
}

impl Constraint {
    /// Returns the byte indexes this constraint reads, in `x`, `y` order.
    #[must_use]
    pub fn indexes(&self) -> Vec<usize> {
        match *self {
            Self::Compare { x, y, .. } | Self::Operation { x, y, .. } => vec![x, y],
            Self::Constant { x, .. } => vec![x],
        }
    }

    /// Returns the operator used by this constraint.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        match *self {
            Self::Compare { op, .. } | Self::Constant { op, .. } | Self::Operation { op, .. } => op,
        }
    }

    /// Builds the symbolic predicate over one 8-bit term per secret byte.
    ///
    /// # Arguments
    ///
    /// * `terms` - The solver terms, indexed like the secret.
    ///
    /// # Panics
    ///
    /// Panics if an index of the constraint is out of bounds for `terms`.
    #[must_use]
    pub fn symbolic(&self, terms: &[BV]) -> Bool {
        match *self {
            Self::Compare { x, y, op, n } => {
                let rhs = op.symbolic(&terms[y], &byte(n));
                terms[x].eq(&rhs)
            }
            Self::Constant { x, k, op, n } => op.symbolic(&terms[x], &byte(n)).eq(&byte(k)),
            Self::Operation { x, y, op, n } => op.symbolic(&terms[x], &terms[y]).eq(&byte(n)),
        }
    }

    /// Evaluates the predicate over concrete bytes.
    ///
    /// Returns `false` when an index falls outside `secret`.
    #[must_use]
    pub fn check(&self, secret: &[u8]) -> bool {
        let at = |i: usize| secret.get(i).copied();
        match *self {
            Self::Compare { x, y, op, n } => match (at(x), at(y)) {
                (Some(a), Some(b)) => a == op.apply(b, n),
                _ => false,
            },
            Self::Constant { x, k, op, n } => at(x).is_some_and(|a| op.apply(a, n) == k),
            Self::Operation { x, y, op, n } => match (at(x), at(y)) {
                (Some(a), Some(b)) => op.apply(a, b) == n,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { x, y, op, n } => write!(f, "secret[{x}] == (secret[{y}] {op} {n})"),
            Self::Constant { x, k, op, n } => write!(f, "{k} == (secret[{x}] {op} {n})"),
            Self::Operation { x, y, op, n } => write!(f, "(secret[{x}] {op} secret[{y}]) == {n}"),
        }
    }
}

/// Lifts a concrete byte to an 8-bit bit-vector numeral.
pub(crate) fn byte(value: u8) -> BV {
    BV::from_u64(u64::from(value), 8)
}
