//! Z3-backed satisfiability oracle over the bytes of a secret.
//!
//! An [`Oracle`] owns one Z3 solver and one 8-bit bit-vector term per secret byte, with every
//! constraint of the working set asserted. It answers satisfiability queries, extracts models
//! and exposes the solver's assertion stack through [`Oracle::push`] and [`Oracle::pop`].
//!
//! # All-solutions enumeration
//!
//! [`Oracle::solutions`] lazily walks every satisfying assignment exactly once. Each found model
//! `M` over the suffix of terms starting at `s` splits the rest of its region into disjoint
//! branches, one per position `i >= s`:
//!
//! ```text
//! terms[s..i] == M[s..i]  &&  terms[i] != M[i]
//! ```
//!
//! Branches are explored depth-first with an explicit stack of frames, one solver scope per
//! open branch, so the search depth is bounded by memory rather than by the call stack.

use std::collections::HashSet;

use z3::{
    ast::{Ast, Bool, BV},
    Model, Params, SatResult, Solver,
};

use crate::{
    config::ArmorConfig,
    constraint::{byte, Constraint},
};

/// Solver handle over one symbolic byte per secret position.
///
/// The solver is released when the oracle is dropped. Oracles are cheap to build and are meant
/// to be created for a single completeness check or enumeration.
pub struct Oracle {
    solver: Solver,
    terms: Vec<BV>,
    /// Number of checks answered by the solver before every later one reports `Unknown`.
    #[cfg(test)]
    unknown_after: std::cell::Cell<Option<usize>>,
}

impl Oracle {
    /// Creates an oracle with `size` fresh byte terms and every constraint asserted.
    ///
    /// # Arguments
    ///
    /// * `size` - Number of secret bytes.
    /// * `constraints` - The constraints to assert.
    /// * `config` - Engine configuration, for the solver time budget.
    ///
    /// # Panics
    ///
    /// Panics if a constraint references an index `>= size`.
    #[must_use]
    pub fn new(size: usize, constraints: &[Constraint], config: &ArmorConfig) -> Self {
        let solver = Solver::new();
        if let Some(timeout) = config.solver_timeout_ms() {
            let mut params = Params::new();
            params.set_u32("timeout", timeout);
            solver.set_params(&params);
        }

        let terms: Vec<BV> = (0..size)
            .map(|i| BV::new_const(format!("p[{i}]"), 8))
            .collect();
        for constraint in constraints {
            solver.assert(&constraint.symbolic(&terms));
        }

        Self {
            solver,
            terms,
            #[cfg(test)]
            unknown_after: std::cell::Cell::new(None),
        }
    }

    /// Returns the symbolic byte terms, indexed like the secret.
    #[must_use]
    pub fn terms(&self) -> &[BV] {
        &self.terms
    }

    /// Returns the number of byte terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the oracle has no byte terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Asserts an extra predicate in the current scope.
    pub fn assert(&self, predicate: &Bool) {
        self.solver.assert(predicate);
    }

    /// Checks the satisfiability of everything asserted so far.
    #[must_use]
    pub fn check(&self) -> SatResult {
        #[cfg(test)]
        if let Some(left) = self.unknown_after.get() {
            if left == 0 {
                return SatResult::Unknown;
            }
            self.unknown_after.set(Some(left - 1));
        }
        self.solver.check()
    }

    /// Extracts the model of the last satisfiable [`check`](Self::check).
    ///
    /// # Returns
    ///
    /// `None` if the solver has no model to offer.
    #[must_use]
    pub fn model(&self) -> Option<Assignment> {
        let model = self.solver.get_model()?;
        let values = self
            .terms
            .iter()
            .map(|term| eval_byte(&model, term, false))
            .collect();
        // Model completion always produces a numeral for a declared constant.
        let completed = self
            .terms
            .iter()
            .map(|term| eval_byte(&model, term, true).unwrap_or_default())
            .collect();
        Some(Assignment { values, completed })
    }

    /// Opens a new assertion scope.
    pub fn push(&self) {
        self.solver.push();
    }

    /// Closes the innermost assertion scope, discarding what was asserted in it.
    pub fn pop(&self) {
        self.solver.pop(1);
    }

    /// Lazily enumerates every byte sequence satisfying the asserted constraints.
    ///
    /// The enumeration opens and closes scopes on this oracle; every scope it opened is closed
    /// again when the returned iterator is exhausted or dropped. It stops at the first check the
    /// solver cannot decide, see [`Solutions::is_interrupted`].
    #[must_use]
    pub fn solutions(&self) -> Solutions<'_> {
        Solutions {
            oracle: self,
            stack: Vec::new(),
            seen: HashSet::new(),
            started: false,
            interrupted: false,
        }
    }
}

/// Concrete values extracted from a solver model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<Option<u8>>,
    completed: Vec<u8>,
}

impl Assignment {
    /// Returns the value the model gives to term `index`, `None` if the term is unconstrained.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u8> {
        self.values.get(index).copied().flatten()
    }

    /// Returns the full byte sequence, or `None` if any term is unresolved.
    #[must_use]
    pub fn resolved(&self) -> Option<Vec<u8>> {
        self.values.iter().copied().collect()
    }

    /// Returns `true` if every term has a concrete value.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }
}

fn eval_byte(model: &Model, term: &BV, completion: bool) -> Option<u8> {
    model
        .eval(term, completion)
        .and_then(|value| value.as_u64())
        .and_then(|value| u8::try_from(value).ok())
}

struct Frame {
    /// First term of the suffix this frame branches over.
    start: usize,
    /// Model values used to pin and exclude terms in child branches.
    pins: Vec<u8>,
    /// Offset from `start` of the next branch to explore.
    next: usize,
}

/// Iterator over all satisfying byte sequences of an [`Oracle`].
///
/// Created by [`Oracle::solutions`]. Yields each distinct sequence once, in no particular order.
pub struct Solutions<'a> {
    oracle: &'a Oracle,
    stack: Vec<Frame>,
    seen: HashSet<Vec<u8>>,
    started: bool,
    interrupted: bool,
}

impl Solutions<'_> {
    /// Returns `true` if a check answered `unknown` and the enumeration stopped early.
    ///
    /// The sequences yielded so far are genuine solutions, but the unexplored part of the
    /// search space may hold more.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Checks the current scope and, when satisfiable, records a frame for its model.
    ///
    /// A nested visit owns the scope its parent opened: if the scope has no model it is closed
    /// here, otherwise it stays open until the new frame is exhausted.
    fn visit(&mut self, start: usize) -> Option<Vec<u8>> {
        let nested = !self.stack.is_empty();
        let assignment = match self.oracle.check() {
            SatResult::Sat => self.oracle.model(),
            SatResult::Unsat => None,
            SatResult::Unknown => {
                self.interrupted = true;
                None
            }
        };
        let Some(assignment) = assignment else {
            if nested {
                self.oracle.pop();
            }
            return None;
        };

        let solution = assignment.resolved();
        self.stack.push(Frame {
            start,
            pins: assignment.completed,
            next: 0,
        });

        let solution = solution?;
        if self.seen.insert(solution.clone()) {
            Some(solution)
        } else {
            None
        }
    }
}

impl Iterator for Solutions<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if let Some(solution) = self.visit(0) {
                return Some(solution);
            }
        }

        let oracle = self.oracle;
        let size = oracle.len();
        loop {
            if self.interrupted {
                return None;
            }
            let frame = self.stack.last_mut()?;
            let index = frame.start + frame.next;
            if index >= size {
                self.stack.pop();
                if !self.stack.is_empty() {
                    oracle.pop();
                }
                continue;
            }
            frame.next += 1;

            let terms = oracle.terms();
            oracle.push();
            oracle.assert(&terms[index].eq(&byte(frame.pins[index])).not());
            for pinned in frame.start..index {
                oracle.assert(&terms[pinned].eq(&byte(frame.pins[pinned])));
            }

            if let Some(solution) = self.visit(index) {
                return Some(solution);
            }
        }
    }
}

impl Drop for Solutions<'_> {
    fn drop(&mut self) {
        // The root frame runs in the caller's scope, every other frame owns one.
        for _ in 1..self.stack.len() {
            self.oracle.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use z3::SatResult;

    use super::Oracle;
    use crate::{config::ArmorConfig, constraint::Constraint, operator::Operator};

    fn two_solutions() -> Vec<Constraint> {
        vec![
            // secret[0] in {0, 1}
            Constraint::Constant {
                x: 0,
                k: 0,
                op: Operator::And,
                n: 0xFE,
            },
            // secret[1] == secret[0] + 1
            Constraint::Compare {
                x: 1,
                y: 0,
                op: Operator::Add,
                n: 1,
            },
        ]
    }

    #[test]
    fn test_enumerates_every_solution_once() {
        let oracle = Oracle::new(2, &two_solutions(), &ArmorConfig::default());
        let found: Vec<Vec<u8>> = oracle.solutions().collect();
        assert_eq!(found.len(), 2);
        let found: HashSet<Vec<u8>> = found.into_iter().collect();
        let expected: HashSet<Vec<u8>> = [vec![0, 1], vec![1, 2]].into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_enumerates_wider_space() {
        // secret[0] & 0xF0 == 0x40 and secret[1] == secret[0] ^ 0x20: 16 solutions
        let constraints = vec![
            Constraint::Constant {
                x: 0,
                k: 0x40,
                op: Operator::And,
                n: 0xF0,
            },
            Constraint::Compare {
                x: 1,
                y: 0,
                op: Operator::Xor,
                n: 0x20,
            },
        ];
        let oracle = Oracle::new(2, &constraints, &ArmorConfig::default());
        let found: HashSet<Vec<u8>> = oracle.solutions().collect();
        assert_eq!(found.len(), 16);
        for solution in &found {
            assert!(constraints.iter().all(|c| c.check(solution)));
        }
    }

    #[test]
    fn test_enumerates_three_terms_like_brute_force() {
        // secret[0] in {0x40, 0x41}, secret[1] == secret[0] + 1, secret[2] in {0x60, 0x61}:
        // solutions differ in the first and in the last term, so branches nest past the root.
        let constraints = vec![
            Constraint::Constant {
                x: 0,
                k: 0x40,
                op: Operator::And,
                n: 0xFE,
            },
            Constraint::Compare {
                x: 1,
                y: 0,
                op: Operator::Add,
                n: 1,
            },
            Constraint::Constant {
                x: 2,
                k: 0x60,
                op: Operator::And,
                n: 0xFE,
            },
        ];
        let oracle = Oracle::new(3, &constraints, &ArmorConfig::default());
        let found: Vec<Vec<u8>> = oracle.solutions().collect();

        let mut expected = HashSet::new();
        for value in 0..1u32 << 24 {
            let candidate = [value as u8, (value >> 8) as u8, (value >> 16) as u8];
            if constraints.iter().all(|c| c.check(&candidate)) {
                expected.insert(candidate.to_vec());
            }
        }

        assert_eq!(expected.len(), 4);
        assert_eq!(found.len(), expected.len(), "duplicated solutions in {found:?}");
        assert_eq!(found.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn test_unknown_first_check_interrupts() {
        let oracle = Oracle::new(2, &two_solutions(), &ArmorConfig::default());
        oracle.unknown_after.set(Some(0));

        let mut solutions = oracle.solutions();
        assert_eq!(solutions.next(), None);
        assert!(solutions.is_interrupted());
    }

    #[test]
    fn test_unknown_branch_check_interrupts() {
        let oracle = Oracle::new(2, &two_solutions(), &ArmorConfig::default());
        oracle.unknown_after.set(Some(1));

        let mut solutions = oracle.solutions();
        assert!(solutions.next().is_some());
        assert!(!solutions.is_interrupted());
        assert_eq!(solutions.next(), None);
        assert!(solutions.is_interrupted());
        assert_eq!(solutions.next(), None);
        drop(solutions);

        // Every scope opened by the interrupted enumeration is closed again.
        oracle.unknown_after.set(None);
        let mut solutions = oracle.solutions();
        assert_eq!(solutions.by_ref().count(), 2);
        assert!(!solutions.is_interrupted());
    }

    #[test]
    fn test_unsat_yields_nothing() {
        let constraints = vec![
            Constraint::Constant {
                x: 0,
                k: 1,
                op: Operator::Add,
                n: 0,
            },
            Constraint::Constant {
                x: 0,
                k: 2,
                op: Operator::Add,
                n: 0,
            },
        ];
        let oracle = Oracle::new(1, &constraints, &ArmorConfig::default());
        assert!(matches!(oracle.check(), SatResult::Unsat));
        let mut solutions = oracle.solutions();
        assert_eq!(solutions.by_ref().count(), 0);
        assert!(!solutions.is_interrupted());
    }

    #[test]
    fn test_unconstrained_term_is_unresolved() {
        let constraints = vec![Constraint::Constant {
            x: 0,
            k: 7,
            op: Operator::Xor,
            n: 0,
        }];
        let oracle = Oracle::new(2, &constraints, &ArmorConfig::default());
        assert!(matches!(oracle.check(), SatResult::Sat));
        let model = oracle.model().unwrap();
        assert_eq!(model.get(0), Some(7));
        assert_eq!(model.get(1), None);
        assert!(!model.is_resolved());
        assert_eq!(model.resolved(), None);
    }

    #[test]
    fn test_push_pop_restores_scope() {
        let oracle = Oracle::new(2, &two_solutions(), &ArmorConfig::default());
        oracle.push();
        oracle.assert(&oracle.terms()[0].bvugt(&oracle.terms()[1]));
        assert!(matches!(oracle.check(), SatResult::Unsat));
        oracle.pop();
        assert!(matches!(oracle.check(), SatResult::Sat));
    }

    #[test]
    fn test_dropped_enumeration_closes_scopes() {
        let oracle = Oracle::new(2, &two_solutions(), &ArmorConfig::default());
        {
            let mut solutions = oracle.solutions();
            assert!(solutions.next().is_some());
            assert!(solutions.next().is_some());
        }
        assert_eq!(oracle.solutions().count(), 2);
    }

    #[test]
    fn test_empty_oracle_has_single_empty_solution() {
        let oracle = Oracle::new(0, &[], &ArmorConfig::default());
        let found: Vec<Vec<u8>> = oracle.solutions().collect();
        assert_eq!(found, vec![Vec::<u8>::new()]);
    }
}
