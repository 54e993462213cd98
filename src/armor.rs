//! The constraint synthesis engine.
//!
//! [`Z3Armor`] grows a set of constraints that hold for a secret until the solver proves the
//! secret is their only solution, then greedily drops every constraint that is not needed to
//! keep that proof.
//!
//! ```text
//! secret ─► generate ─► complete? ──no──► generate ...
//!                          │yes
//!                          ▼
//!                       reduce ─► complete? ──no──► Error::Incomplete
//!                                    │yes
//!                                    ▼
//!                            constraint set
//! ```

use std::fmt;

use log::{debug, info};
use rand::{rngs::StdRng, Rng};
use z3::SatResult;

use crate::{
    config::ArmorConfig, constraint::Constraint, operator::Operator, oracle::Oracle,
    random::RandomSource, usage::IndexUsage, Error, Result,
};

/// Constraint synthesis engine for one secret.
///
/// The engine owns the secret, the index usage counts, the working constraint set and its
/// random number generator for its whole lifetime.
///
/// # Example
///
/// ```rust,no_run
/// use z3armor::{RandomSource, Z3Armor};
///
/// let mut armor = Z3Armor::new(b"hunter2".to_vec(), RandomSource::Seeded(1));
/// armor.fit()?;
/// for constraint in armor.constraints() {
///     println!("{constraint}");
/// }
/// assert!(armor.verify(b"hunter2"));
/// # Ok::<(), z3armor::Error>(())
/// ```
pub struct Z3Armor {
    secret: Vec<u8>,
    usage: IndexUsage,
    constraints: Vec<Constraint>,
    rng: StdRng,
    config: ArmorConfig,
}

impl Z3Armor {
    /// Creates an engine for `secret` with the default configuration.
    #[must_use]
    pub fn new(secret: Vec<u8>, source: RandomSource) -> Self {
        Self::with_config(secret, source, ArmorConfig::default())
    }

    /// Creates an engine for `secret` with an explicit configuration.
    #[must_use]
    pub fn with_config(secret: Vec<u8>, source: RandomSource, config: ArmorConfig) -> Self {
        Self {
            usage: IndexUsage::new(secret.len()),
            secret,
            constraints: Vec::new(),
            rng: source.rng(),
            config,
        }
    }

    /// Seeds the working set with pre-built constraints.
    ///
    /// Constraints that do not hold for the secret are dropped, so that the working set only
    /// ever contains constraints satisfied by the secret. Usage counts are updated for the
    /// accepted ones.
    #[must_use]
    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        for constraint in constraints {
            if constraint.check(&self.secret) && !self.constraints.contains(&constraint) {
                self.usage.record(&constraint.indexes());
                self.constraints.push(constraint);
            }
        }
        self
    }

    /// Returns the secret.
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Returns the working constraint set, in insertion order.
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the index usage counts.
    #[must_use]
    pub fn usage(&self) -> &IndexUsage {
        &self.usage
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &ArmorConfig {
        &self.config
    }

    /// Checks whether `guess` satisfies every constraint of the working set.
    #[must_use]
    pub fn verify(&self, guess: &[u8]) -> bool {
        guess.len() == self.secret.len() && self.constraints.iter().all(|c| c.check(guess))
    }

    /// Builds a fresh oracle over the current working set.
    #[must_use]
    pub fn oracle(&self) -> Oracle {
        Oracle::new(self.secret.len(), &self.constraints, &self.config)
    }

    /// Generates one new constraint and adds it to the working set.
    ///
    /// A fair coin picks the constraint shape. Comparisons relate two bytes through a random
    /// reversible operator; operations combine two bytes with any operator and record the
    /// result. Candidates that duplicate an existing constraint, and comparisons whose operand
    /// would be zero, are discarded and retried.
    ///
    /// # Errors
    ///
    /// - [`Error::Exhausted`] when [`ArmorConfig::max_attempts`] candidates were discarded.
    /// - [`Error::SampleOutOfRange`] when the secret has fewer than two bytes.
    pub fn generate(&mut self) -> Result<Constraint> {
        for _ in 0..self.config.max_attempts {
            let Some(candidate) = self.candidate()? else {
                continue;
            };
            if self.constraints.contains(&candidate) {
                continue;
            }

            self.usage.record(&candidate.indexes());
            self.constraints.push(candidate);
            info!("Generate new constraint {candidate}");
            return Ok(candidate);
        }

        Err(Error::Exhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// Draws one candidate constraint, `None` for a degenerate comparison.
    fn candidate(&mut self) -> Result<Option<Constraint>> {
        let picked = self.usage.sample(&mut self.rng, 2)?;
        let (x, y) = (picked[0], picked[1]);

        if self.rng.random_bool(0.5) {
            let op = Operator::REVERSIBLE[self.rng.random_range(..Operator::REVERSIBLE.len())];
            let Some(n) = op.reverse(self.secret[y], self.secret[x]) else {
                return Ok(None);
            };
            // A zero operand would state that both bytes are equal under `op`.
            if n == 0 {
                return Ok(None);
            }
            Ok(Some(Constraint::Compare { x, y, op, n }))
        } else {
            let op = Operator::ALL[self.rng.random_range(..Operator::ALL.len())];
            let n = op.apply(self.secret[x], self.secret[y]);
            Ok(Some(Constraint::Operation { x, y, op, n }))
        }
    }

    /// Checks that the secret is the one and only solution of the working set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inconsistent`] if the solver finds a model but the enumeration of all
    /// solutions proves there is none. An `unknown` answer anywhere in the proof makes the set
    /// "not complete" instead.
    pub fn complete(&self) -> Result<bool> {
        let oracle = self.oracle();

        match oracle.check() {
            SatResult::Sat => {}
            result => {
                debug!("Not complete because model solver is {result:?}");
                return Ok(false);
            }
        }

        let Some(guess) = oracle.model().and_then(|model| model.resolved()) else {
            debug!("Not complete because some bytes are missing");
            return Ok(false);
        };
        if guess != self.secret {
            debug!("Not complete because first guess is wrong");
            return Ok(false);
        }

        let mut solutions = oracle.solutions();
        let first = solutions.next();
        let second = if first.is_some() {
            solutions.next()
        } else {
            None
        };
        if solutions.is_interrupted() {
            debug!("Not complete because solver gave up during enumeration");
            return Ok(false);
        }
        if first.is_none() {
            return Err(Error::Inconsistent);
        }
        if second.is_some() {
            debug!("Not complete because other guess exist");
            return Ok(false);
        }

        debug!("Complete");
        Ok(true)
    }

    /// Removes every constraint that is not needed for completeness.
    ///
    /// Runs passes over the working set; each constraint is tentatively removed and put back in
    /// place if the set stops being complete. Stops after a pass that removed nothing. The
    /// result is locally minimal: no single remaining constraint can be dropped.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`complete`](Self::complete).
    pub fn reduce(&mut self) -> Result<()> {
        info!("Start reduction");
        let start_size = self.constraints.len();

        loop {
            let mut removed = false;
            let mut index = 0;
            while index < self.constraints.len() {
                let constraint = self.constraints.remove(index);
                if self.complete()? {
                    debug!("Remove constraint {constraint}");
                    removed = true;
                } else {
                    self.constraints.insert(index, constraint);
                    index += 1;
                }
            }
            if !removed {
                break;
            }
        }

        info!(
            "Reduction result: {} to {}",
            start_size,
            self.constraints.len()
        );
        Ok(())
    }

    /// Generates constraints until the secret is pinned, then reduces the set.
    ///
    /// Running out of new constraints ends generation early without failing; the outcome is
    /// decided by the completeness check after reduction.
    ///
    /// # Errors
    ///
    /// - [`Error::Incomplete`] if the reduced set does not pin the secret.
    /// - [`Error::SampleOutOfRange`] for a one-byte secret.
    /// - Any error from [`complete`](Self::complete).
    pub fn fit(&mut self) -> Result<()> {
        while !self.complete()? {
            match self.generate() {
                Ok(_) => {}
                Err(Error::Exhausted { attempts }) => {
                    info!("No more constraints after {attempts} attempts");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        self.reduce()?;
        if !self.complete()? {
            return Err(Error::Incomplete {
                constraints: self.constraints.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Z3Armor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Z3Armor constraints={} size={}>",
            self.constraints.len(),
            self.secret.len()
        )
    }
}

impl fmt::Debug for Z3Armor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Z3Armor")
            .field("size", &self.secret.len())
            .field("constraints", &self.constraints)
            .field("usage", &self.usage)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Z3Armor;
    use crate::{
        config::ArmorConfig, constraint::Constraint, operator::Operator, random::RandomSource,
        Error,
    };

    #[test]
    fn test_generate_holds_for_secret() {
        let mut armor = Z3Armor::new(b"secret".to_vec(), RandomSource::Seeded(3));
        for _ in 0..20 {
            let constraint = armor.generate().unwrap();
            assert!(constraint.check(b"secret"), "{constraint}");
            assert!(!matches!(constraint, Constraint::Constant { .. }));
        }
        assert_eq!(armor.constraints().len(), 20);
    }

    #[test]
    fn test_generate_updates_usage() {
        let mut armor = Z3Armor::new(b"abcd".to_vec(), RandomSource::Seeded(5));
        for _ in 0..6 {
            armor.generate().unwrap();
        }
        let total: usize = armor.usage().counts().iter().sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn test_generate_never_duplicates() {
        let mut armor = Z3Armor::new(b"xyz".to_vec(), RandomSource::Seeded(11));
        for _ in 0..30 {
            armor.generate().unwrap();
        }
        let constraints = armor.constraints();
        for (i, a) in constraints.iter().enumerate() {
            assert!(!constraints[i + 1..].contains(a), "{a} duplicated");
        }
    }

    #[test]
    fn test_generate_comparison_operand_never_zero() {
        let mut armor = Z3Armor::new(b"aaaa".to_vec(), RandomSource::Seeded(2));
        for _ in 0..10 {
            if let Constraint::Compare { n, .. } = armor.generate().unwrap() {
                assert_ne!(n, 0);
            }
        }
    }

    #[test]
    fn test_generate_exhausts() {
        // Two equal bytes: comparisons are always degenerate, and only a handful of
        // operations exist, so generation eventually runs dry.
        let config = ArmorConfig::default().with_max_attempts(200);
        let mut armor = Z3Armor::with_config(b"AA".to_vec(), RandomSource::Seeded(0), config);
        let mut generated = 0;
        let error = loop {
            match armor.generate() {
                Ok(_) => generated += 1,
                Err(e) => break e,
            }
            assert!(generated <= 14, "more constraints than distinct operations");
        };
        assert!(matches!(error, Error::Exhausted { attempts: 200 }));
    }

    #[test]
    fn test_generate_single_byte_fails() {
        let mut armor = Z3Armor::new(vec![0], RandomSource::Seeded(0));
        assert!(matches!(
            armor.generate(),
            Err(Error::SampleOutOfRange {
                requested: 2,
                available: 1
            })
        ));
    }

    #[test]
    fn test_complete_empty_set_is_incomplete() {
        let armor = Z3Armor::new(b"AB".to_vec(), RandomSource::Seeded(0));
        assert!(!armor.complete().unwrap());
    }

    #[test]
    fn test_complete_pinned_set() {
        let armor = Z3Armor::new(b"AB".to_vec(), RandomSource::Seeded(0)).with_constraints([
            Constraint::Constant {
                x: 0,
                k: b'A',
                op: Operator::Add,
                n: 0,
            },
            Constraint::Compare {
                x: 1,
                y: 0,
                op: Operator::Add,
                n: 1,
            },
        ]);
        assert!(armor.complete().unwrap());
    }

    #[test]
    fn test_complete_two_solutions_is_incomplete() {
        // secret[0] in {0x40, 0x41}, secret[1] follows secret[0]
        let armor = Z3Armor::new(b"AB".to_vec(), RandomSource::Seeded(0)).with_constraints([
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
        ]);
        assert!(!armor.complete().unwrap());
    }

    #[test]
    fn test_complete_under_tight_timeout_never_fails() {
        // Negating every byte keeps every product, so the set has a second solution whether
        // or not the solver runs out of time while looking for it.
        let secret = b"armor-timeout-16".to_vec();
        let products: Vec<Constraint> = (0..secret.len() - 1)
            .map(|x| Constraint::Operation {
                x,
                y: x + 1,
                op: Operator::Mul,
                n: secret[x].wrapping_mul(secret[x + 1]),
            })
            .collect();
        let config = ArmorConfig::default().with_solver_timeout(Duration::from_millis(1));
        let armor = Z3Armor::with_config(secret, RandomSource::Seeded(0), config)
            .with_constraints(products);

        assert_eq!(armor.constraints().len(), 15);
        assert!(!armor.complete().unwrap());
    }

    #[test]
    fn test_with_constraints_drops_false_ones() {
        let armor = Z3Armor::new(b"AB".to_vec(), RandomSource::Seeded(0)).with_constraints([
            Constraint::Operation {
                x: 0,
                y: 1,
                op: Operator::Xor,
                n: 0,
            },
            Constraint::Operation {
                x: 0,
                y: 1,
                op: Operator::Xor,
                n: 3,
            },
        ]);
        assert_eq!(armor.constraints().len(), 1);
        assert_eq!(armor.usage().counts(), &[1, 1]);
    }

    #[test]
    fn test_empty_secret_is_trivially_complete() {
        let mut armor = Z3Armor::new(Vec::new(), RandomSource::Seeded(0));
        assert!(armor.complete().unwrap());
        armor.fit().unwrap();
        assert!(armor.constraints().is_empty());
    }

    #[test]
    fn test_display_hides_secret() {
        let armor = Z3Armor::new(b"topsecret".to_vec(), RandomSource::Seeded(0));
        let shown = armor.to_string();
        assert_eq!(shown, "<Z3Armor constraints=0 size=9>");
        assert!(!format!("{armor:?}").contains("topsecret"));
    }
}
