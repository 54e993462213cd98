use thiserror::Error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The variants fall into two groups. [`Error::Exhausted`] is an expected, recoverable outcome
/// of constraint generation: the orchestrator treats it as the signal to stop generating. Every
/// other variant is fatal for the current run and is propagated unchanged to the caller.
///
/// # Error Categories
///
/// ## Engine Errors
/// - [`Error::Exhausted`] - No new constraint could be produced within the retry budget
/// - [`Error::SampleOutOfRange`] - More distinct indexes requested than the secret has
/// - [`Error::Incomplete`] - The reduced constraint set no longer pins the secret
/// - [`Error::Inconsistent`] - The solver reported a model but enumeration found none
/// - [`Error::Weights`] - A weighted index draw could not be constructed
///
/// ## Rendering Errors
/// - [`Error::UnknownTemplate`] - Template name outside the built-in set
/// - [`Error::Render`] - Template compilation or rendering failed
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// # Examples
///
/// ```rust,no_run
/// use z3armor::{Error, RandomSource, Z3Armor};
///
/// let mut armor = Z3Armor::new(b"secret".to_vec(), RandomSource::Seeded(7));
/// match armor.fit() {
///     Ok(()) => println!("{} constraints", armor.constraints().len()),
///     Err(Error::Incomplete { constraints }) => {
///         eprintln!("secret not pinned by {constraints} constraints");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// No more constraints can be generated.
    ///
    /// Every attempt within the configured budget produced either a degenerate comparison or a
    /// constraint already present in the working set. Callers driving generation in a loop treat
    /// this as a normal termination condition.
    #[error("No more constraint can be generated after {attempts} attempts")]
    Exhausted {
        /// The retry budget that was used up
        attempts: usize,
    },

    /// Requested more distinct indexes than the tracker holds.
    ///
    /// This indicates a caller defect, or a secret too short for two-index constraints
    /// (a single byte).
    #[error("Not enough indexes - requested {requested}, available {available}")]
    SampleOutOfRange {
        /// Number of distinct indexes requested
        requested: usize,
        /// Number of indexes known to the tracker
        available: usize,
    },

    /// The constraint set does not have the secret as its unique solution after reduction.
    #[error("Model is not complete after reduction ({constraints} constraints)")]
    Incomplete {
        /// Size of the constraint set at the time of the failure
        constraints: usize,
    },

    /// The solver answered `sat` but the enumeration yielded no solution.
    ///
    /// Signals a contract violation between the oracle and the completeness checker.
    #[error("Solver reported a model but enumeration found no solution")]
    Inconsistent,

    /// Weighted sampling could not build its distribution.
    #[error("{0}")]
    Weights(#[from] rand::distr::weighted::Error),

    /// The requested built-in template does not exist.
    #[error("Unknown template - {0}")]
    UnknownTemplate(String),

    /// Template compilation or rendering failed.
    #[error("{0}")]
    Render(#[from] minijinja::Error),

    /// File I/O error.
    ///
    /// Wraps standard I/O errors raised while loading external templates.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
