// Copyright 2025 Dashstrom
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # z3armor
//!
//! Synthesizes a small set of arithmetic constraints over the bytes of a secret such that the
//! secret is the *only* byte sequence satisfying all of them, without the secret appearing
//! anywhere in the constraints. The constraint set can then be rendered into a verifier program
//! ("does this guess satisfy every constraint?").
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use z3armor::prelude::*;
//!
//! let mut armor = Z3Armor::new(b"hunter2".to_vec(), RandomSource::Seeded(42));
//! armor.fit()?;
//!
//! let program = Renderer::new().render(Template::CrackmeC, &armor)?;
//! println!("{program}");
//! # Ok::<(), z3armor::Error>(())
//! ```
//!
//! ## How it works
//!
//! 1. **Generation** - [`Z3Armor::generate`] proposes constraints that hold for the secret,
//!    preferring the least used byte positions ([`usage`]).
//! 2. **Completeness** - [`Z3Armor::complete`] asks Z3 ([`oracle`]) whether the secret is the
//!    unique solution, by enumerating every satisfying assignment until a second one shows up.
//! 3. **Reduction** - [`Z3Armor::reduce`] drops each constraint whose removal keeps the set
//!    complete.
//!
//! [`Z3Armor::fit`] chains the three steps and fails with [`Error::Incomplete`] when the secret
//! cannot be pinned.
//!
//! ## Architecture
//!
//! - [`operator`] - Byte operators and their inverses
//! - [`constraint`] - The three constraint shapes
//! - [`usage`] - Index usage tracking and weighted sampling
//! - [`oracle`] - Z3 solver handle and all-solutions enumeration
//! - [`render`] - Template rendering of constraint sets
//! - [`Error`] and [`Result`] - Error handling
//!
//! The solver never runs concurrently and every check is blocking. Use
//! [`ArmorConfig::with_solver_timeout`] to bound the time spent in a single check.

mod armor;
mod config;
mod error;
mod random;

/// Convenient re-exports of the most commonly used types.
pub mod prelude;

/// Binary byte operators and their symbolic counterparts.
pub mod operator;

/// Constraint shapes with symbolic, concrete and textual forms.
pub mod constraint;

/// Index usage counts and weighted sampling.
pub mod usage;

/// Z3-backed satisfiability oracle and solution enumeration.
pub mod oracle;

/// Template rendering of fitted constraint sets.
pub mod render;

pub use armor::Z3Armor;
pub use config::ArmorConfig;
pub use error::Error;
pub use random::RandomSource;
pub use render::{Renderer, Template};

/// `z3armor` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
