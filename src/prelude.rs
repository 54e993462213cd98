//! # z3armor Prelude
//!
//! This module provides a convenient prelude for the most commonly used types of the library.
//! Import it to get the engine, its configuration and the renderer in one line.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all z3armor operations
pub use crate::Error;

/// The result type used throughout z3armor
pub use crate::Result;

// ================================================================================================
// Engine
// ================================================================================================

/// The constraint synthesis engine
pub use crate::Z3Armor;

/// Engine tunables
pub use crate::ArmorConfig;

/// Seeded or OS-backed randomness
pub use crate::RandomSource;

/// Constraint shapes and operators
pub use crate::{constraint::Constraint, operator::Operator};

// ================================================================================================
// Rendering
// ================================================================================================

/// Template renderer and built-in templates
pub use crate::render::{Renderer, Template};
