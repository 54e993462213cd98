//! Rendering of constraint sets through Jinja-style templates.
//!
//! A [`Renderer`] turns a fitted [`Z3Armor`] into a text artifact, either from one of the
//! built-in [`Template`]s or from an external template file. Templates see three variables:
//!
//! - `secret` - the secret bytes, as a list of integers
//! - `constraints` - the working set, each entry exposing `kind` (`compare`, `constant` or
//!   `operation`), `text`, `x`, `y`, `k`, `op` and `n`
//! - `size` - the secret length
//!
//! Besides the template engine's own filters and tests, only the helpers registered here are
//! callable: `hex(n)` and `chr(n)`.

use std::{fs, path::Path, str::FromStr};

use minijinja::{context, Environment, UndefinedBehavior};
use serde::Serialize;
use strum::{Display, EnumString, VariantNames};

use crate::{armor::Z3Armor, constraint::Constraint, Error, Result};

/// Built-in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, VariantNames)]
pub enum Template {
    /// C program checking a password read from stdin.
    #[strum(serialize = "crackme.c")]
    CrackmeC,
    /// Python script recovering the secret with z3.
    #[strum(serialize = "solver.py")]
    SolverPy,
}

impl Template {
    /// Looks up a built-in template by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTemplate`] for names outside [`Template::VARIANTS`].
    pub fn from_name(name: &str) -> Result<Self> {
        Self::from_str(name).map_err(|_| Error::UnknownTemplate(name.to_string()))
    }

    /// Returns the names of every built-in template.
    #[must_use]
    pub const fn names() -> &'static [&'static str] {
        Self::VARIANTS
    }

    /// Returns the template source.
    #[must_use]
    pub const fn source(self) -> &'static str {
        match self {
            Self::CrackmeC => include_str!("templates/crackme.c.j2"),
            Self::SolverPy => include_str!("templates/solver.py.j2"),
        }
    }
}

/// Template-facing view of a [`Constraint`].
#[derive(Debug, Serialize)]
struct ConstraintView {
    kind: &'static str,
    text: String,
    x: usize,
    y: Option<usize>,
    k: Option<u8>,
    op: String,
    n: u8,
}

impl From<&Constraint> for ConstraintView {
    fn from(constraint: &Constraint) -> Self {
        let text = constraint.to_string();
        match *constraint {
            Constraint::Compare { x, y, op, n } => Self {
                kind: "compare",
                text,
                x,
                y: Some(y),
                k: None,
                op: op.to_string(),
                n,
            },
            Constraint::Constant { x, k, op, n } => Self {
                kind: "constant",
                text,
                x,
                y: None,
                k: Some(k),
                op: op.to_string(),
                n,
            },
            Constraint::Operation { x, y, op, n } => Self {
                kind: "operation",
                text,
                x,
                y: Some(y),
                k: None,
                op: op.to_string(),
                n,
            },
        }
    }
}

fn hex(value: u64) -> String {
    format!("{value:#04x}")
}

fn chr(value: u8) -> String {
    char::from(value).to_string()
}

/// Template renderer with an explicit helper allow-list.
pub struct Renderer {
    env: Environment<'static>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer with the `hex` and `chr` helpers registered.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_function("hex", hex);
        env.add_function("chr", chr);
        Self { env }
    }

    /// Renders a built-in template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if rendering fails.
    pub fn render(&self, template: Template, armor: &Z3Armor) -> Result<String> {
        self.render_str(template.source(), armor)
    }

    /// Renders the template stored at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the file cannot be read, [`Error::Render`] if it does
    /// not compile or render.
    pub fn render_path(&self, path: &Path, armor: &Z3Armor) -> Result<String> {
        let source = fs::read_to_string(path)?;
        self.render_str(&source, armor)
    }

    /// Renders a template given as source text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the template does not compile or render.
    pub fn render_str(&self, source: &str, armor: &Z3Armor) -> Result<String> {
        let template = self.env.template_from_str(source)?;
        let constraints: Vec<ConstraintView> =
            armor.constraints().iter().map(ConstraintView::from).collect();
        let rendered = template.render(context! {
            secret => armor.secret(),
            constraints => constraints,
            size => armor.secret().len(),
        })?;
        Ok(rendered)
    }
}
