use std::{path::PathBuf, time::Duration};

use clap::{builder::PossibleValuesParser, ArgGroup, Parser};
use z3armor::{ArmorConfig, RandomSource, Template};

/// z3-armor - turn a secret into a program that accepts nothing else
#[derive(Debug, Parser)]
#[command(name = "z3-armor", version, about, long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["template", "template_path"])
))]
pub struct Cli {
    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Secret to obfuscate, read from stdin when omitted.
    #[arg(short = 'p', long)]
    pub secret: Option<String>,

    /// Seed used for generation (random when omitted).
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Built-in template used to generate the program.
    #[arg(long, value_parser = PossibleValuesParser::new(Template::names().iter().copied()))]
    pub template: Option<String>,

    /// Path to a Jinja template used to generate the program.
    #[arg(long, value_name = "FILE")]
    pub template_path: Option<PathBuf>,

    /// Output file, stdout when omitted.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Candidates tried per generated constraint before giving up.
    #[arg(long, default_value_t = ArmorConfig::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,

    /// Time budget of a single solver check, in milliseconds.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl Cli {
    /// Engine configuration selected on the command line.
    pub fn config(&self) -> ArmorConfig {
        let config = ArmorConfig::default().with_max_attempts(self.max_attempts);
        match self.timeout_ms {
            Some(ms) => config.with_solver_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }

    /// Randomness source selected on the command line.
    pub fn random_source(&self) -> RandomSource {
        RandomSource::from_seed(self.seed)
    }
}
