use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use anyhow::Context;

/// Write a rendered program to `path`, or to stdout when no path is given.
pub fn write_program(program: &str, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => fs::write(path, program)
            .with_context(|| format!("failed to write output: {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(program.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
