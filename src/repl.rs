//! Read‑eval‑print loop.
//!
//! One global environment lives for the whole session, so bindings and
//! closures made on one line are visible on the next.  Prompts, results and
//! `puts` output all go to the evaluator's output, in order.

use std::io::{BufRead, Write};

use log::{debug, info};

use crate::environment::{Env, Environment};
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::parser::parse_program;

pub const PROMPT: &str = ">> ";

/// Runs the loop until `input` is exhausted.
pub fn start<R: BufRead>(input: R, evaluator: &mut Evaluator<'_>) -> Result<()> {
    info!("REPL started");

    let env: Env = Environment::new();
    let mut lines = input.lines();

    loop {
        write!(evaluator.output(), "{}", PROMPT)?;
        evaluator.output().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line: String = line?;

        if line.trim().is_empty() {
            continue;
        }

        match parse_program(&line) {
            Ok(program) => {
                let value = evaluator.eval_program(&program, &env);
                debug!("REPL line evaluated to: {}", value);
                writeln!(evaluator.output(), "{}", value)?;
            }

            Err(e) => {
                debug!("REPL parse debug: {}", e);
                writeln!(evaluator.output(), "{}", e)?;
            }
        }
    }

    writeln!(evaluator.output())?;
    info!("REPL finished");

    Ok(())
}
