use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use monkey_interpreter as monkey;

use monkey::environment::Environment;
use monkey::error::MonkeyError;
use monkey::evaluator::{Evaluator, DEFAULT_MAX_DEPTH};
use monkey::parser::parse_program;
use monkey::repl;
use monkey::scanner::Scanner;

#[derive(ClapParser, Debug)]
#[command(version, about = "Monkey language interpreter", long_about = None)]
pub struct Cli {
    /// Defaults to `repl`
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum nesting of user function calls
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_call_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file and prints the program
    Parse {
        filename: PathBuf,

        /// Print the syntax tree as JSON instead of source form
        #[arg(long)]
        json: bool,
    },

    /// Runs input from a file as a Monkey program
    Run { filename: PathBuf },

    /// Starts an interactive session
    Repl,
}

/// Reads a source file through a read‑only memory map.
fn read_file(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero‑length files cannot be mapped.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the mapping is read‑only and dropped before returning; the
    // text is copied out after UTF‑8 validation.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let text: &str = std::str::from_utf8(&mmap)
        .map_err(MonkeyError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", len, filename);

    Ok(text.to_owned())
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("monkey_interpreter::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let mut evaluator = Evaluator::with_max_depth(args.max_call_depth);

    match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename } => {
            info!("Running Tokenize subcommand");
            let text = read_file(&filename)?;
            let mut tokenized = true;

            for token in Scanner::new(&text) {
                match token {
                    Ok(token) => println!("{}", token),

                    Err(e) => {
                        tokenized = false;
                        debug!("Tokenization debug: {}", e);
                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                debug!("Tokenization failed, exiting with code 65");
                std::process::exit(65);
            }
        }

        Commands::Parse { filename, json } => {
            info!("Running Parse subcommand");
            let text = read_file(&filename)?;

            match parse_program(&text) {
                Ok(program) if json => {
                    let dump = serde_json::to_string_pretty(&program)
                        .context("Failed to serialize syntax tree")?;
                    println!("{}", dump);
                }

                Ok(program) => println!("{}", program),

                Err(e) => {
                    debug!("Parse debug: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            }
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let text = read_file(&filename)?;

            let program = match parse_program(&text) {
                Ok(program) => program,
                Err(e) => {
                    debug!("Parse debug: {}", e);
                    eprintln!("{}", e);
                    std::process::exit(65);
                }
            };

            let env = Environment::new();

            let result = evaluator.eval_program(&program, &env);

            if result.is_error() {
                debug!("Runtime debug: {}", result);
                eprintln!("{}", result);
                std::process::exit(70);
            }

            if !result.is_null() {
                println!("{}", result);
            }

            info!("Program executed");
        }

        Commands::Repl => {
            info!("Running Repl subcommand");
            let stdin = io::stdin();
            repl::start(stdin.lock(), &mut evaluator)?;
        }
    }

    Ok(())
}
