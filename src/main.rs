use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use kvexpr as kx;

use kx::error::Error;
use kx::format::format_value;
use kx::interpreter::Interpreter;
use kx::json::to_json_string;
use kx::value::Value;

#[derive(ClapParser, Debug)]
#[command(version, about = "Key/value expression language", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to kvexpr.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parses an expression file and prints its parse tree as JSON
    Parse { filename: Option<PathBuf> },

    /// Evaluates an expression file and prints the resulting value
    Evaluate {
        filename: Option<PathBuf>,

        /// Blank-separated expressions bound to `args` as a list
        #[arg(long)]
        args: Option<String>,

        /// Print the result as JSON instead of literal text
        #[arg(long)]
        json: bool,
    },

    /// Evaluates a template document with `${...}` splices
    Template { filename: Option<PathBuf> },
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);
    let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let bytes = reader
        .read_to_string(&mut buf)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(buf)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("kvexpr.log").context("Failed to create kvexpr.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("kvexpr::")
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

    info!("Logger initialized, writing to kvexpr.log");
    Ok(())
}

/// Print a facade failure and exit with the matching status: 65 when the
/// input did not parse, 70 when evaluation threw.
fn fail(error: Error) -> Result<()> {
    match error {
        Error::Syntax(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            std::process::exit(65);
        }

        Error::TrailingInput(_) => {
            eprintln!("{}", error);
            std::process::exit(65);
        }

        Error::Eval(e) => {
            debug!("Evaluation debug: {}", e);
            eprintln!("{}", e);
            std::process::exit(70);
        }

        other => Err(other.into()),
    }
}

fn print_value(value: &Value, json: bool) -> Result<()> {
    let text = if json {
        to_json_string(value)?
    } else {
        format_value(value).unwrap_or_else(|_| value.to_string())
    };

    debug!("Evaluated to: {}", text);
    println!("{}", text);
    Ok(())
}

/// Interpreter with `args` bound to the evaluated space-separated list.
fn interpreter_with_args(args: Option<String>) -> Result<Interpreter> {
    let Some(text) = args else {
        return Ok(Interpreter::new());
    };

    let list = match Interpreter::new().run_space_separated(&text) {
        Ok(value) => value,
        Err(e) => {
            fail(e)?;
            Value::Null
        }
    };

    info!("Bound args: {}", list);

    Ok(Interpreter::with_variables([("args", list)]))
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

    match args.commands {
        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");
                let source = read_file(filename)?;
                let interpreter = Interpreter::new();
                let parsed = interpreter.parse(&source);

                println!("{}", serde_json::to_string_pretty(&parsed.node)?);

                if !parsed.errors.is_empty() {
                    fail(Error::Syntax(parsed.errors))?;
                }
                if parsed.next_index < source.len() {
                    fail(Error::TrailingInput(parsed.next_index))?;
                }

                info!("Parse subcommand completed");
            }
            None => {
                info!("No filepath provided for Parse");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Evaluate {
            filename,
            args,
            json,
        } => match filename {
            Some(filename) => {
                info!("Running Evaluate subcommand");
                let source = read_file(filename)?;
                let interpreter = interpreter_with_args(args)?;

                match interpreter.run(&source) {
                    Ok(value) => print_value(&value, json)?,
                    Err(e) => fail(e)?,
                }

                info!("Evaluate subcommand completed");
            }
            None => {
                info!("No filepath provided for Evaluate");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },

        Commands::Template { filename } => match filename {
            Some(filename) => {
                info!("Running Template subcommand");
                let source = read_file(filename)?;
                let interpreter = Interpreter::new();

                match interpreter.run_template(&source) {
                    Ok(Value::String(text)) => print!("{}", text),
                    Ok(other) => println!("{}", other),
                    Err(e) => fail(e)?,
                }

                info!("Template subcommand completed");
            }
            None => {
                info!("No filepath provided for Template");
                println!("No input filepath was provided. Exiting...");
                std::process::exit(0);
            }
        },
    }

    Ok(())
}
