//! cmpgen binary.
//!
//! Scans a directory of Rust sources for comparator requests and writes
//! their companion files.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use cmpgen::analyze::find_calls;
use cmpgen::expand::DEFAULT_SUFFIX;
use cmpgen::generate::DEFAULT_TARGETS;
use cmpgen::types::{CallInfo, Target};
use cmpgen::unit::discover_module_path;
use cmpgen::{CompilationUnit, GenerateOptions, Generator};
use tracing::{debug, info};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "cmpgen")]
#[command(about = "Generates field-ordered comparators for cmp_by_fields call sites")]
#[command(version)]
struct Cli {
    /// Raise the log level (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a companion file next to every source file with comparator
    /// requests.
    Generate {
        #[command(flatten)]
        unit: UnitArgs,

        /// Path of the runtime crate in generated code.
        #[arg(long, value_name = "PATH", default_value = "::cmpgen")]
        runtime: String,

        /// Do not write; fail if any companion is missing or out of date.
        #[arg(long)]
        check: bool,
    },

    /// List every marker call with its arguments and their reachability.
    Calls {
        #[command(flatten)]
        unit: UnitArgs,
    },
}

#[derive(Args, Debug)]
struct UnitArgs {
    /// Directory holding the module's source files.
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Marker function to look for. May be repeated.
    #[arg(long = "target", value_name = "PATH")]
    targets: Vec<Target>,

    /// Module path of the directory, such as `my_crate::sorting`. Read from
    /// the nearest Cargo.toml when omitted.
    #[arg(long, value_name = "PATH")]
    module_path: Option<String>,

    /// Stem suffix of companion files.
    #[arg(long, value_name = "SUFFIX", default_value = DEFAULT_SUFFIX)]
    suffix: String,
}

impl UnitArgs {
    fn targets(&self) -> Result<Vec<Target>> {
        if !self.targets.is_empty() {
            return Ok(self.targets.clone());
        }
        DEFAULT_TARGETS
            .iter()
            .map(|target| target.parse().context("invalid default target"))
            .collect()
    }

    fn load(&self) -> Result<CompilationUnit> {
        let module_path = self
            .module_path
            .clone()
            .unwrap_or_else(|| discover_module_path(&self.dir));
        debug!(dir = %self.dir.display(), %module_path, "loading unit");

        CompilationUnit::load_skipping(&self.dir, &module_path, &self.suffix)
            .with_context(|| format!("failed to load `{}`", self.dir.display()))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn setup_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Generate {
            unit,
            runtime,
            check,
        } => generate(&unit, &runtime, check),
        Command::Calls { unit } => calls(&unit),
    }
}

fn generate(args: &UnitArgs, runtime: &str, check: bool) -> Result<ExitCode> {
    let runtime: syn::Path = syn::parse_str(runtime)
        .with_context(|| format!("`{runtime}` is not a Rust path"))?;
    let options = GenerateOptions {
        targets: args.targets()?,
        runtime,
        suffix: args.suffix.clone(),
    };

    let unit = args.load()?;
    let generation = Generator::new(options)
        .run(&unit)
        .context("failed to synthesize companions")?;

    for failure in &generation.failures {
        eprintln!("{failure}");
    }

    let mut ok = generation.is_clean();
    if check {
        let stale = generation.stale();
        for path in &stale {
            eprintln!("{}: out of date", path.display());
        }
        ok &= stale.is_empty();
    } else {
        let written = generation.write()?;
        info!(
            written = written.len(),
            companions = generation.generated.len(),
            "generation finished"
        );
    }

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn calls(args: &UnitArgs) -> Result<ExitCode> {
    let unit = args.load()?;

    for target in args.targets()? {
        for (file, calls) in find_calls(&unit, &target) {
            for call in calls.iter().filter(|call| !call.via_call) {
                print_call(file.path(), &target, call);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_call(path: &Path, target: &Target, call: &CallInfo<'_>) {
    println!("{}:{}: {target}", path.display(), call.location());

    if call.type_arguments.is_empty() {
        println!("    type: none");
    }
    for ty in &call.type_arguments {
        println!("    type {ty}: {:?}, {}", ty.origin, reachability(ty.is_reachable()));
    }

    for argument in &call.arguments {
        let value = argument
            .value
            .as_ref()
            .and_then(|value| value.as_str())
            .map_or_else(|| "not a constant string".to_owned(), |value| format!("{value:?}"));
        println!(
            "    arg {argument}: {value}, {}",
            reachability(argument.reachable)
        );
    }
}

fn reachability(reachable: bool) -> &'static str {
    if reachable { "reachable" } else { "unreachable" }
}
