use anyhow::{Context, Result};
use clap::Parser;
use dyncall::compiler::Compiler;
use dyncall::errors::print_error;
use dyncall::loader::load_program;
use dyncall::options::{CodegenOptions, EmitTarget};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dyncall")]
#[command(about = "Resolve dynamic calls and emit their dispatch code", long_about = None)]
struct Args {
    /// Parsed program: a JSON file or a directory of JSON files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JSON file with code generation options
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Worker threads per phase
    #[arg(short, long)]
    jobs: Option<usize>,

    #[arg(long, value_enum)]
    emit: Option<EmitTarget>,

    /// Print every selected dispatch plan to stderr as a JSON line
    #[arg(long)]
    dump_plans: bool,
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(&args) {
        print_error(&args.input, &err);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut options = match &args.options {
        Some(path) => CodegenOptions::load(path)?,
        None => CodegenOptions::default(),
    };
    if let Some(jobs) = args.jobs {
        options.jobs = jobs;
    }
    if let Some(emit) = args.emit {
        options.emit = emit;
    }

    let program = load_program(&args.input)?;
    let output = Compiler::new(options).compile(&program)?;

    if args.dump_plans {
        for record in &output.plans {
            eprintln!("{}", serde_json::to_string(record)?);
        }
    }

    match &args.output {
        Some(path) => std::fs::write(path, &output.text)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", output.text),
    }
    Ok(())
}
