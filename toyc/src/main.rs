use anyhow::Context;
use anyhow::Result;
use clap::ArgMatches;
use clap::Args;
use clap::Command;
use clap::FromArgMatches;
use std::io::Read;
use toyc::compile;
use toyc::Emit;
use toyc::InputKind;
use tracing::Level;

/// A compiler for the toy tensor language.
#[derive(Args, Debug)]
#[command(version, about)]
struct ToycArgs {
    /// The input file (- is interpreted as stdin)
    #[arg(default_value = "-")]
    input: String,
    /// Print the syntax tree or the IR
    #[arg(long, value_enum, default_value = "mlir")]
    emit: Emit,
    /// Print debug logs
    #[arg(long)]
    debug: bool,
}

fn cli() -> Command {
    let cli = Command::new("toyc");
    ToycArgs::augment_args(cli)
}

/// Accept `-emit=ast` next to `--emit=ast`.
fn normalize_args<I: IntoIterator<Item = String>>(args: I) -> Vec<String> {
    args.into_iter()
        .map(|arg| match arg.strip_prefix("-emit") {
            Some(rest) if rest.is_empty() || rest.starts_with('=') => format!("--emit{rest}"),
            _ => arg,
        })
        .collect()
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
    }
}

fn run(matches: &ArgMatches) -> Result<String> {
    let args = ToycArgs::from_arg_matches(matches)?;
    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    // Only fails when a subscriber is already set.
    let _ = toyir::init_subscriber(level);
    let src = read_input(&args.input)?;
    let kind = InputKind::from_path(&args.input);
    compile(&src, &args.input, kind, args.emit)
}

fn main() {
    let matches = cli().get_matches_from(normalize_args(std::env::args()));
    match run(&matches) {
        Ok(result) => print!("{result}"),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
