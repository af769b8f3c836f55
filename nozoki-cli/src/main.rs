//! nozoki CLI - コマンドラインインターフェース
//!
//! 模擬ホスト上のコンテナを表示アダプタ経由で表示するREPL

mod command;
mod demo;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use command::Command;
use demo::Session;
use nozoki_core::config::DEFAULT_NAMESPACE;
use nozoki_core::{DisplayConfig, Registry};
use nozoki_host::accessor::DEFAULT_MAX_ATTEMPTS;
use nozoki_host::AccessorConfig;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

/// nozoki - container display adapters
#[derive(Parser)]
#[command(name = "nozoki")]
#[command(version = "0.1.0")]
#[command(about = "Display adapters for a container library, over a simulated debugger host", long_about = None)]
struct Cli {
    /// Namespace of the container library
    #[arg(long, global = true, default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Start a REPL over the demo variables
    Demo {
        /// Directory of `<type>_printer.*` files to register (all known types if omitted)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Attempts per evaluation on transient host faults
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,

        /// Run commands and exit instead of starting the REPL
        #[arg(short = 'x', long = "eval")]
        eval: Vec<String>,
    },

    /// List the adapters a directory would register
    Printers {
        /// Directory of `<type>_printer.*` files
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        CliCommand::Demo {
            dir,
            max_attempts,
            eval,
        } => {
            let registry = init_registry(&cli.namespace, dir.as_deref())?;
            let mut session = Session::new(
                registry,
                DisplayConfig::with_namespace(cli.namespace.as_str()),
                AccessorConfig { max_attempts },
            );

            if eval.is_empty() {
                println!("nozoki - container display adapters");
                println!("Version 0.1.0");
                println!();
                run_repl(&mut session)?;
            } else {
                for line in &eval {
                    if let Flow::Quit = handle_command(&mut session, line)? {
                        break;
                    }
                }
            }
        }
        CliCommand::Printers { dir } => {
            let registry = init_registry(&cli.namespace, dir.as_deref())?;
            print_printers(&registry);
        }
    }

    Ok(())
}

/// ログ出力を初期化する（RUST_LOGがあればそちらを優先）
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// レジストリを作成する
///
/// ディレクトリの指定があればその中の `_printer` ファイルだけを登録し、
/// なければ既知の型をすべて登録する。
fn init_registry(namespace: &str, dir: Option<&std::path::Path>) -> Result<Registry> {
    let Some(dir) = dir else {
        return Ok(Registry::with_catalogue(namespace)?);
    };

    let mut registry = Registry::new(namespace);
    let report = registry.load_directory(dir)?;
    println!(
        "Registered {} printers from {}",
        report.registered.len(),
        dir.display()
    );
    for skipped in &report.skipped {
        println!("  skipped: {}", skipped);
    }

    Ok(registry)
}

enum Flow {
    Continue,
    Quit,
}

/// REPLループを実行する
fn run_repl(session: &mut Session) -> Result<()> {
    println!("Type 'help' for available commands, 'quit' to exit.");
    println!();

    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline("(nozoki) ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line)?;

                match handle_command(session, line) {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn handle_command(session: &mut Session, line: &str) -> Result<Flow> {
    match Command::parse(line) {
        Some(Command::Help) => print_help(),
        Some(Command::Quit) => {
            println!("Goodbye!");
            return Ok(Flow::Quit);
        }
        Some(Command::Print { name, raw }) => println!("{}", session.print(&name, raw)?),
        Some(Command::Whatis(name)) => println!("{}", session.whatis(&name)?),
        Some(Command::List) => handle_list(session),
        Some(Command::InfoPrinters) => print_printers(session.registry()),
        Some(Command::SetPretty(on)) => session.set_pretty(on),
        Some(Command::ShowPretty) => {
            let state = if session.is_pretty() { "on" } else { "off" };
            println!("Pretty formatting of structures is {}.", state);
        }
        None => println!("Unknown command: {}. Type 'help' for available commands.", line),
    }

    Ok(Flow::Continue)
}

/// Listコマンドを処理する
fn handle_list(session: &Session) {
    let variables = session.variables();
    println!("Variables ({} found):", variables.len());
    for (name, value) in variables {
        println!("  {} : {}", name, nozoki_core::fixtures::type_of(value));
    }
}

fn print_printers(registry: &Registry) {
    let bindings = registry.bindings();
    if bindings.is_empty() {
        println!("No printers registered");
        return;
    }

    println!("{} printers:", registry.namespace());
    for binding in bindings {
        println!("  {:<18} {}", binding.type_name, binding.pattern.as_str());
    }
}

/// ヘルプを表示する
fn print_help() {
    println!("Available commands:");
    println!("  print <name>, p <name>      - Display a variable through its adapter");
    println!("  print/r <name>, p/r <name>  - Display a variable without adapters");
    println!("  whatis <name>               - Show the type and the matching adapter");
    println!("  list, info locals           - List the demo variables");
    println!("  info printers               - List registered adapters");
    println!("  set print pretty [on|off]   - Toggle one-child-per-line output");
    println!("  show print pretty           - Show the pretty setting");
    println!("  help, h                     - Show this help message");
    println!("  quit, q, exit               - Exit the REPL");
}
