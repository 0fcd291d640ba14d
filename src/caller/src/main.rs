use std::path::PathBuf;
use std::thread;

use structopt::StructOpt;
use symtrace_lib::associator::associate;
use symtrace_lib::config::AnalysisOptions;
use symtrace_lib::evaluator::{run_blocks, SymbolicState};
use symtrace_lib::intermediate_representation::IrModule;
use symtrace_lib::query::{answer, WatchIp};
use symtrace_lib::trace::reader::read_memlog;
use symtrace_lib::utils::log::{log_channel, LogThread};

#[derive(StructOpt)]
#[structopt(name = "symtrace", about = "Symbolic execution trace analyzer")]
struct Options {
    /// Path to the IR module, as JSON.
    #[structopt(long, parse(from_os_str))]
    ir: PathBuf,

    /// Path to the binary trace log.
    #[structopt(long, parse(from_os_str))]
    trace: PathBuf,

    /// Name of the IR function the trace starts in.
    #[structopt(long, default_value = "main")]
    entry: String,

    /// Guest instruction pointer to answer a query for.
    #[structopt(long)]
    ip: u64,

    /// Path to an `AnalysisOptions` YAML file; falls back to this
    /// platform's default config location, then to built-in defaults.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Maximum number of messages to print for `--ip`; `0` means unlimited.
    #[structopt(long, default_value = "0")]
    limit: usize,
}

fn load_options(path: Option<PathBuf>) -> symtrace_lib::prelude::Result<AnalysisOptions> {
    let resolved = path.or_else(AnalysisOptions::default_config_path);
    match resolved {
        Some(path) if path.exists() => AnalysisOptions::from_yaml_file(path),
        _ => Ok(AnalysisOptions::default()),
    }
}

fn main() -> symtrace_lib::prelude::Result<()> {
    let options = Options::from_args();
    let (log_sender, log_receiver) = log_channel();
    let log_thread = thread::spawn(move || LogThread::new(log_receiver).run());

    let result = run(&options, log_sender);

    drop(result.as_ref().err());
    // The sender moved into `run` is dropped there; once it and this
    // function's own handle are gone the log thread drains and exits.
    let _ = log_thread.join();
    let response = result?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run(
    options: &Options,
    log: symtrace_lib::utils::log::LogSender,
) -> symtrace_lib::prelude::Result<symtrace_lib::query::MessagesResponse> {
    let analysis_options = load_options(options.config.clone())?;
    let module = IrModule::from_file(&options.ir)?;
    let trace_file = std::fs::File::open(&options.trace)?;
    let events = read_memlog(trace_file)?;
    let list = associate(&module, &options.entry, &events, &analysis_options)?;

    let mut state = SymbolicState::new(analysis_options, list.blocks.len() as u32, Some(log));
    run_blocks(&mut state, &module, &list)?;

    for (ip, warning) in state.warnings() {
        eprintln!("warning: {}", symtrace_lib::trace::Message::format_warning(*ip, warning));
    }

    Ok(answer(&state, WatchIp { ip: options.ip, limit: options.limit }))
}
