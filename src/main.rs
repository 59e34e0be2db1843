//! Hack Emulator - CLI Entry Point
//!
//! Commands:
//! - `hack-emu asm <source>` - Assemble to a `.hack` file
//! - `hack-emu run <program>` - Run an ASM or HACK file
//! - `hack-emu debug <program>` - Interactive debugger
//! - `hack-emu disasm <hack>` - Disassemble a `.hack` file
//! - `hack-emu config` - Show or create the configuration file

use clap::{Parser, Subcommand};
use hack::config::DEFAULT_CONFIG_FILE;
use hack::{Config, Debugger, Program, StopReason};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hack-emu")]
#[command(version)]
#[command(about = "Assembler, emulator and debugger for the 16-bit Hack computer")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble source to machine code
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output .hack file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Directory for the output file (overrides the configuration)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Print the assembled listing
        #[arg(short, long)]
        print: bool,
    },
    /// Run a program until it halts
    Run {
        /// Path to the ASM or HACK file to execute
        program: PathBuf,
        /// Maximum number of steps (default: from configuration)
        #[arg(short, long)]
        max_steps: Option<u64>,
        /// Show each executed instruction
        #[arg(short, long)]
        trace: bool,
    },
    /// Interactive debugger
    Debug {
        /// Path to the ASM or HACK file to debug
        program: PathBuf,
        /// Use the terminal UI instead of the command shell
        #[arg(long)]
        tui: bool,
    },
    /// Disassemble machine code to readable text
    Disasm {
        /// Path to the .hack file
        hack: PathBuf,
    },
    /// Show the active configuration
    Config {
        /// Write the configuration file with defaults if it does not exist
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Commands::Asm { source, output, output_dir, print } => {
            assemble_file(&source, output, output_dir, print, &config);
        }
        Commands::Run { program, max_steps, trace } => {
            run_program(&program, max_steps, trace, &config);
        }
        Commands::Debug { program, tui } => {
            debug_program(&program, tui, &config);
        }
        Commands::Disasm { hack } => {
            disassemble_file(&hack);
        }
        Commands::Config { init } => {
            show_config(&cli.config, init, &config);
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("error: {}: {}", context, err);
    std::process::exit(1);
}

fn load(path: &Path) -> Program {
    let program = match hack::load_program(path) {
        Ok(p) => p,
        Err(e) => fail(&format!("failed to load {}", path.display()), e),
    };
    if program.is_empty() {
        eprintln!("error: no instructions to execute");
        std::process::exit(1);
    }
    program
}

fn debugger_for(program: Program, config: &Config) -> Debugger {
    match Debugger::from_program(program, &config.debugger) {
        Ok(d) => d,
        Err(e) => fail("failed to create CPU", e),
    }
}

fn assemble_file(
    source_path: &Path,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    print: bool,
    config: &Config,
) {
    let source = match std::fs::read_to_string(source_path) {
        Ok(s) => s,
        Err(e) => fail(&format!("failed to read {}", source_path.display()), e),
    };

    let program = match hack::assemble(&source) {
        Ok(p) => p,
        Err(e) => fail("assembly failed", e),
    };
    println!("Assembled {} instructions", program.len());

    if print {
        for (addr, (word, line)) in program
            .instructions
            .iter()
            .zip(&program.source_lines)
            .enumerate()
        {
            println!("{:05}: {:016b}  {}", addr, word, line);
        }
    }

    let out_path = match (output, output_dir) {
        (Some(path), _) => path,
        (None, dir) if config.assembler.create_hack_file || dir.is_some() => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.assembler.output_dir));
            let stem = source_path.file_stem().unwrap_or_default();
            dir.join(stem).with_extension("hack")
        }
        (None, _) => return,
    };

    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            fail(&format!("failed to create {}", parent.display()), e);
        }
    }
    if let Err(e) = hack::asm::save_hack(&out_path, &program) {
        fail("failed to save machine code", e);
    }
    println!("Saved to {}", out_path.display());
}

fn run_program(path: &Path, max_steps: Option<u64>, trace: bool, config: &Config) {
    let mut debugger = debugger_for(load(path), config);
    let max_steps = max_steps.unwrap_or(config.debugger.max_steps);

    let (reason, state) = if trace {
        let mut reason = StopReason::MaxSteps;
        let mut state = debugger.cpu().snapshot();
        for _ in 0..max_steps {
            let pc = debugger.get_registers().pc;
            let line = debugger.get_current_source_line().unwrap_or("").to_string();
            let (ok, next) = debugger.step();
            state = next;
            if !ok {
                reason = StopReason::Halted;
                break;
            }
            println!("{:05}: {:<16} A={} D={} PC={}", pc, line, state.a, state.d, state.pc);
        }
        (reason, state)
    } else {
        debugger.run_until_breakpoint(max_steps)
    };

    println!();
    println!("Stopped: {}", reason);
    println!("Cycles:  {}", debugger.cpu().cycles());
    println!("A:       {}", state.a);
    println!("D:       {}", state.d);
    println!("PC:      {}", state.pc);

    let rows = config.debugger.ram_view_size.min(16);
    let cells: Vec<String> = debugger
        .get_ram_range(0, rows)
        .iter()
        .map(|v| v.to_string())
        .collect();
    println!("RAM[0..{}]: {}", rows, cells.join(" "));

    if reason == StopReason::MaxSteps {
        println!();
        println!("Reached the step limit ({}). Use --max-steps to increase.", max_steps);
    }
}

fn debug_program(path: &Path, tui: bool, config: &Config) {
    let debugger = debugger_for(load(path), config);

    if tui {
        #[cfg(feature = "tui")]
        {
            if let Err(e) = hack::tui::run_debugger(debugger, config) {
                fail("debugger error", e);
            }
            return;
        }
        #[cfg(not(feature = "tui"))]
        {
            eprintln!("warning: built without the `tui` feature, using the command shell");
        }
    }

    let mut shell = hack::Shell::new(debugger, config);
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    if let Err(e) = shell.run(stdin.lock(), &mut stdout) {
        fail("debugger error", e);
    }
}

fn disassemble_file(path: &Path) {
    let program = match hack::asm::load_hack(path) {
        Ok(p) => p,
        Err(e) => fail(&format!("failed to load {}", path.display()), e),
    };
    print!("{}", hack::disassemble(&program.instructions));
}

fn show_config(path: &Path, init: bool, config: &Config) {
    if init {
        if path.exists() {
            println!("{} already exists", path.display());
        } else if let Err(e) = config.save(path) {
            fail(&format!("failed to write {}", path.display()), e);
        } else {
            println!("Wrote {}", path.display());
        }
    }

    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => fail("failed to render configuration", e),
    }
}
