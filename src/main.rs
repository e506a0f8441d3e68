use std::fs;
use std::path::{ Path, PathBuf };
use std::process;

use clap::{ ArgAction, Parser, ValueEnum };
use colored::Colorize;
use err_derive::Error;
use log::{ info, LevelFilter };
use simplelog::{ Config, TermLogger, TerminalMode };

use sbt65::{
	BackendKind,
	IllegalOpcodePolicy,
	MemoryImage,
	TimingPolicy,
	TranslateConfig,
	TranslateError,
	Translation,
};

// ------------------------------------------------------------------------------------------------
// Arguments
// ------------------------------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "sbt65", version, about = "Translates a raw 6502 binary image into C")]
struct Args {
	/// Raw binary image.
	image: PathBuf,

	/// Load address of the image, which is also where execution starts.
	#[arg(long, default_value = "0xF000", value_parser = parse_addr)]
	offset: u16,

	/// Flavor of C to generate.
	#[arg(long, value_enum, default_value_t = BackendArg::C)]
	backend: BackendArg,

	/// Compute every flag every instruction defines, live or not.
	#[arg(long)]
	no_opt: bool,

	/// Count every conditional cycle penalty (worst case timing).
	#[arg(long)]
	wcet: bool,

	/// Translate undocumented opcodes as NOPs instead of failing.
	#[arg(long)]
	permissive: bool,

	/// Also write the control flow graph, in DOT format, to this file.
	#[arg(long)]
	dot: Option<PathBuf>,

	/// More logging. Repeat for even more.
	#[arg(short, long, action = ArgAction::Count)]
	verbose: u8,

	/// Where to write the generated C. Defaults to stdout.
	#[arg(short, long)]
	output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, PartialEq, Eq, Copy, Clone)]
enum BackendArg {
	Avr,
	C,
}

impl From<BackendArg> for BackendKind {
	fn from(b: BackendArg) -> Self {
		match b {
			BackendArg::Avr => BackendKind::Avr,
			BackendArg::C   => BackendKind::Portable,
		}
	}
}

/// Accepts `0xF000`, `$F000`, or decimal.
fn parse_addr(s: &str) -> Result<u16, String> {
	let hex = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).or_else(|| s.strip_prefix('$'));

	let parsed = match hex {
		Some(digits) => u16::from_str_radix(digits, 16),
		None         => s.parse(),
	};

	parsed.map_err(|e| format!("'{}' is not an address: {}", s, e))
}

impl Args {
	fn config(&self) -> TranslateConfig {
		TranslateConfig::default()
			.with_backend(self.backend.into())
			.with_optimize(!self.no_opt)
			.with_timing(if self.wcet { TimingPolicy::WORST_CASE } else { TimingPolicy::default() })
			.with_illegal_ops(if self.permissive {
				IllegalOpcodePolicy::Permissive
			} else {
				IllegalOpcodePolicy::Strict
			})
	}

	fn log_level(&self) -> LevelFilter {
		match self.verbose {
			0 => LevelFilter::Warn,
			1 => LevelFilter::Info,
			2 => LevelFilter::Debug,
			_ => LevelFilter::Trace,
		}
	}
}

// ------------------------------------------------------------------------------------------------
// Errors
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
enum CliError {
	#[error(display = "could not read '{}': {}", _0, _1)]
	Read(String, std::io::Error),

	#[error(display = "could not write '{}': {}", _0, _1)]
	Write(String, std::io::Error),

	#[error(display = "{}", _0)]
	Translate(TranslateError),
}

impl From<TranslateError> for CliError {
	fn from(e: TranslateError) -> Self {
		CliError::Translate(e)
	}
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
	fs::write(path, contents).map_err(|e| CliError::Write(path.display().to_string(), e))?;
	info!("wrote {}", path.display());
	Ok(())
}

// ------------------------------------------------------------------------------------------------
// Driver
// ------------------------------------------------------------------------------------------------

fn main() {
	better_panic::install();
	let args = Args::parse();

	if TermLogger::init(args.log_level(), Config::default(), TerminalMode::Mixed).is_err() {
		eprintln!("{} could not set up logging", "warning:".yellow().bold());
	}

	if let Err(e) = run(&args) {
		eprintln!("{} {}", "error:".red().bold(), e);
		process::exit(1);
	}
}

fn run(args: &Args) -> Result<(), CliError> {
	let raw = fs::read(&args.image)
		.map_err(|e| CliError::Read(args.image.display().to_string(), e))?;

	info!("loading {} ({} bytes) at ${:04X}", args.image.display(), raw.len(), args.offset);
	let img = MemoryImage::load(&raw, args.offset)?;

	let session = Translation::analyze(img, args.config())?;
	let stats = session.liveness();
	info!("{} blocks, {} leaders; flag liveness settled after {} passes",
		stats.blocks, session.discovery().leaders.len(), stats.passes);

	if let Some(path) = &args.dot {
		write_file(path, &session.to_dot())?;
	}

	info!("generating code with the {} backend", BackendKind::from(args.backend));
	let code = session.translate()?;

	match &args.output {
		Some(path) => write_file(path, &code)?,
		None       => print!("{}", code),
	}

	Ok(())
}
