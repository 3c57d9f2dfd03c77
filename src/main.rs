//! `marsh` is a small interactive command interpreter.
//!
//! It reads a line of input from the terminal through its own character-mode
//! line editor, parses it into a tree of commands connected by pipes,
//! sequencing, backgrounding, redirection, and grouping, then realizes that
//! tree with fork/exec and descriptor rewiring.
//!
//! ### High-level structure:
//! 1. The REPL prints a prompt and collects one line via the line editor,
//!    which replays history on the arrow keys
//! 2. `cd`, `pwd`, and `clear` are handled in the shell process itself
//! 3. Everything else is parsed in the parent, then run in a forked child
//!    that the REPL waits on
use std::fmt::{Display, Write as FmtWrite};
use std::io::{self, Write as IoWrite};
use std::path::Path;

use log::{debug, trace};
use nix::fcntl::{OFlag, open};
use nix::sys::stat::Mode;
use nix::unistd::{chdir, close};

use crate::editor::{LineEditor, ReadOutcome};
use crate::history::History;
use crate::prompt::Cwd;
use crate::reader::{RawMode, TermReader};

pub mod cmd;
pub mod editor;
pub mod exec;
pub mod history;
pub mod keys;
pub mod parse;
pub mod prompt;
pub mod reader;
pub mod token;
#[cfg(test)]
pub mod tests;

/// Print the given error message and exit the program.
///
/// Despite the header, this function does not return anything. It always
/// calls `std::process::exit(1)`. This is done so that the function can be
/// easily used as an argument to methods such as `unwrap_or_else`.
///
/// The error message will be prefixed with `marsh:` if it is not already.
pub fn complain_and_exit<T>(err: impl Display) -> T {
	let mut err = err.to_string();
	if !err.starts_with("marsh: ") {
		err = format!("marsh: {err}");
	}
	eprintln!("{err}");
	std::process::exit(1)
}

/// The arguments passed to the program by the user
#[derive(Default, Clone, Debug)]
struct Opts {
	trace: bool,
}

impl Opts {
	/// Parse the user's arguments
	fn parse() -> Result<Self, String> {
		let mut new = Self::default();
		let mut args = std::env::args().skip(1);
		while let Some(arg) = args.next() {
			match arg.as_str() {
				"--trace" => {
					new.trace = true;
				}
				"--help" | "-h" => {
					print!("{}", get_help());
					std::process::exit(0)
				}
				_ => return Err(format!("unrecognized argument '{arg}'")),
			}
		}
		Ok(new)
	}
}

/// Prints out the help info for `marsh`
fn get_help() -> String {
	let mut help = String::new();
	writeln!(help).ok();
	writeln!(help, "\x1b[1mmarsh\x1b[0m").ok();
	writeln!(help, "A small interactive command interpreter.").ok();
	writeln!(help).ok();
	writeln!(help, "\x1b[1;4mUSAGE:\x1b[0m").ok();
	writeln!(help, "\tmarsh [OPTIONS]").ok();
	writeln!(help).ok();
	writeln!(help, "\x1b[1;4mOPTIONS:\x1b[0m").ok();
	writeln!(help, "\t--trace").ok();
	writeln!(help, "\t\tPrint a debug trace of lexing, parsing, and process creation").ok();
	writeln!(help).ok();
	writeln!(help, "\x1b[1;4mCOMMAND LANGUAGE:\x1b[0m").ok();
	writeln!(help, "\tcmd args...           run a program").ok();
	writeln!(help, "\ta | b                 pipe a's stdout into b").ok();
	writeln!(help, "\ta ; b                 run a, then b").ok();
	writeln!(help, "\ta &                   run a without waiting").ok();
	writeln!(help, "\tcmd < file            read stdin from file").ok();
	writeln!(help, "\tcmd > file            write stdout to file").ok();
	writeln!(help, "\t( a ; b ) | c         group commands").ok();
	writeln!(help).ok();
	writeln!(help, "\tBuiltins: cd <path>, pwd, clear").ok();
	writeln!(help).ok();
	help
}

/// Initialize the logger
///
/// This interacts with the `--trace` flag that can be passed in the
/// arguments. If `trace` is true, then trace!() calls always activate, with
/// our custom formatting.
fn init_logger(trace: bool) {
	let mut builder = env_logger::builder();
	if trace {
		builder.filter(None, log::LevelFilter::Trace);
	}

	builder.format(move |buf, record| {
		let color = match record.level() {
			log::Level::Error => "\x1b[1;31m",
			log::Level::Warn => "\x1b[33m",
			log::Level::Info => "\x1b[32m",
			log::Level::Debug => "\x1b[34m",
			log::Level::Trace => "\x1b[36m",
		};
		writeln!(buf, "[{color}{}\x1b[0m] {}", record.level(), record.args())
	});

	builder.init();
}

/// Guarantee that descriptors 0, 1, and 2 are open before the REPL starts.
///
/// Opens the controlling terminal repeatedly until the kernel hands back a
/// descriptor past the standard three, then closes that one. With no
/// controlling terminal there is nothing to repair and the shim is a no-op.
fn ensure_console_fds() {
	loop {
		match open("/dev/tty", OFlag::O_RDWR, Mode::empty()) {
			Ok(fd) if fd >= 3 => {
				close(fd).ok();
				break;
			}
			Ok(_) => continue,
			Err(_) => break,
		}
	}
}

/// All mutable REPL state: the editor, the command history, and the
/// displayed working directory.
struct Repl {
	editor: LineEditor,
	history: History,
	cwd: Cwd,
	reader: TermReader,
}

impl Repl {
	fn new() -> Self {
		Self {
			editor: LineEditor::new(),
			history: History::new(),
			cwd: Cwd::new(),
			reader: TermReader::new(),
		}
	}

	/// Prompt, read, dispatch. Returns on end of input.
	fn run(&mut self) {
		let mut err = io::stderr();
		loop {
			let prompt = self.cwd.prompt();
			write!(err, "{prompt}").ok();
			err.flush().ok();
			match self.editor.read_line(&mut self.reader, &mut self.history, &prompt, &mut err) {
				ReadOutcome::Eof => break,
				ReadOutcome::Line(line) => self.dispatch(&line),
			}
		}
	}

	/// Handle one accepted line: builtins first, then parse and fork.
	fn dispatch(&mut self, line: &str) {
		// cd must run in the shell process itself; a child's chdir would
		// vanish with it
		if let Some(path) = line.strip_prefix("cd ") {
			let path = path.trim_end_matches('\n');
			if chdir(Path::new(path)).is_err() {
				eprintln!("cannot cd {path}");
			} else {
				self.cwd.apply_cd(path);
			}
			return;
		}
		if line == "pwd" {
			println!("{}", self.cwd.as_str());
			return;
		}
		if line == "clear" {
			print!("\x1b[2J\x1b[H");
			io::stdout().flush().ok();
			return;
		}

		let tree = match parse::parse(line) {
			Ok(tree) => tree,
			Err(e) => {
				eprintln!("marsh: {e}");
				return;
			}
		};
		debug!("running: {tree}");
		exec::run_foreground(tree);
	}
}

fn main() {
	let opts = Opts::parse().unwrap_or_else(complain_and_exit);
	init_logger(opts.trace);
	trace!("marsh starting up");

	ensure_console_fds();
	let _raw = RawMode::enter();
	Repl::new().run();
}
