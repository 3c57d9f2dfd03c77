//! The parsed command tree.
//!
//! Every accepted input line becomes one `Cmd` value. The tree is built by
//! `parse`, handed to a forked child, and consumed by `exec::run`.

use std::fmt::Display;
use std::os::fd::RawFd;

/// Upper bound on the argument vector of a single `Exec` node.
pub const MAX_ARGS: usize = 10;

/// Which way a redirection opens its file.
///
/// `>>` lexes as its own token but shares `Write` with `>`; there is no
/// append mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RedirMode {
	Read,
	Write,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Cmd {
	/// A plain argv to exec. Zero arguments is legal and exits immediately.
	Exec { argv: Vec<String> },
	/// Reopen descriptor `fd` on `file` before running the inner command.
	Redir {
		cmd: Box<Cmd>,
		file: String,
		mode: RedirMode,
		fd: RawFd,
	},
	/// Left's stdout feeds right's stdin.
	Pipe { left: Box<Cmd>, right: Box<Cmd> },
	/// Run left to completion, then right.
	List { left: Box<Cmd>, right: Box<Cmd> },
	/// Run the inner command without waiting for it.
	Back { cmd: Box<Cmd> },
}

impl Cmd {
	pub fn exec(argv: Vec<String>) -> Self {
		Self::Exec { argv }
	}

	pub fn redir(cmd: Cmd, file: String, mode: RedirMode, fd: RawFd) -> Self {
		Self::Redir { cmd: Box::new(cmd), file, mode, fd }
	}

	pub fn pipe(left: Cmd, right: Cmd) -> Self {
		Self::Pipe { left: Box::new(left), right: Box::new(right) }
	}

	pub fn list(left: Cmd, right: Cmd) -> Self {
		Self::List { left: Box::new(left), right: Box::new(right) }
	}

	pub fn back(cmd: Cmd) -> Self {
		Self::Back { cmd: Box::new(cmd) }
	}
}

impl Display for Cmd {
	/// Re-serialize the tree to a line the parser accepts again.
	///
	/// Whitespace is normalized and `>>` prints as `>`; everything else
	/// round-trips byte for byte.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Cmd::Exec { argv } => write!(f, "{}", argv.join(" ")),
			Cmd::Redir { cmd, file, mode, .. } => {
				let op = match mode {
					RedirMode::Read => '<',
					RedirMode::Write => '>',
				};
				// A non-Exec inner came from a parenthesized block; keep the
				// parens so the redirection reattaches to the whole block
				if matches!(**cmd, Cmd::Exec { .. } | Cmd::Redir { .. }) {
					write!(f, "{cmd} {op} {file}")
				} else {
					write!(f, "( {cmd} ) {op} {file}")
				}
			}
			Cmd::Pipe { left, right } => write!(f, "( {left} ) | ( {right} )"),
			Cmd::List { left, right } => write!(f, "{left} ; {right}"),
			Cmd::Back { cmd } => write!(f, "{cmd} &"),
		}
	}
}
