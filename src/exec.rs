//! Realizes a command tree as processes.
//!
//! `run` is the whole story: it consumes a tree and never returns, either
//! replacing the current process image or exiting. Concurrency is plain
//! `fork`; a `Pipe` forks both stages before the parent waits on either, a
//! `List` waits for its left child before running the right, and a `Back`
//! forks and immediately moves on.
//!
//! Descriptor discipline follows the classic pattern: a redirection closes
//! its target descriptor and reopens the file on the same number via
//! lowest-free allocation; pipe children dup their end onto 0 or 1 and then
//! close both originals; the parent closes both ends only after both
//! children exist.

use std::ffi::CString;
use std::os::fd::AsRawFd;
use std::process::exit;

use log::trace;
use nix::fcntl::{OFlag, open};
use nix::sys::stat::Mode;
use nix::sys::wait::wait;
use nix::unistd::{ForkResult, close, dup2, execvp, fork, pipe};

use crate::cmd::{Cmd, RedirMode};
use crate::complain_and_exit;

/// Fork, treating failure as fatal. Matches the shell's recovery model:
/// if the kernel is out of processes there is nothing sensible left to do.
pub fn fork1() -> ForkResult {
	// SAFETY: the shell is single-threaded, so no other thread can hold a
	// lock across the fork
	match unsafe { fork() } {
		Ok(res) => res,
		Err(e) => complain_and_exit(format!("fork failed: {e}")),
	}
}

/// Run `cmd` in a foreground child and wait for it.
pub fn run_foreground(cmd: Cmd) {
	if let ForkResult::Child = fork1() {
		run(cmd);
	}
	wait().ok();
}

/// Execute a command tree. Does not return.
///
/// Redir and the right arm of List are tail positions; both iterate
/// instead of recursing so `a ; b ; c ; …` chains of any depth run in
/// constant stack.
pub fn run(mut cmd: Cmd) -> ! {
	loop {
		match cmd {
			Cmd::Exec { argv } => exec_argv(argv),

			Cmd::Redir { cmd: inner, file, mode, fd } => {
				let oflag = match mode {
					RedirMode::Read => OFlag::O_RDONLY,
					RedirMode::Write => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
				};
				// Close the target first so the open lands on that number
				close(fd).ok();
				if open(file.as_str(), oflag, Mode::from_bits_truncate(0o666)).is_err() {
					eprintln!("open {file} failed");
					exit(1);
				}
				cmd = *inner;
			}

			Cmd::List { left, right } => {
				if let ForkResult::Child = fork1() {
					run(*left);
				}
				wait().ok();
				cmd = *right;
			}

			Cmd::Pipe { left, right } => {
				let (rd, wr) = pipe().unwrap_or_else(|e| {
					complain_and_exit(format!("pipe failed: {e}"))
				});
				trace!("pipe fds {} -> {}", wr.as_raw_fd(), rd.as_raw_fd());
				if let ForkResult::Child = fork1() {
					dup2(wr.as_raw_fd(), 1).unwrap_or_else(|e| {
						complain_and_exit(format!("dup2 failed: {e}"))
					});
					drop(rd);
					drop(wr);
					run(*left);
				}
				if let ForkResult::Child = fork1() {
					dup2(rd.as_raw_fd(), 0).unwrap_or_else(|e| {
						complain_and_exit(format!("dup2 failed: {e}"))
					});
					drop(rd);
					drop(wr);
					run(*right);
				}
				// Both children hold their own copies now; release ours so
				// the reader sees EOF when the writer finishes
				drop(rd);
				drop(wr);
				wait().ok();
				wait().ok();
				exit(0);
			}

			Cmd::Back { cmd: inner } => {
				if let ForkResult::Child = fork1() {
					run(*inner);
				}
				exit(0);
			}
		}
	}
}

/// Replace the current process image with `argv`, or exit.
fn exec_argv(argv: Vec<String>) -> ! {
	let Some(name) = argv.first().cloned() else {
		exit(0);
	};
	let cargs: Vec<CString> = match argv.into_iter().map(CString::new).collect() {
		Ok(cargs) => cargs,
		Err(_) => {
			eprintln!("exec {name} failed");
			exit(1);
		}
	};
	trace!("exec {name}");
	let _ = execvp(&cargs[0], &cargs);
	eprintln!("exec {name} failed");
	exit(1)
}
