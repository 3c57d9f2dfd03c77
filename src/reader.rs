//! Byte sources for the line editor, and the raw-mode guard that makes a
//! host tty deliver bytes one at a time.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::os::fd::AsFd;

use log::trace;
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};

use crate::keys::Key;

/// Anything that can feed key events to the editor.
///
/// Implementors only supply bytes; decoding (including ANSI escape
/// assembly) lives in the provided methods, so the terminal reader and the
/// scripted test reader behave identically.
pub trait KeyReader {
	/// The next raw byte, or `None` at end of input.
	fn next_byte(&mut self) -> Option<u8>;

	/// The next meaningful key event, or `None` at end of input.
	///
	/// Bytes the editor ignores are swallowed here so callers only ever see
	/// keys they have to act on.
	fn read_key(&mut self) -> Option<Key> {
		loop {
			let byte = self.next_byte()?;
			if byte == 0x1b {
				if let Some(key) = self.read_escape() {
					return Some(key);
				}
				continue;
			}
			if let Some(key) = Key::from_byte(byte) {
				return Some(key);
			}
		}
	}

	/// Assemble the tail of an `ESC [ x` sequence into an arrow key.
	///
	/// Unrecognized sequences are dropped; the two bytes they consumed are
	/// gone, which is the usual tradeoff for escape decoding without
	/// timeouts.
	fn read_escape(&mut self) -> Option<Key> {
		if self.next_byte()? != b'[' {
			return None;
		}
		match self.next_byte()? {
			b'A' => Some(Key::Up),
			b'B' => Some(Key::Down),
			b'C' => Some(Key::Right),
			b'D' => Some(Key::Left),
			_ => None,
		}
	}
}

/// Reads keystrokes from descriptor 0, one byte per read.
pub struct TermReader {
	stdin: io::Stdin,
}

impl TermReader {
	pub fn new() -> Self {
		Self { stdin: io::stdin() }
	}
}

impl Default for TermReader {
	fn default() -> Self {
		Self::new()
	}
}

impl KeyReader for TermReader {
	fn next_byte(&mut self) -> Option<u8> {
		let mut byte = [0u8; 1];
		loop {
			match self.stdin.read(&mut byte) {
				Ok(0) => return None,
				Ok(_) => return Some(byte[0]),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => {
					trace!("read on stdin failed: {e}");
					return None;
				}
			}
		}
	}
}

/// Replays a fixed byte sequence. Used by the editor tests.
#[derive(Default, Debug)]
pub struct ScriptedReader {
	bytes: VecDeque<u8>,
}

impl ScriptedReader {
	pub fn from_bytes(bytes: &[u8]) -> Self {
		Self { bytes: bytes.iter().copied().collect() }
	}
}

impl KeyReader for ScriptedReader {
	fn next_byte(&mut self) -> Option<u8> {
		self.bytes.pop_front()
	}
}

/// Puts stdin into non-canonical, no-echo mode for its lifetime.
///
/// When stdin is not a tty (input piped in), there is nothing to configure
/// and nothing to restore; the guard is inert and the shell just consumes
/// the pipe byte by byte.
pub struct RawMode {
	saved: Option<Termios>,
}

impl RawMode {
	pub fn enter() -> Self {
		let stdin = io::stdin();
		let Ok(mut term) = termios::tcgetattr(stdin.as_fd()) else {
			return Self { saved: None };
		};
		let saved = term.clone();
		term.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
		term.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
		term.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
		if termios::tcsetattr(stdin.as_fd(), SetArg::TCSANOW, &term).is_err() {
			return Self { saved: None };
		}
		trace!("entered raw mode");
		Self { saved: Some(saved) }
	}
}

impl Drop for RawMode {
	fn drop(&mut self) {
		if let Some(saved) = self.saved.take() {
			termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSANOW, &saved).ok();
		}
	}
}
