//! The line editor.
//!
//! `LineEditor` owns the in-progress edit buffer and its cursor, and turns
//! a stream of key events into one finished line. Every mutation repaints
//! the visible line from scratch: carriage return, prompt, buffer contents,
//! enough blanks to erase a stale tail, then backspaces to park the
//! hardware cursor on the logical one. No terminal-control library, just
//! `\r`, spaces, and `\x08`.
//!
//! Arrow keys replay entries from the history. While navigating,
//! `hist_idx` walks the entries oldest-to-newest; `hist_idx == history.len()`
//! is the sentinel meaning "back on the live edit".

use std::io::{self, Write};

use crate::history::History;
use crate::keys::Key;
use crate::reader::KeyReader;

/// Capacity of the edit buffer. A line holds at most `CMD_SIZE - 1` bytes.
pub const CMD_SIZE: usize = 100;

#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
	Line(String),
	Eof,
}

#[derive(Default, Debug)]
pub struct LineEditor {
	/// The edit buffer. Only printable ASCII ever gets in, so byte count,
	/// char count, and on-screen cell count are all the same number.
	buf: String,
	/// Insertion point, in `0..=buf.len()`.
	cursor: usize,
	/// How many buffer cells the previous repaint left on screen.
	prev_len: usize,
}

impl LineEditor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Read one line, echoing edits to `out`.
	///
	/// The caller prints the prompt before the first keystroke; repaints
	/// re-emit it on every change. On Enter the finished line is offered to
	/// `history` and returned without its newline. End of input (or Ctrl-D
	/// on an empty buffer) yields `Eof`.
	pub fn read_line(
		&mut self,
		reader: &mut dyn KeyReader,
		history: &mut History,
		prompt: &str,
		out: &mut dyn Write,
	) -> ReadOutcome {
		self.buf.clear();
		self.cursor = 0;
		self.prev_len = 0;
		let mut hist_idx = history.len();

		loop {
			let Some(key) = reader.read_key() else {
				return ReadOutcome::Eof;
			};
			match key {
				Key::Enter => {
					out.write_all(b"\n").ok();
					out.flush().ok();
					history.push(&self.buf);
					return ReadOutcome::Line(std::mem::take(&mut self.buf));
				}
				Key::Left => {
					if self.cursor > 0 {
						self.cursor -= 1;
						self.repaint(prompt, out).ok();
					}
				}
				Key::Right => {
					if self.cursor < self.buf.len() {
						self.cursor += 1;
						self.repaint(prompt, out).ok();
					}
				}
				Key::Up => {
					if !history.is_empty() {
						hist_idx = hist_idx.saturating_sub(1);
						self.recall(history.get(hist_idx).unwrap_or_default());
						self.repaint(prompt, out).ok();
					}
				}
				Key::Down => {
					if !history.is_empty() {
						hist_idx = (hist_idx + 1).min(history.len());
						// At the sentinel the live edit is simply gone;
						// navigating overwrites it
						self.recall(history.get(hist_idx).unwrap_or_default());
						self.repaint(prompt, out).ok();
					}
				}
				Key::Backspace => {
					if self.cursor > 0 {
						self.buf.remove(self.cursor - 1);
						self.cursor -= 1;
						self.repaint(prompt, out).ok();
					}
				}
				Key::Char(ch) => {
					if self.buf.len() < CMD_SIZE - 1 {
						self.buf.insert(self.cursor, ch);
						self.cursor += 1;
						self.repaint(prompt, out).ok();
					}
				}
				Key::Eof => {
					if self.buf.is_empty() {
						return ReadOutcome::Eof;
					}
				}
			}
		}
	}

	/// Load a history entry (or the empty sentinel) into the buffer, cursor
	/// at the end.
	fn recall(&mut self, entry: &str) {
		self.buf.clear();
		self.buf.push_str(entry);
		self.cursor = self.buf.len();
	}

	/// Redraw the whole visible line and re-park the cursor.
	fn repaint(&mut self, prompt: &str, out: &mut dyn Write) -> io::Result<()> {
		write!(out, "\r{prompt}")?;
		out.write_all(self.buf.as_bytes())?;

		// Blank out whatever the previous paint left past our new end,
		// then back up over the blanks
		let stale = self.prev_len.saturating_sub(self.buf.len());
		for _ in 0..stale {
			out.write_all(b" ")?;
		}
		for _ in 0..stale {
			out.write_all(b"\x08")?;
		}

		for _ in 0..self.buf.len() - self.cursor {
			out.write_all(b"\x08")?;
		}

		self.prev_len = self.buf.len();
		out.flush()
	}
}
