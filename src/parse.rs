//! Recursive-descent parser for the command language.
//!
//! The grammar, in the order the functions below call each other:
//!
//! ```text
//! line   = pipe ('&'*) (';' line)?
//! pipe   = exec ('|' pipe)?
//! exec   = '(' line ')' redirs
//!        | redirs (WORD redirs)*
//! redirs = ( ('<' | '>' | '>>') WORD )*
//! ```
//!
//! `;` and `|` are right-associative. Trailing `&` wraps the pipe in a
//! `Back` node, once per `&`. All failures come back as a `ParseError`
//! rather than tearing the shell down, so the REPL can report the problem
//! and re-prompt.

use std::fmt::Display;

use log::trace;

use crate::cmd::{Cmd, MAX_ARGS, RedirMode};
use crate::token::{Lexer, Token, TokenKind};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ParseError {
	/// A redirection operator with no word after it.
	MissingRedirTarget,
	/// A parenthesized block that never saw its `)`.
	UnclosedParen,
	/// One exec node with `MAX_ARGS` or more words.
	TooManyArgs,
	/// An operator where a word was required.
	UnexpectedToken(String),
	/// The top-level line completed with input left over.
	TrailingInput(String),
}

impl Display for ParseError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::MissingRedirTarget => write!(f, "missing file for redirection"),
			Self::UnclosedParen => write!(f, "missing )"),
			Self::TooManyArgs => write!(f, "too many args"),
			Self::UnexpectedToken(tok) => write!(f, "syntax error near '{tok}'"),
			Self::TrailingInput(rest) => write!(f, "leftovers: {rest}"),
		}
	}
}

impl std::error::Error for ParseError {}

/// Parse one full input line into a command tree.
pub fn parse(line: &str) -> Result<Cmd, ParseError> {
	let mut lexer = Lexer::new(line);
	let cmd = parse_line(&mut lexer)?;
	if !lexer.at_end() {
		return Err(ParseError::TrailingInput(lexer.rest().to_string()));
	}
	trace!("parsed '{line}' into: {cmd:?}");
	Ok(cmd)
}

fn parse_line(lexer: &mut Lexer<'_>) -> Result<Cmd, ParseError> {
	let mut cmd = parse_pipe(lexer)?;
	while lexer.peek_any(b"&") {
		lexer.next_token();
		cmd = Cmd::back(cmd);
	}
	if lexer.peek_any(b";") {
		lexer.next_token();
		cmd = Cmd::list(cmd, parse_line(lexer)?);
	}
	Ok(cmd)
}

fn parse_pipe(lexer: &mut Lexer<'_>) -> Result<Cmd, ParseError> {
	let mut cmd = parse_exec(lexer)?;
	if lexer.peek_any(b"|") {
		lexer.next_token();
		cmd = Cmd::pipe(cmd, parse_pipe(lexer)?);
	}
	Ok(cmd)
}

/// One pending redirection, recorded in source order.
///
/// The first redirection seen ends up innermost, so the descriptor opened
/// last wins when the same fd is redirected twice.
struct RedirSpec {
	file: String,
	mode: RedirMode,
	fd: i32,
}

fn parse_redirs(lexer: &mut Lexer<'_>) -> Result<Vec<RedirSpec>, ParseError> {
	let mut redirs = vec![];
	while lexer.peek_any(b"<>") {
		let op = lexer.next_token();
		let target = lexer.next_token();
		if target.kind != TokenKind::Word {
			return Err(ParseError::MissingRedirTarget);
		}
		let (mode, fd) = match op.kind {
			TokenKind::Less => (RedirMode::Read, 0),
			TokenKind::Great | TokenKind::Append => (RedirMode::Write, 1),
			_ => unreachable!("peeked a redirection operator, lexed {:?}", op.kind),
		};
		redirs.push(RedirSpec { file: target.text.to_string(), mode, fd });
	}
	Ok(redirs)
}

fn wrap_redirs(cmd: Cmd, redirs: Vec<RedirSpec>) -> Cmd {
	redirs
		.into_iter()
		.fold(cmd, |cmd, r| Cmd::redir(cmd, r.file, r.mode, r.fd))
}

fn parse_exec(lexer: &mut Lexer<'_>) -> Result<Cmd, ParseError> {
	if lexer.peek_any(b"(") {
		return parse_block(lexer);
	}

	let mut argv = vec![];
	let mut redirs = parse_redirs(lexer)?;
	while !lexer.peek_any(b"|)&;") {
		let tok = lexer.next_token();
		if tok.kind == TokenKind::End {
			break;
		}
		if tok.kind != TokenKind::Word {
			return Err(ParseError::UnexpectedToken(describe(tok)));
		}
		if argv.len() >= MAX_ARGS {
			return Err(ParseError::TooManyArgs);
		}
		argv.push(tok.text.to_string());
		redirs.extend(parse_redirs(lexer)?);
	}
	Ok(wrap_redirs(Cmd::exec(argv), redirs))
}

fn parse_block(lexer: &mut Lexer<'_>) -> Result<Cmd, ParseError> {
	lexer.next_token(); // the '(' we just peeked
	let cmd = parse_line(lexer)?;
	if !lexer.peek_any(b")") {
		return Err(ParseError::UnclosedParen);
	}
	lexer.next_token();
	let redirs = parse_redirs(lexer)?;
	Ok(wrap_redirs(cmd, redirs))
}

fn describe(tok: Token<'_>) -> String {
	if tok.text.is_empty() {
		format!("{:?}", tok.kind)
	} else {
		tok.text.to_string()
	}
}
