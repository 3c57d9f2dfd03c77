use crate::cmd::Cmd;

pub mod history;

/// Shorthand for building the `Exec` node the parser should produce.
pub fn exec(args: &[&str]) -> Cmd {
	Cmd::exec(args.iter().map(|s| s.to_string()).collect())
}
