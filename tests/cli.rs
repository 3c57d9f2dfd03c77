//! End-to-end tests that drive the compiled shell through a pipe.
//!
//! Prompts and line-editor repaints go to stderr, so stdout carries only
//! what the executed commands produce. EOF on stdin ends the session.

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::time::Instant;

fn run_shell(input: &[u8]) -> Output {
	let mut child = Command::new(env!("CARGO_BIN_EXE_marsh"))
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to spawn marsh");
	child
		.stdin
		.take()
		.unwrap()
		.write_all(input)
		.expect("failed to write to marsh stdin");
	child.wait_with_output().expect("failed to wait for marsh")
}

fn stdout_of(input: &str) -> String {
	String::from_utf8_lossy(&run_shell(input.as_bytes()).stdout).into_owned()
}

#[test]
fn runs_a_simple_command() {
	assert_eq!(stdout_of("echo hello\n"), "hello\n");
}

#[test]
fn pipes_producer_into_consumer() {
	// 'a' plus the newline echo appends
	assert_eq!(stdout_of("echo a | wc -c\n").trim(), "2");
}

#[test]
fn multi_stage_pipeline() {
	assert_eq!(stdout_of("echo one two | wc -w | wc -l\n").trim(), "1");
}

#[test]
fn redirects_stdout_then_reads_it_back() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("x");
	let path = path.display();
	assert_eq!(stdout_of(&format!("echo x > {path} ; cat {path}\n")), "x\n");
}

#[test]
fn redirects_stdin_from_a_file() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("in");
	fs::write(&path, "contents\n").unwrap();
	assert_eq!(stdout_of(&format!("cat < {}\n", path.display())), "contents\n");
}

#[test]
fn overwrite_truncates_previous_contents() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("f");
	fs::write(&path, "something much longer than the new contents\n").unwrap();
	let path = path.display();
	assert_eq!(stdout_of(&format!("echo hi > {path} ; cat {path}\n")), "hi\n");
}

#[test]
fn grouped_commands_share_a_pipe() {
	assert_eq!(stdout_of("(echo a ; echo b) | wc -l\n").trim(), "2");
}

#[test]
fn list_runs_left_before_right() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("seq");
	let path = path.display();
	// Both stages append to the same file through the shell's own fork
	// ordering; a reversed or overlapped run could not produce 'a' first
	assert_eq!(
		stdout_of(&format!("echo a > {path} ; cat {path} ; echo b\n")),
		"a\nb\n"
	);
}

#[test]
fn background_command_does_not_block_the_repl() {
	// sleep's stdout is parked on /dev/null so the only pipe the test
	// waits on is the shell's own
	let start = Instant::now();
	let mut child = Command::new(env!("CARGO_BIN_EXE_marsh"))
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::null())
		.spawn()
		.expect("failed to spawn marsh");
	child
		.stdin
		.take()
		.unwrap()
		.write_all(b"sleep 5 > /dev/null &\necho done\n")
		.unwrap();
	let out = child.wait_with_output().unwrap();
	assert_eq!(String::from_utf8_lossy(&out.stdout), "done\n");
	assert!(
		start.elapsed().as_secs() < 4,
		"shell waited for a backgrounded command"
	);
}

#[test]
fn syntax_errors_do_not_kill_the_repl() {
	let out = run_shell(b"echo >\necho ok\n");
	assert_eq!(String::from_utf8_lossy(&out.stdout), "ok\n");
	let stderr = String::from_utf8_lossy(&out.stderr);
	assert!(stderr.contains("missing file for redirection"), "stderr was: {stderr}");
}

#[test]
fn too_many_args_is_reported() {
	let out = run_shell(b"echo 1 2 3 4 5 6 7 8 9 10 11\necho ok\n");
	assert_eq!(String::from_utf8_lossy(&out.stdout), "ok\n");
	assert!(String::from_utf8_lossy(&out.stderr).contains("too many args"));
}

#[test]
fn failed_exec_is_reported() {
	let out = run_shell(b"definitely-not-a-command-xyz\necho still here\n");
	assert_eq!(String::from_utf8_lossy(&out.stdout), "still here\n");
	assert!(
		String::from_utf8_lossy(&out.stderr)
			.contains("exec definitely-not-a-command-xyz failed")
	);
}

#[test]
fn pwd_and_cd_track_the_display_path() {
	assert_eq!(stdout_of("pwd\ncd /\npwd\ncd tmp\npwd\n"), "~/\n/\n/tmp\n");
}

#[test]
fn failed_cd_leaves_the_shell_alive() {
	let out = run_shell(b"cd /definitely-not-a-dir-xyz\necho alive\n");
	assert_eq!(String::from_utf8_lossy(&out.stdout), "alive\n");
	assert!(String::from_utf8_lossy(&out.stderr).contains("cannot cd"));
}

#[test]
fn empty_lines_are_harmless() {
	assert_eq!(stdout_of("\n\necho after\n"), "after\n");
}

#[test]
fn up_arrow_reruns_the_previous_command() {
	// 0xE2 is the pre-decoded up-arrow byte
	let out = run_shell(b"echo first\n\xe2\n");
	assert_eq!(String::from_utf8_lossy(&out.stdout), "first\nfirst\n");
}

#[test]
fn up_up_recalls_the_older_command() {
	let out = run_shell(b"echo one\necho two\n\xe2\xe2\n");
	assert_eq!(String::from_utf8_lossy(&out.stdout), "one\ntwo\none\n");
}

#[test]
fn clear_emits_the_vt100_sequence() {
	assert_eq!(stdout_of("clear\n"), "\x1b[2J\x1b[H");
}
