use crate::history::{HISTORY_CAPACITY, History};
use pretty_assertions::assert_eq;

#[test]
fn stores_oldest_first() {
	let mut history = History::new();
	history.push("one");
	history.push("two");
	history.push("three");
	assert_eq!(history.len(), 3);
	assert_eq!(history.get(0), Some("one"));
	assert_eq!(history.get(2), Some("three"));
	assert_eq!(history.get(3), None);
}

#[test]
fn empty_lines_are_rejected() {
	let mut history = History::new();
	history.push("");
	assert!(history.is_empty());
}

#[test]
fn adjacent_duplicates_coalesce() {
	let mut history = History::new();
	history.push("ls");
	history.push("ls");
	history.push("ls");
	assert_eq!(history.len(), 1);
}

#[test]
fn non_adjacent_duplicates_are_kept() {
	let mut history = History::new();
	history.push("a");
	history.push("b");
	history.push("a");
	assert_eq!(history.len(), 3);
	assert_eq!(history.get(2), Some("a"));
}

#[test]
fn eviction_is_strictly_fifo() {
	let mut history = History::new();
	for i in 0..HISTORY_CAPACITY + 5 {
		history.push(&format!("cmd{i}"));
	}
	assert_eq!(history.len(), HISTORY_CAPACITY);
	assert_eq!(history.get(0), Some("cmd5"));
	assert_eq!(
		history.get(HISTORY_CAPACITY - 1),
		Some(format!("cmd{}", HISTORY_CAPACITY + 4).as_str())
	);
}

#[test]
fn capacity_never_exceeded() {
	let mut history = History::new();
	for i in 0..1000 {
		history.push(&format!("{i}"));
		assert!(history.len() <= HISTORY_CAPACITY);
	}
}
