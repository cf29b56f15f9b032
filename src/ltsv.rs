// Key value logging macros

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

pub type Tags<'a> = Vec<(&'static str, &'a str)>;

// debug! lines are dropped unless this is set
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(verbose: bool) {
	VERBOSE.store(verbose, Ordering::SeqCst);
}

pub fn verbose() -> bool {
	VERBOSE.load(Ordering::SeqCst)
}

// The tags macro is essentially the same as vec![]
// Where the elements are of type (&'static str, &str)

#[macro_export]
macro_rules! tags {
	($($x:expr),*) => {
		vec![
			$($x),*
		]
	};
}

#[macro_export]
macro_rules! info {
	($msg:expr) => {
		$crate::ltsv::log("info", $msg, $crate::ltsv::Tags::new())
	};
	($msg:expr, $kvs:expr) => {
		$crate::ltsv::log("info", $msg, $kvs)
	};
}

#[macro_export]
macro_rules! warn {
	($msg:expr) => {
		$crate::ltsv::log("warn", $msg, $crate::ltsv::Tags::new())
	};
	($msg:expr, $kvs:expr) => {
		$crate::ltsv::log("warn", $msg, $kvs)
	};
}

#[macro_export]
macro_rules! error {
	($msg:expr) => {
		$crate::ltsv::log("error", $msg, $crate::ltsv::Tags::new())
	};
	($msg:expr, $kvs:expr) => {
		$crate::ltsv::log("error", $msg, $kvs)
	};
}

// Tags are only built when verbose mode is on,
// this runs once per frame.
#[macro_export]
macro_rules! debug {
	($msg:expr) => {
		if $crate::ltsv::verbose() {
			$crate::ltsv::log("debug", $msg, $crate::ltsv::Tags::new())
		}
	};
	($msg:expr, $kvs:expr) => {
		if $crate::ltsv::verbose() {
			$crate::ltsv::log("debug", $msg, $kvs)
		}
	};
}

fn ltsv_encode(buf: &mut String, key: &str, value: &str) {
	escape_into(buf, key);
	buf.push('=');
	escape_into(buf, value);
}

fn escape_into(buf: &mut String, s: &str) {
	for c in s.chars() {
		if c == '\\' || c == '\n' || c == '\t' || c == '=' {
			buf.push('\\');
		}
		buf.push(c)
	}
}

pub fn format_line(thread: &str,
	               level: &str,
	               msg: &str,
	               tags: &[(&str, &str)]) -> String {
	let mut log_line = String::with_capacity(1024);
	// The first entry is the thread name
	ltsv_encode(&mut log_line, "thread", thread);

	// The second tag is the level
	log_line.push('\t');
	ltsv_encode(&mut log_line, "level", level);

	// The third tag is the message
	log_line.push('\t');
	ltsv_encode(&mut log_line, "msg", msg);

	for (key, value) in tags.iter() {
		log_line.push('\t');
		ltsv_encode(&mut log_line, key, value);
	}
	log_line
}

pub fn log(level: &'static str,
	       msg: &str,
	       tags: Tags) {
	let current = thread::current();
	let name = current.name().unwrap_or("unnamed");
	println!("{}", format_line(name, level, msg, &tags));
}
