//! Shared test infrastructure for integration tests.
//!
//! Provides `TestContext`, which owns a temp directory holding:
//! - an editor script that replaces the template with prepared text
//! - a fake `arc` that answers `phid.lookup` / `maniphest.createtask` from canned JSON and records every call
//!
//! # Example
//!
//! ```ignore
//! let ctx = TestContext::new();
//! ctx.edited("Title:\nFix bug\n");
//! ctx.create_response(&json!({"response": {"uri": "https://phab.example/T1", "objectName": "T1"}}));
//!
//! let (status, stdout, _) = ctx.run(&[]);
//! assert!(status.success());
//! ```

use std::{
	path::PathBuf,
	process::{Command, ExitStatus, Stdio},
};

use tempfile::TempDir;

const FAKE_ARC: &str = r#"dir=$(dirname "$0")
method=""
for arg in "$@"; do method="$arg"; done
echo "$@" >> "$dir/arc_calls.log"
case "$method" in
	phid.lookup)
		{ cat; echo; } >> "$dir/lookup_requests.jsonl"
		cat "$dir/lookup_response.json"
		;;
	maniphest.createtask)
		cat > "$dir/create_request.json"
		cat "$dir/create_response.json"
		;;
	*)
		echo "unexpected method $method" >&2
		exit 2
		;;
esac
"#;

const FAKE_EDITOR: &str = r#"cat "$(dirname "$0")/edited.txt" > "$1"
"#;

pub struct TestContext {
	pub dir: TempDir,
}

impl TestContext {
	pub fn new() -> Self {
		let dir = tempfile::tempdir().unwrap();
		std::fs::write(dir.path().join("arc.sh"), FAKE_ARC).unwrap();
		std::fs::write(dir.path().join("editor.sh"), FAKE_EDITOR).unwrap();
		std::fs::write(dir.path().join("lookup_response.json"), r#"{"error": null, "errorMessage": null, "response": []}"#).unwrap();
		Self { dir }
	}

	fn path(&self, name: &str) -> PathBuf {
		self.dir.path().join(name)
	}

	/// Text the fake editor leaves in the task file.
	pub fn edited(&self, text: &str) {
		std::fs::write(self.path("edited.txt"), text).unwrap();
	}

	pub fn lookup_response(&self, response: &serde_json::Value) {
		std::fs::write(self.path("lookup_response.json"), response.to_string()).unwrap();
	}

	pub fn create_response(&self, response: &serde_json::Value) {
		std::fs::write(self.path("create_response.json"), response.to_string()).unwrap();
	}

	/// Run the binary with the fake editor and arc.
	///
	/// Returns (exit_status, stdout, stderr) for easy assertions.
	pub fn run(&self, args: &[&str]) -> (ExitStatus, String, String) {
		self.run_with_editor(&format!("sh {}", self.path("editor.sh").display()), args)
	}

	pub fn run_with_editor(&self, editor: &str, args: &[&str]) -> (ExitStatus, String, String) {
		let output = Command::new(env!("CARGO_BIN_EXE_mktask"))
			.args(args)
			.env("EDITOR", editor)
			.env("MKTASK_CONDUIT__ARC_COMMAND", format!("sh {}", self.path("arc.sh").display()))
			.env("XDG_CONFIG_HOME", self.path("config"))
			.env("NO_COLOR", "1")
			.env("MKTASK_TRACE_FILE", self.path("trace.jsonl"))
			.env_remove("RUST_LOG")
			.stdin(Stdio::null())
			.output()
			.unwrap();
		(
			output.status,
			String::from_utf8_lossy(&output.stdout).into_owned(),
			String::from_utf8_lossy(&output.stderr).into_owned(),
		)
	}

	/// Argument lines `arc` was called with, one per call.
	pub fn arc_calls(&self) -> Vec<String> {
		std::fs::read_to_string(self.path("arc_calls.log")).unwrap_or_default().lines().map(str::to_owned).collect()
	}

	/// Every `phid.lookup` request body, in call order.
	pub fn lookup_requests(&self) -> Vec<serde_json::Value> {
		std::fs::read_to_string(self.path("lookup_requests.jsonl"))
			.unwrap_or_default()
			.lines()
			.filter(|l| !l.is_empty())
			.map(|l| serde_json::from_str(l).unwrap())
			.collect()
	}

	/// The `maniphest.createtask` payload, if the task was submitted.
	pub fn create_request(&self) -> Option<serde_json::Value> {
		let content = std::fs::read_to_string(self.path("create_request.json")).ok()?;
		Some(serde_json::from_str(&content).unwrap())
	}

	/// Messages of every JSON trace event the last run emitted.
	pub fn trace_messages(&self) -> Vec<String> {
		std::fs::read_to_string(self.path("trace.jsonl"))
			.unwrap_or_default()
			.lines()
			.filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
			.filter_map(|event| event["fields"]["message"].as_str().map(str::to_owned))
			.collect()
	}
}
