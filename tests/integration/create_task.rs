//! Happy paths: a filled-in template ends up as a `maniphest.createtask` call.

use serde_json::json;

use crate::common::TestContext;

fn phab_directory(ctx: &TestContext) {
	ctx.lookup_response(&json!({
		"error": null,
		"errorMessage": null,
		"response": {
			"@alice": {"phid": "PHID-USER-alice", "name": "alice"},
			"@bob": {"phid": "PHID-USER-bob", "name": "bob"},
			"#backend": {"phid": "PHID-PROJ-backend", "name": "backend"},
			"#ops": {"phid": "PHID-PROJ-ops", "name": "ops"}
		}
	}));
}

#[test]
fn test_full_template_creates_task() {
	let ctx = TestContext::new();
	phab_directory(&ctx);
	ctx.create_response(&json!({
		"error": null,
		"errorMessage": null,
		"response": {"uri": "https://phab.example/T42", "objectName": "T42", "phid": "PHID-TASK-42"}
	}));
	ctx.edited("Title:\nFix login\n\nDescription:\nBroken since deploy.\nSee logs.\n\nOwner:\nalice\n\nCC:\n@bob\n\nProjects:\nops, #backend\n\nPriority:\n90\n\nPoints:\n3\n");

	let (status, stdout, stderr) = ctx.run(&["--", "--conduit-uri", "https://phab.example"]);
	assert!(status.success(), "stderr: {stderr}");
	assert_eq!(stdout.trim(), "Task T42 successfully created at https://phab.example/T42");

	assert_eq!(
		ctx.create_request().unwrap(),
		json!({
			"title": "Fix login",
			"description": "Broken since deploy.\nSee logs.",
			"ownerPHID": "PHID-USER-alice",
			"ccPHIDs": ["PHID-USER-bob"],
			"priority": "90",
			"projectPHIDs": ["PHID-PROJ-ops", "PHID-PROJ-backend"],
			"points": "3"
		})
	);
	assert_eq!(
		ctx.lookup_requests(),
		[json!({"names": ["@alice"]}), json!({"names": ["@bob"]}), json!({"names": ["#ops", "#backend"]})]
	);

	let calls = ctx.arc_calls();
	assert_eq!(calls.len(), 4);
	assert!(calls[..3].iter().all(|c| c == "call-conduit phid.lookup"));
	assert_eq!(calls[3], "call-conduit --conduit-uri https://phab.example maniphest.createtask");

	let editor_launch = format!("Executing sh {}", ctx.dir.path().join("editor.sh").display());
	assert!(ctx.trace_messages().iter().any(|m| m.starts_with(&editor_launch)));
}

#[test]
fn test_title_only_skips_lookups() {
	let ctx = TestContext::new();
	ctx.create_response(&json!({"response": {"uri": "https://phab.example/T7", "objectName": "T7"}}));
	ctx.edited("Title:\nJust a title\n\nDescription:\n\nOwner:\n\nCC:\n\nProjects:\n\nPriority:\n\nPoints:\n");

	let (status, stdout, stderr) = ctx.run(&[]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("Task T7 successfully created"));
	assert_eq!(ctx.create_request().unwrap(), json!({"title": "Just a title"}));
	assert!(ctx.lookup_requests().is_empty());
}

#[test]
fn test_dry_run_prints_payload() {
	let ctx = TestContext::new();
	phab_directory(&ctx);
	ctx.edited("Title:\nFix login\n\nOwner:\n@alice\n");

	let (status, stdout, stderr) = ctx.run(&["--dry-run"]);
	assert!(status.success(), "stderr: {stderr}");
	let payload: serde_json::Value = serde_json::from_str(&stdout).unwrap();
	assert_eq!(payload, json!({"title": "Fix login", "ownerPHID": "PHID-USER-alice"}));
	assert!(ctx.create_request().is_none());
}

#[test]
fn test_file_input_bypasses_editor() {
	let ctx = TestContext::new();
	phab_directory(&ctx);
	ctx.create_response(&json!({"response": {"uri": "https://phab.example/T9", "objectName": "T9"}}));
	let task_file = ctx.dir.path().join("prepared.md");
	std::fs::write(&task_file, "Title:\nFrom a file\n\nProjects:\nbackend\n").unwrap();

	let (status, stdout, stderr) = ctx.run_with_editor("false", &["--file", task_file.to_str().unwrap()]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stdout.contains("T9"));
	assert_eq!(ctx.create_request().unwrap(), json!({"title": "From a file", "projectPHIDs": ["PHID-PROJ-backend"]}));
}

#[test]
fn test_untouched_template_creates_nothing() {
	let ctx = TestContext::new();
	ctx.edited(mktask::TEMPLATE);

	let (status, _, stderr) = ctx.run(&[]);
	assert!(status.success(), "stderr: {stderr}");
	assert!(stderr.contains("Nothing filled in"));
	assert!(ctx.arc_calls().is_empty());
}

