//! Everything that should stop a task from being created.

use serde_json::json;

use crate::common::TestContext;

#[test]
fn test_two_owners_rejected_before_lookup() {
	let ctx = TestContext::new();
	ctx.edited("Title:\nx\n\nOwner:\nalice, bob\n");

	let (status, _, stderr) = ctx.run(&[]);
	assert!(!status.success());
	assert!(stderr.contains("you should specify just 1 owner got: 2"), "stderr: {stderr}");
	assert!(stderr.contains("Your task text was kept at"), "stderr: {stderr}");
	assert!(ctx.arc_calls().is_empty());
}

#[test]
fn test_unknown_user_aborts() {
	let ctx = TestContext::new();
	ctx.edited("Title:\nx\n\nCC:\nmallory\n");

	let (status, _, stderr) = ctx.run(&[]);
	assert!(!status.success());
	assert!(stderr.contains(r#"unable to find the phid of "@mallory""#), "stderr: {stderr}");
	assert!(ctx.create_request().is_none());
}

#[test]
fn test_remote_error_message_reported() {
	let ctx = TestContext::new();
	ctx.create_response(&json!({"error": "ERR-CONDUIT-CORE", "errorMessage": "Title must not be empty.", "response": {}}));
	ctx.edited("Description:\nno title\n");

	let (status, stdout, stderr) = ctx.run(&[]);
	assert!(!status.success());
	assert!(stderr.contains("Title must not be empty."), "stderr: {stderr}");
	assert!(!stdout.contains("successfully created"));
	assert_eq!(ctx.create_request().unwrap(), json!({"description": "no title"}));
}

#[test]
fn test_failing_editor_aborts() {
	let ctx = TestContext::new();

	let (status, _, stderr) = ctx.run_with_editor("false", &[]);
	assert!(!status.success());
	assert!(stderr.contains("editing session failed"), "stderr: {stderr}");
	assert!(ctx.arc_calls().is_empty());
}
