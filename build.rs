use std::process::Command;

fn main() {
	let git_hash = Command::new("git")
		.args(["rev-parse", "--short", "HEAD"])
		.output()
		.ok()
		.filter(|output| output.status.success())
		.and_then(|output| String::from_utf8(output.stdout).ok())
		.unwrap_or_else(|| "unknown".to_owned());
	println!("cargo:rustc-env=GIT_HASH={}", git_hash.trim());

	// Default log filter baked in at build time; RUST_LOG still overrides it at runtime
	println!("cargo:rerun-if-env-changed=MKTASK_LOG_DIRECTIVES");
	if let Ok(directives) = std::env::var("MKTASK_LOG_DIRECTIVES")
		&& !directives.trim().is_empty()
	{
		println!("cargo:rustc-env=LOG_DIRECTIVES={}", directives.trim());
	}
}
