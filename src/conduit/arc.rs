//! Conduit over the `arc call-conduit` bridge.

use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::{io::AsyncWriteExt, process::Command};

use super::{CREATE_TASK, Conduit, ConduitError, CreatedTask, PHID_LOOKUP, PhidMap, check_remote_error, decode_payload};
use crate::task::TaskSpec;

/// Envelope `arc call-conduit` prints on stdout.
#[derive(Debug, Deserialize)]
struct ArcResponse {
	#[serde(default)]
	error: Option<String>,
	#[serde(default, rename = "errorMessage")]
	error_message: Option<String>,
	#[serde(default)]
	response: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct LookupRequest<'a> {
	names: &'a [String],
}

/// Runs `arc call-conduit`, one subprocess per call.
///
/// The request goes to the child's stdin and the envelope is read from its stdout; stderr is left attached to ours so
/// arcanist's own complaints reach the user.
#[derive(Clone, Debug)]
pub struct ArcConduit {
	program: String,
	leading_args: Vec<String>,
	passthrough: Vec<String>,
	timeout: Option<Duration>,
}

impl ArcConduit {
	pub fn new(program: impl Into<String>, passthrough: Vec<String>) -> Self {
		Self {
			program: program.into(),
			leading_args: Vec::new(),
			passthrough,
			timeout: None,
		}
	}

	/// Build from a shell-style command line, e.g. `arc` or `php /opt/arcanist/bin/arc`.
	pub fn from_command(command: &str, passthrough: Vec<String>) -> Result<Self, ConduitError> {
		let mut parts = shell_words::split(command).map_err(|source| ConduitError::Command { source })?;
		if parts.is_empty() {
			return Err(ConduitError::EmptyCommand);
		}
		let program = parts.remove(0);
		Ok(Self {
			leading_args: parts,
			..Self::new(program, passthrough)
		})
	}

	pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;
		self
	}

	/// Arguments for a call to `method`.
	///
	/// Passthrough arguments only go to `maniphest.createtask`; lookups always run as `call-conduit phid.lookup`.
	pub fn command_args(&self, method: &str) -> Vec<String> {
		let mut args = self.leading_args.clone();
		args.push("call-conduit".to_owned());
		if method == CREATE_TASK {
			args.extend(self.passthrough.iter().cloned());
		}
		args.push(method.to_owned());
		args
	}

	async fn call<Req, Resp>(&self, method: &str, request: &Req) -> Result<Option<Resp>, ConduitError>
	where
		Req: Serialize + Sync,
		Resp: DeserializeOwned + Send, {
		let body = serde_json::to_vec(request).map_err(|source| ConduitError::Encode {
			method: method.to_owned(),
			source,
		})?;

		let args = self.command_args(method);
		tracing::debug!(program = %self.program, ?args, "running conduit bridge");

		let exchange = self.exchange(method, &args, body);
		let stdout = match self.timeout {
			Some(timeout) => tokio::time::timeout(timeout, exchange).await.map_err(|_| ConduitError::Timeout {
				method: method.to_owned(),
				timeout,
			})??,
			None => exchange.await?,
		};

		decode_response(method, &stdout)
	}

	/// Feed `body` to the bridge and collect its stdout.
	async fn exchange(&self, method: &str, args: &[String], body: Vec<u8>) -> Result<Vec<u8>, ConduitError> {
		let io_err = |source| ConduitError::Io {
			program: self.program.clone(),
			method: method.to_owned(),
			source,
		};

		let mut child = Command::new(&self.program)
			.args(args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::inherit())
			.kill_on_drop(true)
			.spawn()
			.map_err(|source| ConduitError::Spawn {
				program: self.program.clone(),
				source,
			})?;

		let mut stdin = child.stdin.take().ok_or_else(|| io_err(std::io::Error::other("stdin was not captured")))?;
		let write = async move {
			stdin.write_all(&body).await?;
			stdin.shutdown().await
		};
		let (written, output) = tokio::join!(write, child.wait_with_output());
		let output = output.map_err(io_err)?;

		if !output.status.success() {
			return Err(ConduitError::Exit {
				program: self.program.clone(),
				method: method.to_owned(),
				status: output.status,
			});
		}
		written.map_err(io_err)?;

		Ok(output.stdout)
	}
}

/// Decode an `arc call-conduit` envelope, surfacing remote errors before looking at the response.
fn decode_response<T: DeserializeOwned>(method: &str, stdout: &[u8]) -> Result<Option<T>, ConduitError> {
	let envelope: ArcResponse = serde_json::from_slice(stdout).map_err(|source| ConduitError::Decode {
		method: method.to_owned(),
		source,
	})?;
	check_remote_error(method, envelope.error.as_deref(), envelope.error_message.as_deref())?;
	decode_payload(method, envelope.response)
}

#[async_trait]
impl Conduit for ArcConduit {
	async fn lookup(&self, names: &[String]) -> Result<PhidMap, ConduitError> {
		let response: Option<PhidMap> = self.call(PHID_LOOKUP, &LookupRequest { names }).await?;
		Ok(response.unwrap_or_default())
	}

	async fn create_task(&self, task: &TaskSpec) -> Result<CreatedTask, ConduitError> {
		tracing::info!(program = %self.program, "sending task to conduit");
		self.call(CREATE_TASK, task).await?.ok_or_else(|| ConduitError::EmptyResponse { method: CREATE_TASK.to_owned() })
	}
}
