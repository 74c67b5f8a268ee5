//! Access to the Phabricator Conduit API.
//!
//! Parsing and resolution only ever see the [`Conduit`] trait; the concrete transport is either the `arc call-conduit`
//! bridge ([`arc::ArcConduit`]) or direct HTTP ([`http::HttpConduit`]).

// False positive: fields ARE used via thiserror's #[error] format string expansion
#![allow(unused_assignments)]

pub mod arc;
pub mod http;

use std::{collections::HashMap, process::ExitStatus, sync::Arc, time::Duration};

use async_trait::async_trait;
use miette::Diagnostic;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use thiserror::Error;

use crate::{
	config::{ConduitSettings, Transport},
	task::TaskSpec,
};

pub const PHID_LOOKUP: &str = "phid.lookup";
pub const CREATE_TASK: &str = "maniphest.createtask";

/// One object returned by `phid.lookup`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct PhidObject {
	pub phid: String,
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default, rename = "fullName")]
	pub full_name: Option<String>,
	#[serde(default)]
	pub uri: Option<String>,
}

/// `phid.lookup` result, keyed by the requested name.
///
/// Conduit encodes an empty result as `[]` rather than `{}`, so both decode to an empty map.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PhidMap(pub HashMap<String, PhidObject>);

impl PhidMap {
	pub fn get(&self, name: &str) -> Option<&PhidObject> {
		self.0.get(name)
	}
}

impl<'de> Deserialize<'de> for PhidMap {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Encoded {
			Map(HashMap<String, PhidObject>),
			List(Vec<serde_json::Value>),
		}

		match Encoded::deserialize(deserializer)? {
			Encoded::Map(map) => Ok(Self(map)),
			Encoded::List(list) if list.is_empty() => Ok(Self::default()),
			Encoded::List(_) => Err(serde::de::Error::custom("expected an object keyed by name, got a non-empty list")),
		}
	}
}

/// What `maniphest.createtask` reports back.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CreatedTask {
	pub uri: String,
	#[serde(rename = "objectName")]
	pub object_name: String,
	#[serde(default)]
	pub phid: Option<String>,
}

#[derive(Debug, Diagnostic, Error)]
pub enum ConduitError {
	#[error("failed to launch `{program}`")]
	#[diagnostic(code(mktask::conduit::spawn), help("is arcanist installed and on PATH? `conduit.arc_command` in the config overrides it"))]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("i/o with `{program}` failed during `{method}`")]
	#[diagnostic(code(mktask::conduit::io))]
	Io {
		program: String,
		method: String,
		#[source]
		source: std::io::Error,
	},

	#[error("`{program}` exited with {status} during `{method}`")]
	#[diagnostic(code(mktask::conduit::exit))]
	Exit { program: String, method: String, status: ExitStatus },

	#[error("`{method}` did not finish within {timeout:?}")]
	#[diagnostic(code(mktask::conduit::timeout), help("raise or unset `conduit.timeout_secs`"))]
	Timeout { method: String, timeout: Duration },

	#[error("failed to encode the `{method}` request")]
	#[diagnostic(code(mktask::conduit::encode))]
	Encode {
		method: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("malformed `{method}` response")]
	#[diagnostic(code(mktask::conduit::decode))]
	Decode {
		method: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("`{method}` returned an empty response")]
	#[diagnostic(code(mktask::conduit::empty_response))]
	EmptyResponse { method: String },

	#[error("{message}")]
	#[diagnostic(code(mktask::conduit::remote))]
	Remote { method: String, message: String },

	#[error("request for `{method}` failed")]
	#[diagnostic(code(mktask::conduit::http))]
	Http {
		method: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("`{method}` failed with HTTP {status}: {body}")]
	#[diagnostic(code(mktask::conduit::http_status))]
	HttpStatus { method: String, status: reqwest::StatusCode, body: String },

	#[error("the http transport needs `conduit.{key}` to be set")]
	#[diagnostic(code(mktask::conduit::missing_setting), help("set `{key}` under [conduit] in the config file"))]
	MissingSetting { key: &'static str },

	#[error("`conduit.arc_command` is invalid")]
	#[diagnostic(code(mktask::conduit::command))]
	Command {
		#[source]
		source: shell_words::ParseError,
	},

	#[error("`conduit.arc_command` is empty")]
	#[diagnostic(code(mktask::conduit::empty_command))]
	EmptyCommand,
}

/// Turn the `error` / `errorMessage` pair every Conduit envelope carries into an error if either is set.
///
/// The message wins over the bare error code when both are present.
pub(crate) fn check_remote_error(method: &str, error: Option<&str>, message: Option<&str>) -> Result<(), ConduitError> {
	let error = error.filter(|s| !s.is_empty());
	let message = message.filter(|s| !s.is_empty());
	match message.or(error) {
		Some(text) => Err(ConduitError::Remote {
			method: method.to_owned(),
			message: text.to_owned(),
		}),
		None => Ok(()),
	}
}

/// Decode the `response` / `result` member of an envelope once any remote error has been ruled out.
///
/// Kept as raw JSON until then, so a remote error is reported even when the payload beside it is partial.
pub(crate) fn decode_payload<T: DeserializeOwned>(method: &str, payload: Option<serde_json::Value>) -> Result<Option<T>, ConduitError> {
	payload
		.filter(|v| !v.is_null())
		.map(serde_json::from_value)
		.transpose()
		.map_err(|source| ConduitError::Decode {
			method: method.to_owned(),
			source,
		})
}

//==============================================================================
// Conduit Trait
//==============================================================================

/// The two Conduit operations task creation needs.
#[async_trait]
pub trait Conduit: Send + Sync {
	/// Look up objects by name (`@user`, `#project`) in one batched `phid.lookup` call.
	async fn lookup(&self, names: &[String]) -> Result<PhidMap, ConduitError>;

	/// Create a task with `maniphest.createtask`.
	async fn create_task(&self, task: &TaskSpec) -> Result<CreatedTask, ConduitError>;
}

pub type BoxedConduit = Arc<dyn Conduit>;

/// Build the transport selected by `transport`.
///
/// `passthrough` is forwarded verbatim to `arc call-conduit` when creating the task; the http transport ignores it.
pub fn create_conduit(settings: &ConduitSettings, transport: Transport, passthrough: Vec<String>) -> Result<BoxedConduit, ConduitError> {
	let timeout = settings.timeout_secs.map(Duration::from_secs);
	match transport {
		Transport::Arc => {
			let conduit = arc::ArcConduit::from_command(&settings.arc_command, passthrough)?.timeout(timeout);
			Ok(Arc::new(conduit))
		}
		Transport::Http => {
			if !passthrough.is_empty() {
				tracing::warn!(?passthrough, "extra arguments are only used by the arc transport, ignoring them");
			}
			let uri = settings.uri.as_deref().ok_or(ConduitError::MissingSetting { key: "uri" })?;
			let token = settings.token.as_deref().ok_or(ConduitError::MissingSetting { key: "token" })?;
			Ok(Arc::new(http::HttpConduit::new(uri, token, timeout)?))
		}
	}
}
