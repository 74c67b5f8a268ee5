//! Conduit over HTTP, for machines without arcanist.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::{CREATE_TASK, Conduit, ConduitError, CreatedTask, PHID_LOOKUP, PhidMap, check_remote_error, decode_payload};
use crate::task::TaskSpec;

/// Envelope of `/api/<method>` responses.
#[derive(Debug, Deserialize)]
struct HttpResponse {
	#[serde(default)]
	result: Option<Value>,
	error_code: Option<String>,
	error_info: Option<String>,
}

/// Talks to `<uri>/api/<method>` directly, authenticating with an API token.
pub struct HttpConduit {
	http_client: Client,
	api_uri: String,
	token: String,
}

impl HttpConduit {
	pub fn new(uri: &str, token: &str, timeout: Option<Duration>) -> Result<Self, ConduitError> {
		let mut builder = Client::builder().user_agent(concat!("mktask/", env!("CARGO_PKG_VERSION")));
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		let http_client = builder.build().map_err(|source| ConduitError::Http {
			method: "client".to_owned(),
			source,
		})?;

		Ok(Self {
			http_client,
			api_uri: uri.trim_end_matches('/').to_owned(),
			token: token.to_owned(),
		})
	}

	fn endpoint(&self, method: &str) -> String {
		format!("{}/api/{method}", self.api_uri)
	}

	/// `params` as Conduit expects them: the call arguments plus the `__conduit__` auth block.
	fn params(&self, mut params: Value) -> Value {
		if let Value::Object(map) = &mut params {
			map.insert("__conduit__".to_owned(), json!({ "token": self.token }));
		}
		params
	}

	async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>, ConduitError> {
		let http_err = |source| ConduitError::Http {
			method: method.to_owned(),
			source,
		};
		let params = self.params(params).to_string();

		tracing::debug!(endpoint = %self.endpoint(method), "calling conduit");
		let res = self
			.http_client
			.post(self.endpoint(method))
			.form(&[("params", params.as_str()), ("output", "json"), ("__conduit__", "1")])
			.send()
			.await
			.map_err(http_err)?;

		if !res.status().is_success() {
			let status = res.status();
			let body = res.text().await.unwrap_or_default();
			return Err(ConduitError::HttpStatus {
				method: method.to_owned(),
				status,
				body,
			});
		}

		let bytes = res.bytes().await.map_err(http_err)?;
		decode_response(method, &bytes)
	}
}

fn decode_response<T: DeserializeOwned>(method: &str, body: &[u8]) -> Result<Option<T>, ConduitError> {
	let envelope: HttpResponse = serde_json::from_slice(body).map_err(|source| ConduitError::Decode {
		method: method.to_owned(),
		source,
	})?;
	check_remote_error(method, envelope.error_code.as_deref(), envelope.error_info.as_deref())?;
	decode_payload(method, envelope.result)
}

#[async_trait]
impl Conduit for HttpConduit {
	async fn lookup(&self, names: &[String]) -> Result<PhidMap, ConduitError> {
		let response: Option<PhidMap> = self.call(PHID_LOOKUP, json!({ "names": names })).await?;
		Ok(response.unwrap_or_default())
	}

	async fn create_task(&self, task: &TaskSpec) -> Result<CreatedTask, ConduitError> {
		let params = serde_json::to_value(task).map_err(|source| ConduitError::Encode {
			method: CREATE_TASK.to_owned(),
			source,
		})?;
		tracing::info!(uri = %self.api_uri, "sending task to conduit");
		self.call(CREATE_TASK, params).await?.ok_or_else(|| ConduitError::EmptyResponse { method: CREATE_TASK.to_owned() })
	}
}
