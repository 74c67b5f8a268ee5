//! The payload sent to `maniphest.createtask`.

use serde::Serialize;

/// Resolved task fields. Unset fields are left out of the payload entirely.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TaskSpec {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(rename = "ownerPHID", skip_serializing_if = "Option::is_none")]
	pub owner_phid: Option<String>,
	#[serde(rename = "ccPHIDs", skip_serializing_if = "Option::is_none")]
	pub cc_phids: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub priority: Option<String>,
	#[serde(rename = "projectPHIDs", skip_serializing_if = "Option::is_none")]
	pub project_phids: Option<Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub points: Option<String>,
}

impl TaskSpec {
	/// Nothing was filled in.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}
