//! Settings, layered from defaults, the config file and `MKTASK_` environment variables.
//!
//! ```toml
//! editor = "nvim"
//! file_suffix = ".md"
//!
//! [conduit]
//! transport = "arc"        # or "http"
//! arc_command = "arc"
//! uri = "https://phab.example.com"
//! token = "api-..."
//! timeout_secs = 30
//! ```
//!
//! Nested keys are reachable from the environment with a double underscore, e.g. `MKTASK_CONDUIT__ARC_COMMAND`.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use smart_default::SmartDefault;

pub const APP_NAME: &str = "mktask";
const ENV_PREFIX: &str = "MKTASK";

#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Settings {
	/// Fallback when `$EDITOR` is unset.
	#[default = "vim"]
	pub editor: String,
	#[default = ".md"]
	pub file_suffix: String,
	pub conduit: ConduitSettings,
}

#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ConduitSettings {
	pub transport: Transport,
	/// Command line used to run arcanist, split shell-style.
	#[default = "arc"]
	pub arc_command: String,
	/// Phabricator base URI, http transport only.
	pub uri: Option<String>,
	/// Conduit API token, http transport only.
	pub token: Option<String>,
	/// Upper bound on each Conduit call. Unset means wait forever.
	pub timeout_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
	/// `arc call-conduit`
	#[default]
	Arc,
	/// Conduit HTTP API
	Http,
}

impl Settings {
	/// Load settings. An explicit `path` must exist; the default XDG location is optional.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut builder = Config::builder();
		match path.map(Path::to_path_buf).or_else(default_config_path) {
			Some(file) => {
				tracing::debug!(path = %file.display(), "loading config file");
				builder = builder.add_source(File::from(file).required(path.is_some()));
			}
			None => tracing::debug!("no config file, using defaults"),
		}
		builder
			.add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
			.build()?
			.try_deserialize()
	}
}

/// `$XDG_CONFIG_HOME/mktask/config.toml`, if it exists.
pub fn default_config_path() -> Option<PathBuf> {
	xdg::BaseDirectories::with_prefix(APP_NAME).find_config_file("config.toml")
}
