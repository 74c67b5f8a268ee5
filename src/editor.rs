//! Interactive editing of the task template.

// False positive: fields ARE used via thiserror's #[error] format string expansion
#![allow(unused_assignments)]

use std::{
	io::Write,
	path::{Path, PathBuf},
	process::ExitStatus,
};

use miette::Diagnostic;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;

/// Prefix of the transient file the editor is pointed at.
pub const FILE_PREFIX: &str = "task";

#[derive(Debug, Diagnostic, Error)]
pub enum EditError {
	#[error("failed to create the task file")]
	#[diagnostic(code(mktask::edit::create))]
	Create(#[source] std::io::Error),

	#[error("failed to write the template to {}", path.display())]
	#[diagnostic(code(mktask::edit::write))]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("editor command {editor:?} cannot be parsed")]
	#[diagnostic(code(mktask::edit::command))]
	Command {
		editor: String,
		#[source]
		source: shell_words::ParseError,
	},

	#[error("no editor configured")]
	#[diagnostic(code(mktask::edit::no_editor), help("export EDITOR or set `editor` in the config file"))]
	NoEditor,

	#[error("failed to launch editor `{program}`")]
	#[diagnostic(code(mktask::edit::spawn))]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("editor `{program}` exited with {status}")]
	#[diagnostic(code(mktask::edit::exit))]
	Exit { program: String, status: ExitStatus },

	#[error("failed to read back {}", path.display())]
	#[diagnostic(code(mktask::edit::read))]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to keep {}", path.display())]
	#[diagnostic(code(mktask::edit::keep))]
	Keep {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Text as the user left it, plus the file it lives in.
///
/// The file is removed when this is dropped unless [`Edited::keep`] is called.
#[derive(Debug)]
pub struct Edited {
	pub text: String,
	file: NamedTempFile,
}

impl Edited {
	pub fn path(&self) -> &Path {
		self.file.path()
	}

	/// Leave the file on disk and return where it is.
	pub fn keep(self) -> Result<PathBuf, EditError> {
		self.file.into_temp_path().keep().map_err(|e| EditError::Keep {
			path: e.path.to_path_buf(),
			source: e.error,
		})
	}
}

/// Runs an editor on a transient copy of some text.
#[derive(Clone, Debug)]
pub struct EditSession {
	editor: String,
	suffix: String,
}

impl EditSession {
	/// `editor` is a shell-style command line; the file path is appended as the last argument.
	pub fn new(editor: impl Into<String>) -> Self {
		Self {
			editor: editor.into(),
			suffix: String::new(),
		}
	}

	/// Use `$EDITOR` when it is set and not blank, `default` otherwise.
	pub fn from_env(default: &str) -> Self {
		let editor = std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()).unwrap_or_else(|| default.to_owned());
		Self::new(editor)
	}

	/// File name suffix, so editors can pick a syntax (e.g. `.md`).
	pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
		self.suffix = suffix.into();
		self
	}

	/// Write `content` to a fresh file, let the user edit it, and read the result back.
	///
	/// Blocks until the editor exits; a non-zero exit status is an error.
	pub async fn edit(&self, content: &str) -> Result<Edited, EditError> {
		let mut file = tempfile::Builder::new().prefix(FILE_PREFIX).suffix(&self.suffix).tempfile().map_err(EditError::Create)?;
		file.write_all(content.as_bytes()).and_then(|()| file.flush()).map_err(|source| EditError::Write {
			path: file.path().to_path_buf(),
			source,
		})?;

		let mut parts = shell_words::split(&self.editor).map_err(|source| EditError::Command {
			editor: self.editor.clone(),
			source,
		})?;
		if parts.is_empty() {
			return Err(EditError::NoEditor);
		}
		let program = parts.remove(0);

		tracing::info!("Executing {} {}", self.editor, file.path().display());
		let status = Command::new(&program)
			.args(&parts)
			.arg(file.path())
			.status()
			.await
			.map_err(|source| EditError::Spawn { program: program.clone(), source })?;
		if !status.success() {
			return Err(EditError::Exit { program, status });
		}

		let text = tokio::fs::read_to_string(file.path()).await.map_err(|source| EditError::Read {
			path: file.path().to_path_buf(),
			source,
		})?;
		tracing::debug!(bytes = text.len(), "read back edited task");

		Ok(Edited { text, file })
	}
}
