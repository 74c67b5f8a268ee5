//! Splitting edited template text into labelled fields.

use std::{ops::Range, sync::LazyLock};

use miette::NamedSource;
use regex::Regex;

use crate::template::Label;

static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(\w+):").expect("label pattern is valid"));

/// One filled-in section of the template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Field {
	pub label: Label,
	/// Trimmed value, never empty.
	pub value: String,
	/// Byte range of `value` in the parsed text.
	pub span: Range<usize>,
}

/// Edited text together with the name it is reported under in diagnostics.
#[derive(Clone, Debug)]
pub struct SourceText {
	pub name: String,
	pub content: String,
}

impl SourceText {
	pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			content: content.into(),
		}
	}

	/// Create a NamedSource for miette diagnostics.
	pub fn named_source(&self) -> NamedSource<String> {
		NamedSource::new(&self.name, self.content.clone())
	}
}

/// Parse `text` into fields, in the order their labels appear.
///
/// A section starts at a line beginning with `word:` where `word` is a known label (any case) and runs until the next
/// known label or the end of the text. Lines that look like labels but aren't recognized stay part of the value above them.
/// Sections left empty are omitted. Never fails.
pub fn parse(text: &str) -> Vec<Field> {
	let boundaries: Vec<(Label, usize, usize)> = LABEL_RE
		.captures_iter(text)
		.filter_map(|caps| {
			let whole = caps.get(0)?;
			let label = Label::lookup(caps.get(1)?.as_str())?;
			Some((label, whole.start(), whole.end()))
		})
		.collect();

	boundaries
		.iter()
		.enumerate()
		.filter_map(|(i, &(label, _, value_start))| {
			let value_end = boundaries.get(i + 1).map_or(text.len(), |&(_, next_start, _)| next_start);
			let raw = &text[value_start..value_end];
			let value = raw.trim();
			if value.is_empty() {
				return None;
			}
			let offset = value_start + (raw.len() - raw.trim_start().len());
			Some(Field {
				label,
				value: value.to_owned(),
				span: offset..offset + value.len(),
			})
		})
		.collect()
}
