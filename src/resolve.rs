//! Turning `@user` / `#project` references into PHIDs.
//!
//! Only talks to the [`Conduit`] trait, so the same rules hold whichever transport is configured.

// Fields are read by miette's derive macro via attributes
#![allow(unused_assignments)]

use std::{collections::HashMap, ops::Range};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::{
	conduit::{Conduit, ConduitError},
	parse::{Field, SourceText},
	task::TaskSpec,
	template::{Label, Sigil},
};

#[derive(Debug, Diagnostic, Error)]
pub enum ResolveError {
	#[error("you should specify just 1 owner got: {count}")]
	#[diagnostic(code(mktask::resolve::owner_count), help("a task has exactly one owner; list everyone else under CC"))]
	OwnerCount {
		count: usize,
		#[source_code]
		src: NamedSource<String>,
		#[label("owner")]
		span: SourceSpan,
	},

	#[error("unable to find the phid of {name:?}")]
	#[diagnostic(code(mktask::resolve::unknown_reference), help("users are referenced as `@name`, projects as `#name`"))]
	UnknownReference {
		name: String,
		#[source_code]
		src: NamedSource<String>,
		#[label("not known to conduit")]
		span: SourceSpan,
	},

	#[error(transparent)]
	#[diagnostic(transparent)]
	Conduit(#[from] ConduitError),
}

/// One comma-separated entry of a reference field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reference {
	/// Name as sent to `phid.lookup`, sigil included.
	pub name: String,
	/// Byte range of the entry as typed, relative to the field value.
	pub span: Range<usize>,
}

/// Split a raw field value into references, adding `sigil` where the user left it out.
///
/// Blank entries (`alice,,bob`, a trailing comma) are skipped.
pub fn references(raw: &str, sigil: Sigil) -> Vec<Reference> {
	let mut out = Vec::new();
	let mut offset = 0;
	for piece in raw.split(',') {
		let trimmed = piece.trim();
		if !trimmed.is_empty() {
			let start = offset + (piece.len() - piece.trim_start().len());
			let name = if trimmed.starts_with(sigil.as_char()) { trimmed.to_owned() } else { format!("{sigil}{trimmed}") };
			out.push(Reference {
				name,
				span: start..start + trimmed.len(),
			});
		}
		offset += piece.len() + 1;
	}
	out
}

/// Resolves the reference fields of one edited template.
pub struct Resolver<'a> {
	conduit: &'a dyn Conduit,
	source: &'a SourceText,
}

impl<'a> Resolver<'a> {
	pub fn new(conduit: &'a dyn Conduit, source: &'a SourceText) -> Self {
		Self { conduit, source }
	}

	/// PHIDs for every reference in `field`, in the order they were written.
	pub async fn resolve(&self, field: &Field, sigil: Sigil) -> Result<Vec<String>, ResolveError> {
		let refs = references(&field.value, sigil);
		self.lookup(field, &refs).await
	}

	/// The single PHID an owner field must name.
	pub async fn resolve_owner(&self, field: &Field) -> Result<String, ResolveError> {
		let refs = references(&field.value, Sigil::User);
		if refs.len() != 1 {
			return Err(ResolveError::OwnerCount {
				count: refs.len(),
				src: self.source.named_source(),
				span: span_of(&field.span),
			});
		}
		let mut phids = self.lookup(field, &refs).await?;
		Ok(phids.remove(0))
	}

	/// Assemble the createtask payload from parsed fields.
	///
	/// When a label occurs more than once the last occurrence wins. Only fields that are present trigger a lookup.
	pub async fn task_spec(&self, fields: &[Field]) -> Result<TaskSpec, ResolveError> {
		let latest: HashMap<Label, &Field> = fields.iter().map(|f| (f.label, f)).collect();
		let text = |label: Label| latest.get(&label).map(|f| f.value.clone());

		let owner_phid = match latest.get(&Label::Owner) {
			Some(field) => Some(self.resolve_owner(field).await?),
			None => None,
		};
		let cc_phids = match latest.get(&Label::Cc) {
			Some(field) => Some(self.resolve(field, Sigil::User).await?),
			None => None,
		};
		let project_phids = match latest.get(&Label::Projects) {
			Some(field) => Some(self.resolve(field, Sigil::Project).await?),
			None => None,
		};

		Ok(TaskSpec {
			title: text(Label::Title),
			description: text(Label::Description),
			owner_phid,
			cc_phids,
			priority: text(Label::Priority),
			project_phids,
			points: text(Label::Points),
		})
	}

	async fn lookup(&self, field: &Field, refs: &[Reference]) -> Result<Vec<String>, ResolveError> {
		if refs.is_empty() {
			return Ok(Vec::new());
		}
		let names: Vec<String> = refs.iter().map(|r| r.name.clone()).collect();
		tracing::debug!(label = %field.label, ?names, "looking up references");
		let found = self.conduit.lookup(&names).await?;

		refs.iter()
			.map(|r| match found.get(&r.name) {
				Some(object) => Ok(object.phid.clone()),
				None => Err(ResolveError::UnknownReference {
					name: r.name.clone(),
					src: self.source.named_source(),
					span: span_of(&(field.span.start + r.span.start..field.span.start + r.span.end)),
				}),
			})
			.collect()
	}
}

fn span_of(range: &Range<usize>) -> SourceSpan {
	(range.start, range.len()).into()
}
