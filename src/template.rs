//! The task template and its closed set of field labels.

use derive_more::Display;

use crate::parse::Field;

/// Text the editing session starts from. Every section is left empty for the user to fill in.
pub const TEMPLATE: &str = "Title:

Description:

Owner:

CC:

Projects:

Priority:

Points:
";

/// A recognized section label.
///
/// Labels are matched case-insensitively; anything else that looks like `word:` at the start of a line is ignored.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Label {
	Title,
	Description,
	Owner,
	#[display("CC")]
	Cc,
	Projects,
	Priority,
	Points,
}

impl Label {
	pub const ALL: [Label; 7] = [Label::Title, Label::Description, Label::Owner, Label::Cc, Label::Projects, Label::Priority, Label::Points];

	/// Case-insensitive lookup of a label as it appears in the template.
	pub fn lookup(raw: &str) -> Option<Self> {
		match raw.to_lowercase().as_str() {
			"title" => Some(Label::Title),
			"description" => Some(Label::Description),
			"owner" => Some(Label::Owner),
			"cc" => Some(Label::Cc),
			"projects" => Some(Label::Projects),
			"priority" => Some(Label::Priority),
			"points" => Some(Label::Points),
			_ => None,
		}
	}

	/// Key under which the value is sent to `maniphest.createtask`.
	pub fn key(self) -> &'static str {
		match self {
			Label::Title => "title",
			Label::Description => "description",
			Label::Owner => "ownerPHID",
			Label::Cc => "ccPHIDs",
			Label::Projects => "projectPHIDs",
			Label::Priority => "priority",
			Label::Points => "points",
		}
	}

	/// Sigil for labels whose value is a list of references, `None` for plain text fields.
	pub fn sigil(self) -> Option<Sigil> {
		match self {
			Label::Owner | Label::Cc => Some(Sigil::User),
			Label::Projects => Some(Sigil::Project),
			_ => None,
		}
	}
}

/// Prefix that marks what kind of object a reference names.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Sigil {
	#[display("@")]
	User,
	#[display("#")]
	Project,
}

impl Sigil {
	pub fn as_char(self) -> char {
		match self {
			Sigil::User => '@',
			Sigil::Project => '#',
		}
	}
}

/// Write fields back out in `Label:` / value form, in the order given.
pub fn render(fields: &[Field]) -> String {
	let mut out = String::new();
	for field in fields {
		out.push_str(&format!("{}:\n{}\n\n", field.label, field.value));
	}
	out
}
