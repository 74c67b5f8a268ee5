//! Create Maniphest tasks from a template edited in `$EDITOR`.
//!
//! The pipeline is linear: [`template::TEMPLATE`] is handed to an [`editor::EditSession`], the result is split into
//! fields by [`parse::parse`], references are resolved to PHIDs by [`resolve::Resolver`], and the finished
//! [`task::TaskSpec`] goes out through a [`conduit::Conduit`].

pub mod conduit;
pub mod config;
pub mod editor;
pub mod parse;
pub mod resolve;
pub mod task;
pub mod template;

pub use conduit::{BoxedConduit, Conduit, ConduitError, CreatedTask};
pub use editor::{EditError, EditSession, Edited};
pub use parse::{Field, SourceText, parse};
pub use resolve::{ResolveError, Resolver};
pub use task::TaskSpec;
pub use template::{Label, Sigil, TEMPLATE};
