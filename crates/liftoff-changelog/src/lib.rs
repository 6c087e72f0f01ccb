//! Liftoff Changelog - Commit classification and release notes
//!
//! Raw commits are turned into [`ClassifiedCommit`]s by the [`Classifier`]
//! (grammar parsing is delegated to a [`CommitParser`]), and classified
//! commits are rendered into markdown release notes by a [`NotesFormatter`].

pub mod classifier;
pub mod notes;
pub mod parser;
pub mod types;

pub use classifier::{classify, Classifier};
pub use notes::{build_notes, has_user_facing_changes, MarkdownNotes, NotesContext, NotesFormatter};
pub use parser::{CommitParser, ConventionalParser, ParsedMessage};
pub use types::{ClassifiedCommit, Footer, Note, Reference, BREAKING_CHANGE_NOTE, RELEASE_AS_NOTE};
