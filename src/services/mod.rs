pub mod autosave;
pub mod cascade;
pub mod document;
pub mod insight;
pub mod reminder;
