//! Host side of the note canvas: persistence, AI, and reminder plumbing
//! around the synchronous [`canvas`] core.
//!
//! The canvas crate turns input into [`canvas::engine::Action`]s. This crate
//! consumes them: it debounces and dirty-checks autosaves, runs the reminder
//! delete cascade in the background, decodes stored canvas documents, and
//! drives the AI insight and reminder overlays against the REST backend.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`api`] | Collaborator traits, wire types, and the REST client |
//! | [`config`] | Environment-driven client configuration |
//! | [`services::document`] | Canvas document codec (current and legacy formats) |
//! | [`services::autosave`] | Debounced, dirty-checked canvas saves |
//! | [`services::cascade`] | Reminder cleanup for deleted blocks and edited text |
//! | [`services::insight`] | AI insight requests and annotation attachment |
//! | [`services::reminder`] | Reminder dialog validation and display text |
//! | [`session`] | One open note: engine, overlays, autosave, collaborators |

pub mod api;
pub mod config;
pub mod services;
pub mod session;
