//! Canvas core for the spatial note editor.
//!
//! This crate holds everything about the canvas that does not need a
//! browser: the block model, camera, pointer gestures, the freehand draw
//! session, the overlay layer and the `@` command menu. The host feeds raw
//! input in and gets [`engine::Action`]s back; persisting them, calling the
//! backend and painting the [`render::Scene`] are the host's job.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::EngineCore`]: input routing, selection, and emitted actions |
//! | [`doc`] | Block types, partial updates, and the in-memory block store |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types, tools, and the gesture state machine |
//! | [`gesture`] | Drag, resize, and rotate controllers |
//! | [`draw`] | Freehand shape draw session and preview geometry |
//! | [`listeners`] | Scoped global pointer/key listener subscriptions |
//! | [`hit`] | Hit-testing against blocks and selection handles |
//! | [`render`] | Display list construction and the shape renderer table |
//! | [`overlay`] | Screen-space overlay placement and dismissal |
//! | [`command_menu`] | `@` trigger tracking, filtering, and insertions |
//! | [`markers`] | Reminder/annotation marker references in rich text |
//! | [`consts`] | Shared numeric constants (zoom limits, minimum sizes, etc.) |

pub mod camera;
pub mod command_menu;
pub mod consts;
pub mod doc;
pub mod draw;
pub mod engine;
pub mod gesture;
pub mod hit;
pub mod input;
pub mod listeners;
pub mod markers;
pub mod overlay;
pub mod render;
