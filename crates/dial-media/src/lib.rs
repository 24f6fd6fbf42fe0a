//! Building DIAL-MS system media from a reference LINCtape image.
//!
//! The crate works on in-memory buffers only; selecting files per device is left to callers.
//! It provides:
//!
//! - [`tape`]: decoder for the binary loader paper-tape format, producing a [`CoreImage`]
//! - [`CanonicalImage`]: the system image as a plain block sequence, with region views
//! - [`handler`], [`unit_table`], [`patch`]: the three writers that customize the resident
//!   I/O routines
//! - [`transcode`]: LINCtape framing and per-media geometry on the way in and out
//! - [`builder`]: the fixed pipeline tying the above together

mod backend;
pub mod builder;
mod error;
pub mod handler;
mod image;
pub mod layout;
mod media;
pub mod patch;
pub mod tape;
pub mod transcode;
pub mod unit_table;
mod util;

pub use backend::{MemBackend, StdFileBackend, StorageBackend};
pub use builder::{build_system_image, compose, BuildPlan};
pub use error::{MediaError, Result};
pub use handler::{Handler, HandlerEncoding, HandlerSlot};
pub use image::{CanonicalImage, RoutinesStage};
pub use media::{MediaGeometry, MediaKind, TapeFooter, TAPE_FOOTER_LEN};
pub use tape::CoreImage;
pub use unit_table::{UnitEntry, UnitSpecSource};

#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests;
