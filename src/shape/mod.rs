//! Mapping between logical axes and the container's fixed `TZCYXS` layout.
//!
//! [`pack`] flattens a [`crate::model::LogicalArray`] into container slots for
//! writing, and [`resolve`] reconstructs the logical axes from whatever a
//! container file provides. Files written by [`pack`] carry their descriptor
//! in the embedded blob, so the two are exact inverses for every layout
//! [`pack`] accepts.

mod diagnostics;
mod native;
mod packer;
mod resolver;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use native::{NativeAxisHints, NativeTags, PageLayout, RawImage};
pub use packer::{
    container_slots, effective_descriptor, native_axis_order, pack, write_with_retry,
    ContainerEncoder, PackedImage, MAX_AXES,
};
pub use resolver::{resolve, Resolved};
