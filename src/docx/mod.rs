//! WordprocessingML placeholder handling.
//!
//! Three concerns live here: extracting `w:sdt` placeholder fields from a
//! part's XML ([`field`]), walking a package's story sub-parts to find every
//! field ([`locate`]), and rewriting field content in place ([`rewrite`]).
//! [`parameter`] wraps named fields behind the [`Parameter`] trait for
//! callers that only deal in name/value pairs.

pub mod field;
pub mod locate;
pub mod parameter;
pub mod rewrite;

pub use field::Field;
pub use locate::{FieldLocator, Fields};
pub use parameter::{Parameter, SdtParameter};
pub use rewrite::apply_parameters;
