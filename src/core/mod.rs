//! Core types shared across pagesmith
//!
//! - [`error`] - [`PagesmithError`], [`ErrorContext`] and [`user_friendly_error`]
//! - [`reference`] - [`Reference`], [`ReferenceKind`] and graph-derived [`FileRole`]
//! - [`warning`] - recoverable diagnostics collected per page

pub mod error;
pub mod reference;
pub mod warning;

pub use error::{ErrorContext, PagesmithError, user_friendly_error};
pub use reference::{FileRole, Reference, ReferenceKind};
pub use warning::{Warning, WarningKind};
