// SPDX-License-Identifier: GPL-3.0-or-later

/// Typed errors for sandbox validation.
mod error;
/// Path resolution and containment checks.
mod guard;
/// The immutable allow-list of root directories.
mod roots;

pub use error::SandboxError;
pub use guard::{PathGuard, ValidatedPath};
pub use roots::RootSet;
