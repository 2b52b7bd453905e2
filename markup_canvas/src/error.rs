// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for surface, shape, and group operations.

use thiserror::Error;

use crate::types::DrawableId;

/// Errors raised by the canvas layer.
///
/// Geometry and context errors are fatal for the call that raised them; nothing is retried
/// internally. Style problems never surface here: they degrade to defaults instead.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// A shape or group was built (or edited) with empty or malformed coordinates.
    #[error("invalid geometry for `{id}`: {reason}")]
    InvalidGeometry {
        /// Id of the offending shape or group.
        id: String,
        /// What was wrong with the coordinates.
        reason: String,
    },

    /// Rendering was requested without a drawing context.
    #[error("render called without a drawing context")]
    NoRenderContext,

    /// A top-level drawable with this id is already on the surface.
    #[error("a drawable with id `{0}` already exists on this surface")]
    DuplicateId(String),

    /// The handle does not refer to a live drawable.
    #[error("drawable {0:?} is not on this surface")]
    UnknownDrawable(DrawableId),
}

impl Error {
    pub(crate) fn geometry(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            id: id.to_owned(),
            reason: reason.into(),
        }
    }
}
