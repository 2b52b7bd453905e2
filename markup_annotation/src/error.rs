// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for stage and pen operations.

use thiserror::Error;

/// Errors raised by the annotation layer.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// Geometry, context, or surface bookkeeping failure.
    #[error(transparent)]
    Canvas(#[from] markup_canvas::Error),

    /// No annotation with this id is on the stage.
    #[error("no annotation with id `{0}`")]
    UnknownAnnotation(String),

    /// An annotation with this id is already on the stage.
    #[error("an annotation with id `{0}` already exists")]
    DuplicateAnnotation(String),

    /// A draft operation was issued while the pen holds no draft.
    #[error("no draft in progress")]
    NoDraft,

    /// The annotation has no geometry (tags and free text).
    #[error("annotation `{0}` has no geometry to edit")]
    NotEditable(String),

    /// JSON encoding or decoding failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
