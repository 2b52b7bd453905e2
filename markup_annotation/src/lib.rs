// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup Annotation: labeled annotations on a [`markup_canvas::Surface`].
//!
//! A [`Stage`] owns the surface, a [`LabelStyleResolver`], and a bus of [`StageEvent`]s.
//! Each [`Annotation`] pairs an [`AnnotationRecord`] with the drawable that renders it and
//! follows the hover/select protocol through [`HoverableCapability`]. A [`Pen`] draws new
//! annotations and edits existing ones through a draft copy that is committed on unselect.
//!
//! # Example
//!
//! ```rust
//! use kurbo::Point;
//! use markup_annotation::{
//!     AnnotationData, AnnotationRecord, LabelDefinition, Pen, Stage, StageConfig, Tool,
//! };
//!
//! let mut stage = Stage::new(
//!     StageConfig::default(),
//!     vec![LabelDefinition::new("car", "#ff0000")],
//! );
//! stage.add(AnnotationRecord::new(
//!     "a",
//!     "car",
//!     AnnotationData::Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 },
//! ))?;
//! assert_eq!(stage.pointer_move(Point::new(5.0, 5.0)), Some("a"));
//!
//! let mut pen = Pen::new(Tool::Rect);
//! pen.begin(&mut stage, Point::new(20.0, 20.0))?;
//! pen.update_pointer(&mut stage, Point::new(40.0, 30.0))?;
//! let id = pen.finish(&mut stage)?;
//! assert_eq!(stage.hit_test(Point::new(30.0, 25.0)), Some(id));
//! # Ok::<(), markup_annotation::Error>(())
//! ```

pub mod annotation;
pub mod config;
pub mod data;
pub mod error;
pub mod event;
pub mod label;
pub mod pen;
pub mod stage;

pub use annotation::{Annotation, HoverableCapability};
pub use config::StageConfig;
pub use data::{AnnotationData, AnnotationRecord};
pub use error::Error;
pub use event::StageEvent;
pub use label::{LabelDefinition, LabelStyleResolver, StyleTiers};
pub use pen::{Pen, Tool};
pub use stage::Stage;
