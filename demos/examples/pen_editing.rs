// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing a polygon with a pen, then editing it through a draft.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p markup_demos --example pen_editing`

use kurbo::{Point, Vec2};
use markup_annotation::{LabelDefinition, Pen, Stage, StageConfig, Tool};

fn main() -> Result<(), markup_annotation::Error> {
    env_logger::init();

    let mut stage = Stage::new(
        StageConfig::default(),
        vec![LabelDefinition::new("field", "#4363d8")],
    );
    let mut pen = Pen::new(Tool::Polygon);
    pen.set_label(Some("field".into()));

    pen.begin(&mut stage, Point::new(10.0, 10.0))?;
    for p in [(90.0, 10.0), (90.0, 70.0), (10.0, 70.0)] {
        pen.update_pointer(&mut stage, p.into())?;
        pen.add_point(&mut stage, p.into())?;
    }
    let id = pen.finish(&mut stage)?;
    println!("drew `{id}`: {:?}", stage.get(&id).map(|a| a.data()));

    pen.select(&mut stage, &id)?;
    pen.drag_vertex(&mut stage, 2, Point::new(120.0, 90.0))?;
    pen.translate(&mut stage, Vec2::new(5.0, 5.0))?;
    println!("draft changed: {}", pen.is_changed());
    pen.unselect(&mut stage)?;
    println!("committed: {:?}", stage.get(&id).map(|a| a.data()));

    println!("{}", stage.to_json()?);
    Ok(())
}
