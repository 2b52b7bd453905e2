// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hover and selection on a stage, observed through the event bus.
//!
//! Run:
//! - `RUST_LOG=debug cargo run -p markup_demos --example hover_and_select`

use kurbo::Point;
use markup_annotation::{
    AnnotationData, AnnotationRecord, LabelDefinition, Stage, StageConfig, StageEvent,
};
use markup_canvas::DisplayList;

fn main() -> Result<(), markup_annotation::Error> {
    env_logger::init();

    let labels = vec![
        LabelDefinition::new("car", "#e6194b"),
        LabelDefinition::new("person", "#3cb44b"),
    ];
    let mut stage = Stage::new(StageConfig::default(), labels);
    stage.events_mut().subscribe(|e| match e {
        StageEvent::HoverChanged { previous, current } => {
            println!("hover: {previous:?} -> {current:?}");
        }
        StageEvent::SelectionChanged { previous, current } => {
            println!("select: {previous:?} -> {current:?}");
        }
        _ => {}
    });

    stage.load([
        AnnotationRecord::new(
            "car-1",
            "car",
            AnnotationData::Rect {
                x: 10.0,
                y: 10.0,
                width: 80.0,
                height: 40.0,
            },
        ),
        AnnotationRecord::new("head", "person", AnnotationData::Point { x: 50.0, y: 30.0 }),
        AnnotationRecord::new(
            "lane",
            "car",
            AnnotationData::Line {
                points: vec![Point::new(0.0, 100.0), Point::new(200.0, 100.0)],
            },
        ),
    ]);

    // The point was added last, so it wins over the rectangle underneath.
    for p in [(50.0, 31.0), (20.0, 20.0), (120.0, 101.0), (300.0, 300.0)] {
        let hovered = stage.pointer_move(p.into()).map(str::to_owned);
        println!("pointer at {p:?} hovers {hovered:?}");
    }

    stage.select("car-1")?;
    let mut list = DisplayList::new();
    stage.render(Some(&mut list))?;
    println!("rendered {} draw commands", list.len());
    Ok(())
}
