//! `storyboard inspect`: resolve a storyboard file against a viewport.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;
use storyboard::{Coords, Rect, Size, Storyboard};
use tracing::debug;

use crate::cli::InspectArgs;

#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub key: String,
    pub element: Option<String>,
    pub marker: String,
    pub overlay: String,
    /// Marker position in page coordinates.
    pub marker_at: Coords,
    pub easing_lag: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub index: usize,
    pub height: String,
    pub rect: Rect,
    pub items: Vec<ItemReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub viewport: Size,
    pub debug_items: bool,
    pub debug_frames: bool,
    pub frames: Vec<FrameReport>,
}

/// Lays out `storyboard` and resolves the placement of each item.
pub fn inspect(storyboard: &Storyboard, viewport: Size, auto_height: f64) -> InspectReport {
    let rects = storyboard.layout(viewport, auto_height);
    let mut positioned = storyboard.positioned().into_iter();

    let frames = storyboard
        .frames
        .iter()
        .zip(rects)
        .enumerate()
        .map(|(index, (frame, rect))| {
            let items = positioned
                .by_ref()
                .take(frame.items.len())
                .map(|item| {
                    let offset = item.marker_offset(rect.size(), storyboard.debug.items);
                    ItemReport {
                        key: item.key().to_string(),
                        element: item.element().map(str::to_string),
                        marker: item.marker().to_string(),
                        overlay: item.overlay().to_string(),
                        marker_at: rect.origin().offset_by(offset),
                        easing_lag: item.item().easing_lag,
                    }
                })
                .collect();
            FrameReport {
                index,
                height: frame.height.to_string(),
                rect,
                items,
            }
        })
        .collect();

    InspectReport {
        viewport,
        debug_items: storyboard.debug.items,
        debug_frames: storyboard.debug.frames,
        frames,
    }
}

pub fn render_text(report: &InspectReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "viewport {}x{}, {} frames",
        report.viewport.width,
        report.viewport.height,
        report.frames.len()
    );
    for frame in &report.frames {
        let _ = writeln!(
            out,
            "frame {} height {} at y={} ({}px)",
            frame.index, frame.height, frame.rect.y, frame.rect.height
        );
        for item in &frame.items {
            let _ = write!(
                out,
                "  [{}] marker {} -> {}  overlay {}",
                item.key, item.marker, item.marker_at, item.overlay
            );
            if let Some(lag) = item.easing_lag {
                let _ = write!(out, "  lag {lag}");
            }
            if let Some(element) = &item.element {
                let _ = write!(out, "  element {element}");
            }
            out.push('\n');
        }
    }
    out
}

pub fn run(args: &InspectArgs) -> Result<()> {
    let storyboard = Storyboard::from_file(&args.file)
        .with_context(|| format!("loading storyboard {}", args.file.display()))?;
    debug!(
        inspect.frames = storyboard.frames.len(),
        inspect.items = storyboard.item_count(),
        "Storyboard loaded"
    );

    let report = inspect(&storyboard, args.viewport, args.auto_height);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(())
}
