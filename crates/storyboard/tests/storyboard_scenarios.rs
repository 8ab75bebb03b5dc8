#![allow(clippy::float_cmp)]

//! Storyboards driven end to end with a manual clock: load, lay out markers,
//! attach, scroll, tear down.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use damping::ManualScheduler;
use storyboard::{
    Anchor, Coords, Rect, RectAnchor, ScrollReporter, ScrollSource, Size, Storyboard,
    ViewportEvent, ViewportEvents,
};

const BOARD: &str = r#"
{
  "debug": { "items": true },
  "frames": [
    {
      "height": "100%",
      "items": [
        { "element": "title", "align": { "center": true }, "anchor": { "center": true } },
        { "element": "note", "easing_lag": 0.08, "align": { "left": "24px", "bottom": "10%" } }
      ]
    },
    {
      "height": 400,
      "items": [
        { "element": "footer", "align": { "center": true, "top": 0 }, "anchor": { "left": "8px" } }
      ]
    }
  ]
}
"#;

/// A page: markers live at document positions and move up as it scrolls.
struct Page {
    scroll_top: Cell<f64>,
    viewport: Size,
    content_height: f64,
    markers: RefCell<Vec<(Rc<RectAnchor>, Coords)>>,
}

impl Page {
    fn new(viewport: Size, content_height: f64) -> Self {
        Self {
            scroll_top: Cell::new(0.0),
            viewport,
            content_height,
            markers: RefCell::new(Vec::new()),
        }
    }

    fn place_marker(&self, document_pos: Coords) -> Rc<RectAnchor> {
        let anchor = Rc::new(RectAnchor::new(Rect::new(
            document_pos.x,
            document_pos.y - self.scroll_top.get(),
            0.0,
            0.0,
        )));
        self.markers
            .borrow_mut()
            .push((Rc::clone(&anchor), document_pos));
        anchor
    }

    fn scroll_to(&self, top: f64, events: &ViewportEvents) {
        self.scroll_top.set(top);
        for (anchor, pos) in self.markers.borrow().iter() {
            anchor.set_rect(Rect::new(pos.x, pos.y - top, 0.0, 0.0));
        }
        events.dispatch(ViewportEvent::Scroll);
    }
}

impl ScrollSource for Page {
    fn scroll_top(&self) -> f64 {
        self.scroll_top.get()
    }
    fn client_height(&self) -> f64 {
        self.viewport.height
    }
    fn scroll_height(&self) -> f64 {
        self.content_height
    }
}

#[test]
fn storyboard_tracks_markers_through_scrolling() {
    let board = Storyboard::from_json(BOARD).unwrap();
    let viewport = Size::new(1000.0, 800.0);
    let frames = board.layout(viewport, 0.0);
    assert_eq!(frames[1], Rect::new(0.0, 800.0, 1000.0, 400.0));

    let page = Page::new(viewport, 1200.0);
    let scheduler = Rc::new(ManualScheduler::new());
    let events = Rc::new(ViewportEvents::new());

    // Phase one: resolve items and lay out their markers.
    let mut items = board.positioned();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| !item.is_attached()));

    let frame_of = [0, 0, 1];
    let mut anchors: Vec<Rc<dyn Anchor>> = Vec::new();
    for (item, frame) in items.iter().zip(frame_of) {
        let rect = frames[frame];
        let offset = item.marker_offset(rect.size(), board.debug.items);
        anchors.push(page.place_marker(rect.origin().offset_by(offset)));
    }

    // Phase two: attach now that the markers exist.
    for (item, anchor) in items.iter_mut().zip(&anchors) {
        item.attach(Rc::downgrade(anchor), scheduler.clone(), Rc::clone(&events));
    }
    assert_eq!(events.listener_count(), 3);

    // title: centered 3px dot in an 800px frame
    assert_eq!(items[0].coords(), Some(Coords::new(498.5, 398.5)));
    // note: 24px from the left, 10% from the bottom
    assert_eq!(items[1].coords(), Some(Coords::new(24.0, 717.0)));
    // footer: centered horizontally, top of the second frame
    assert_eq!(items[2].coords(), Some(Coords::new(498.5, 800.0)));

    page.scroll_to(300.0, &events);

    // Unsmoothed items jump immediately.
    assert_eq!(items[0].coords(), Some(Coords::new(498.5, 98.5)));
    assert_eq!(items[2].coords(), Some(Coords::new(498.5, 500.0)));
    // The smoothed one has not moved until a frame runs.
    assert_eq!(items[1].coords(), Some(Coords::new(24.0, 717.0)));

    scheduler.step(16.0);
    let easing = items[1].coords().map(|c| c.y).unwrap();
    assert!(easing < 717.0 && easing > 417.0, "easing y = {easing}");

    scheduler.run_until_idle(16.0, 10_000);
    assert_eq!(items[1].coords(), Some(Coords::new(24.0, 417.0)));

    // Overlay self-alignment around the projected point.
    assert_eq!(
        items[0].overlay_position(Size::new(200.0, 50.0)),
        Some(Coords::new(398.5, 73.5))
    );
    assert_eq!(
        items[2].overlay_position(Size::new(200.0, 50.0)),
        Some(Coords::new(506.5, 500.0))
    );

    for item in &mut items {
        assert!(item.detach());
    }
    assert_eq!(events.listener_count(), 0);
    assert!(scheduler.is_idle());
}

#[test]
fn scroll_reporter_and_projectors_share_one_hub() {
    let viewport = Size::new(1000.0, 500.0);
    let page = Rc::new(Page::new(viewport, 2500.0));
    let source: Rc<dyn ScrollSource> = page.clone();
    let scheduler = Rc::new(ManualScheduler::new());
    let events = Rc::new(ViewportEvents::new());

    let reporter = ScrollReporter::new(scheduler.clone());
    reporter.register(Rc::downgrade(&source), Rc::clone(&events));
    let progress = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&progress);
    reporter.add_callback("progress", move |info| sink.borrow_mut().push(info.progress_ratio));

    let board = Storyboard::from_json(BOARD).unwrap();
    let mut items = board.positioned();
    let anchor: Rc<dyn Anchor> = page.place_marker(Coords::new(10.0, 1000.0));
    items[1].attach(Rc::downgrade(&anchor), scheduler.clone(), Rc::clone(&events));

    for top in [500.0, 1000.0, 2000.0] {
        page.scroll_to(top, &events);
        scheduler.step(16.0);
    }
    scheduler.run_until_idle(16.0, 10_000);

    assert_eq!(*progress.borrow(), vec![0.25, 0.5, 1.0]);
    assert_eq!(items[1].coords(), Some(Coords::new(10.0, -1000.0)));
}

#[test]
fn dropping_the_anchor_freezes_the_projection() {
    let scheduler = Rc::new(ManualScheduler::new());
    let events = Rc::new(ViewportEvents::new());
    let board = Storyboard::from_json(BOARD).unwrap();
    let mut items = board.positioned();

    let marker = Rc::new(RectAnchor::new(Rect::new(5.0, 5.0, 0.0, 0.0)));
    let anchor: Rc<dyn Anchor> = marker.clone();
    items[0].attach(Rc::downgrade(&anchor), scheduler.clone(), Rc::clone(&events));

    drop(anchor);
    drop(marker);
    events.dispatch(ViewportEvent::Resize);

    assert_eq!(items[0].coords(), Some(Coords::new(5.0, 5.0)));
    assert!(items[0].projector().is_some_and(|p| !p.has_anchor()));
}
