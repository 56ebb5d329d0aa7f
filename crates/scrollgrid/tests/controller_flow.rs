//! End-to-end behavior of the grid controller driven through the UI loop.

use std::cell::{Cell, RefCell};
use std::io;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use parking_lot::Mutex;
use scrollgrid::view_tree::{SharedViewTree, ViewId};
use scrollgrid::{
    ContentController, ContentHandle, ControllerOptions, EdgeInsets, GridError, GridPosition,
    GridScrollController, Logger, PullOutcome, RefreshCompletion, RefreshState, ScrollAxis,
    ScrollChange, Size, SlotState, UiLoop,
};

struct Tile(ViewId);

impl ContentController for Tile {
    fn view(&self) -> ViewId {
        self.0
    }
}

fn tiles(tree: &SharedViewTree, count: usize) -> Vec<ContentHandle> {
    (0..count)
        .map(|n| ContentHandle::new(Tile(tree.create_view(format!("tile {n}")))))
        .collect()
}

/// A 300x300 viewport with no insets or spacing, so items are 100x100 when
/// `items_per_section` and `rows_or_columns` are both 3.
fn setup(
    ui: &UiLoop,
    count: usize,
    paging: bool,
    logger: Logger,
) -> (SharedViewTree, GridScrollController) {
    let tree = SharedViewTree::new();
    let content = tiles(&tree, count);
    let options = ControllerOptions::default()
        .with_paging(paging)
        .with_viewport(Size::new(300.0, 300.0))
        .with_logger(logger);
    let grid = GridScrollController::new(&ui.context(), tree.clone(), options, content);
    (tree, grid)
}

#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture<F: FnOnce()>(f: F) -> String {
    let writer = CaptureWriter::default();
    let sink = writer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || sink.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = writer.0.lock().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[test]
fn test_visible_content_is_attached_to_cells() {
    let ui = UiLoop::new();
    let (tree, mut grid) = setup(&ui, 9, true, Logger::disabled());
    grid.set_items_per_section(3).unwrap();
    grid.set_rows_or_columns(3).unwrap();
    grid.layout_if_needed();

    assert_eq!(grid.last_item_size(), Size::new(100.0, 100.0));
    assert_eq!(grid.section_count(), 3);
    assert_eq!(grid.lifecycle().attached_count(), 9);
    assert!(grid.diagnostics().is_empty());

    for (position, cell) in grid.grid().displayed() {
        let index = position.section * 3 + position.row;
        let expected = grid.controllers()[index].view();
        assert_eq!(tree.subviews(cell).unwrap(), vec![expected]);
        assert_eq!(grid.lifecycle().state(position), SlotState::Attached);
    }
}

#[test]
fn test_partial_last_section_records_out_of_range() {
    let ui = UiLoop::new();
    let (tree, mut grid) = setup(&ui, 10, true, Logger::disabled());
    grid.set_items_per_section(3).unwrap();
    grid.set_rows_or_columns(3).unwrap();
    grid.layout_if_needed();
    assert_eq!(grid.section_count(), 4);
    assert_eq!(grid.number_of_items_in_section(3), 3);

    // One page is 300 long and the content 400, so this clamps to 100.
    grid.scroll_to(300.0);
    assert_eq!(grid.content_offset().y, 100.0);

    let last = grid.grid().cell_for(GridPosition::new(3, 0)).unwrap();
    assert_eq!(
        tree.subviews(last).unwrap(),
        vec![grid.controllers()[9].view()]
    );
    let empty = grid.grid().cell_for(GridPosition::new(3, 2)).unwrap();
    assert!(tree.subviews(empty).unwrap().is_empty());

    let errors: Vec<GridError> = grid
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.error.clone())
        .collect();
    assert_eq!(
        errors,
        vec![
            GridError::IndexOutOfRange { index: 10, count: 10 },
            GridError::IndexOutOfRange { index: 11, count: 10 },
        ]
    );
}

#[test]
fn test_near_end_fires_once_threshold_is_reached() {
    let ui = UiLoop::new();
    let (tree, mut grid) = setup(&ui, 10, false, Logger::disabled());
    grid.set_rows_or_columns(3).unwrap();

    let requests = Rc::new(Cell::new(0));
    let sink = requests.clone();
    grid.set_on_near_end(move || sink.set(sink.get() + 1));

    // Each step scrolls one section out of view.
    for step in 1..=6 {
        grid.scroll_to(step as f32 * 100.0);
        ui.run_until_idle();
    }
    assert_eq!(requests.get(), 0);

    grid.scroll_to(700.0);
    assert_eq!(requests.get(), 0, "callback must not run inside the display pass");
    ui.run_until_idle();
    assert_eq!(requests.get(), 1);

    grid.add_controllers(tiles(&tree, 10));
    ui.run_until_idle();
    assert_eq!(grid.controllers().len(), 20);
    assert_eq!(grid.section_count(), 20);
    assert_eq!(requests.get(), 1);
}

/// Four 300x100 sections, three visible, scrolled so the first one leaves and
/// the near-end callback is queued once.
fn shared_grid_near_end(
    ui: &UiLoop,
    on_near_end: impl Fn(&Weak<RefCell<GridScrollController>>, &SharedViewTree) + 'static,
) -> (SharedViewTree, Rc<RefCell<GridScrollController>>) {
    let (tree, grid) = setup(ui, 4, false, Logger::disabled());
    let grid = Rc::new(RefCell::new(grid));
    let weak = Rc::downgrade(&grid);
    let feed = tree.clone();
    {
        let mut grid = grid.borrow_mut();
        grid.set_rows_or_columns(3).unwrap();
        grid.set_on_near_end(move || on_near_end(&weak, &feed));
        grid.layout_if_needed();
    }
    assert_eq!(grid.borrow_mut().scroll_to(300.0).y, 100.0);
    assert_eq!(ui.pending_count(), 1);
    (tree, grid)
}

#[test]
fn test_empty_append_from_near_end_goes_idle() {
    let ui = UiLoop::new();
    let calls = Rc::new(Cell::new(0));
    let sink = calls.clone();
    let (_, grid) = shared_grid_near_end(&ui, move |weak, _| {
        sink.set(sink.get() + 1);
        if let Some(grid) = weak.upgrade() {
            grid.borrow_mut().add_controllers(Vec::new());
        }
    });

    // Bounded passes so a feedback loop shows up as leftover work.
    for _ in 0..10 {
        ui.process_pending();
    }
    assert_eq!(ui.pending_count(), 0);
    assert_eq!(calls.get(), 1);
    assert_eq!(grid.borrow().controllers().len(), 4);
}

#[test]
fn test_near_end_callback_appending_content_runs_once() {
    let ui = UiLoop::new();
    let calls = Rc::new(Cell::new(0));
    let sink = calls.clone();
    let (_, grid) = shared_grid_near_end(&ui, move |weak, tree| {
        sink.set(sink.get() + 1);
        if let Some(grid) = weak.upgrade() {
            grid.borrow_mut().add_controllers(tiles(tree, 4));
        }
    });

    ui.run_until_idle();

    assert_eq!(calls.get(), 1);
    assert_eq!(ui.pending_count(), 0);
    let grid = grid.borrow();
    assert_eq!(grid.controllers().len(), 8);
    assert_eq!(grid.section_count(), 8);
    assert_eq!(grid.lifecycle().attached_count(), 3);
    assert!(grid.diagnostics().is_empty());
}

#[test]
fn test_paging_snaps_to_pages() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 30, true, Logger::disabled());
    grid.set_items_per_section(3).unwrap();
    grid.set_rows_or_columns(3).unwrap();

    assert_eq!(grid.scroll_to(140.0).y, 0.0);
    assert_eq!(grid.scroll_to(160.0).y, 300.0);
    assert_eq!(grid.scroll_to(10_000.0).y, 700.0);
}

#[test]
fn test_scroll_signals_report_offset_changes() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 30, true, Logger::disabled());
    grid.set_items_per_section(3).unwrap();
    grid.set_rows_or_columns(3).unwrap();

    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = changes.clone();
    grid.content_offset_changed
        .connect(move |change: &ScrollChange| sink.borrow_mut().push(*change));

    grid.scroll_to(300.0);
    grid.scroll_to_top(true);
    // Already at the top: no change, no signal.
    grid.scroll_to_top(true);

    let changes = changes.borrow();
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0].to.y, 300.0);
    assert!(!changes[0].animated);
    assert_eq!(changes[1].from.y, 300.0);
    assert_eq!(changes[1].to.y, 0.0);
    assert!(changes[1].animated);
}

#[test]
fn test_update_controllers_replaces_content() {
    let ui = UiLoop::new();
    let (tree, mut grid) = setup(&ui, 5, true, Logger::disabled());
    grid.set_items_per_section(3).unwrap();
    grid.set_rows_or_columns(3).unwrap();
    grid.layout_if_needed();

    let counts = Rc::new(RefCell::new(Vec::new()));
    let sink = counts.clone();
    grid.controllers_changed
        .connect(move |count: &usize| sink.borrow_mut().push(*count));

    let old: Vec<ViewId> = grid.controllers().iter().map(|c| c.view()).collect();
    let replacement = tiles(&tree, 6);
    grid.update_controllers(replacement.clone());

    assert_eq!(grid.controllers(), replacement.as_slice());
    assert_eq!(grid.section_count(), 2);
    for view in old {
        assert_eq!(tree.superview(view).unwrap(), None);
    }
    assert_eq!(grid.lifecycle().attached_count(), 6);
    assert_eq!(*counts.borrow(), vec![6]);
}

#[test]
fn test_refresh_lifecycle() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 3, true, Logger::disabled());

    let pending: Rc<RefCell<Option<RefreshCompletion>>> = Rc::new(RefCell::new(None));
    let slot = pending.clone();
    grid.set_on_refresh(move |completion| *slot.borrow_mut() = Some(completion));

    assert_eq!(grid.on_pull_gesture(), PullOutcome::Started);
    assert!(pending.borrow().is_none(), "refresh runs on the next loop pass");
    ui.run_until_idle();
    assert!(grid.is_refreshing());

    assert_eq!(grid.on_pull_gesture(), PullOutcome::AlreadyRefreshing);

    let completion = pending.borrow_mut().take().unwrap();
    std::thread::spawn(move || completion.complete())
        .join()
        .unwrap();
    ui.run_until_idle();
    assert_eq!(grid.refresh_state(), RefreshState::Idle);

    assert_eq!(grid.on_pull_gesture(), PullOutcome::Started);
}

#[test]
fn test_stalled_refresh_stays_active() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 3, true, Logger::disabled());
    grid.set_on_refresh(drop);

    assert_eq!(grid.on_pull_gesture(), PullOutcome::Started);
    ui.run_until_idle();

    assert!(grid.is_refreshing());
    assert_eq!(grid.on_pull_gesture(), PullOutcome::AlreadyRefreshing);
}

#[test]
fn test_refresh_after_controller_dropped() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 3, true, Logger::disabled());
    let called = Rc::new(Cell::new(false));
    let sink = called.clone();
    grid.set_on_refresh(move |completion| {
        sink.set(true);
        completion.complete();
    });

    grid.on_pull_gesture();
    drop(grid);
    ui.run_until_idle();

    assert!(!called.get());
}

#[test]
fn test_pull_after_loop_closed() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 3, true, Logger::disabled());
    drop(ui);

    assert_eq!(grid.on_pull_gesture(), PullOutcome::LoopClosed);
    assert!(!grid.is_refreshing());
    assert_eq!(grid.diagnostics().len(), 1);
}

#[test]
fn test_horizontal_grid_disables_refresh() {
    let ui = UiLoop::new();
    let tree = SharedViewTree::new();
    let content = tiles(&tree, 8);
    let options = ControllerOptions::default()
        .with_axis(ScrollAxis::Horizontal)
        .with_viewport(Size::new(400.0, 200.0))
        .with_logger(Logger::disabled());
    let mut grid = GridScrollController::new(&ui.context(), tree, options, content);
    grid.set_items_per_section(2).unwrap();
    grid.set_rows_or_columns(2).unwrap();
    grid.set_section_inset(EdgeInsets::uniform(10.0)).unwrap();
    grid.set_inter_item_spacing(20.0).unwrap();
    grid.layout_if_needed();

    // (400 - 20 * 2) / 2 wide, (200 - 20 * 2 - 20) / 2 tall.
    assert_eq!(grid.last_item_size(), Size::new(180.0, 70.0));
    assert_eq!(grid.grid().metrics().section_extent, 200.0);
    assert!(grid.grid().presentation().always_bounce_horizontal);
    assert_eq!(grid.on_pull_gesture(), PullOutcome::Disabled);
}

#[test]
fn test_view_transition_resizes_items() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 9, true, Logger::disabled());
    grid.set_items_per_section(3).unwrap();
    grid.set_rows_or_columns(3).unwrap();
    grid.layout_if_needed();

    grid.view_will_transition(Size::new(600.0, 900.0)).unwrap();

    assert_eq!(grid.grid().viewport(), Size::new(600.0, 900.0));
    assert_eq!(grid.last_item_size(), Size::new(200.0, 300.0));
    assert_eq!(grid.grid().metrics().section_extent, 300.0);
    assert_eq!(grid.lifecycle().attached_count(), 9);
}

#[test]
fn test_invalid_settings_leave_layout_untouched() {
    let ui = UiLoop::new();
    let (_, mut grid) = setup(&ui, 9, true, Logger::disabled());
    grid.set_items_per_section(3).unwrap();
    grid.layout_if_needed();

    assert!(matches!(
        grid.set_items_per_section(0),
        Err(GridError::Configuration { field: "items_per_section", .. })
    ));
    assert!(matches!(
        grid.set_rows_or_columns(0),
        Err(GridError::Configuration { field: "rows_or_columns", .. })
    ));
    assert!(!grid.layout_if_needed());
    assert_eq!(grid.config().items_per_section, 3);
}

#[test]
fn test_host_messages_are_logged() {
    let output = capture(|| {
        let ui = UiLoop::new();
        let (tree, mut grid) = setup(&ui, 4, false, Logger::new("com.example.feed", "grid"));
        grid.set_rows_or_columns(3).unwrap();
        grid.layout_if_needed();

        grid.add_controllers(tiles(&tree, 1));
        grid.update_controllers(tiles(&tree, 4));
        grid.scroll_to(100.0);

        grid.on_pull_gesture();
        ui.run_until_idle();

        let cell = tree.create_view("cell");
        grid.will_display(cell, GridPosition::new(40, 0));
    });

    for message in [
        "Registering collection view.",
        "Adding controllers.",
        "Updating controllers.",
        "Remaining controllers '3'.",
        "Start refreshing.",
        "End refreshing.",
        "Failed to get controller for index path.",
    ] {
        assert!(output.contains(message), "missing {message:?} in:\n{output}");
    }
    assert!(output.contains("com.example.feed"));
}
