//! A paging feed of labels.
//!
//! Scrolls through a vertical grid of 3 rows by 5 labels, loading 50 more
//! labels whenever the feed runs low, then pulls to refresh. The refresh
//! relabels every item and completes three seconds later.
//!
//! Run with:
//!
//! ```sh
//! RUST_LOG=scrollgrid=debug cargo run -p scrollgrid --example paging_feed
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use scrollgrid::view_tree::{SharedViewTree, ViewId};
use scrollgrid::{
    ContentController, ContentHandle, ControllerOptions, EdgeInsets, GridScrollController,
    Logger, Size, TextContent, UiContext, UiLoop,
};
use tracing_subscriber::EnvFilter;

const PAGE_SIZE: usize = 50;
const REFRESH_DELAY: Duration = Duration::from_secs(3);

struct Label {
    view: ViewId,
    text: Mutex<String>,
}

impl ContentController for Label {
    fn view(&self) -> ViewId {
        self.view
    }

    fn text_content(&self) -> Option<&dyn TextContent> {
        Some(self)
    }
}

impl TextContent for Label {
    fn text(&self) -> String {
        self.text.lock().clone()
    }

    fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_owned();
    }
}

fn labels(tree: &SharedViewTree, range: std::ops::Range<usize>) -> Vec<ContentHandle> {
    range
        .map(|n| {
            ContentHandle::new(Label {
                view: tree.create_view("label"),
                text: Mutex::new(format!("{n}")),
            })
        })
        .collect()
}

fn install_callbacks(
    grid: &Rc<RefCell<GridScrollController>>,
    ctx: &UiContext,
    tree: &SharedViewTree,
) {
    let weak: Weak<RefCell<GridScrollController>> = Rc::downgrade(grid);
    let feed_tree = tree.clone();
    grid.borrow_mut().set_on_near_end(move || {
        let Some(grid) = weak.upgrade() else {
            return;
        };
        let mut grid = grid.borrow_mut();
        let start = grid.controllers().len();
        tracing::info!(start, "loading more labels");
        grid.add_controllers(labels(&feed_tree, start..start + PAGE_SIZE));
    });

    let weak = Rc::downgrade(grid);
    let ctx = ctx.clone();
    grid.borrow_mut().set_on_refresh(move |completion| {
        let weak = weak.clone();
        let scheduled = ctx.post_after(REFRESH_DELAY, move || {
            if let Some(grid) = weak.upgrade() {
                for handle in grid.borrow().controllers() {
                    if let Some(label) = handle.text_content() {
                        label.set_text("Refreshed");
                    }
                }
            }
            completion.complete();
        });
        if let Err(err) = scheduled {
            tracing::warn!(%err, "could not schedule refresh");
        }
    });
}

fn configure(grid: &mut GridScrollController) -> scrollgrid::Result<()> {
    grid.set_rows_or_columns(3)?;
    grid.set_items_per_section(5)?;
    grid.set_section_inset(EdgeInsets::new(5.0, 10.0, 5.0, 10.0))?;
    grid.set_inter_item_spacing(10.0)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ui = UiLoop::new();
    let ctx = ui.context();
    let tree = SharedViewTree::new();

    let options = ControllerOptions::default()
        .with_viewport(Size::new(390.0, 630.0))
        .with_logger(Logger::new("com.example.feed", "PagingFeed"));
    let grid = Rc::new(RefCell::new(GridScrollController::new(
        &ctx,
        tree.clone(),
        options,
        labels(&tree, 0..PAGE_SIZE),
    )));

    {
        let mut grid = grid.borrow_mut();
        if let Err(err) = configure(&mut grid) {
            tracing::error!(%err, "invalid grid configuration");
            return;
        }
        grid.layout_if_needed();
        tracing::info!(item_size = ?grid.last_item_size(), sections = grid.section_count(), "feed ready");
    }
    install_callbacks(&grid, &ctx, &tree);

    // Page through the feed. Near-end requests run between pages.
    for page in 1..=12 {
        let offset = grid.borrow_mut().scroll_to(page as f32 * 630.0);
        ui.run_until_idle();
        tracing::info!(page, offset = offset.y, items = grid.borrow().controllers().len(), "paged");
    }

    let outcome = grid.borrow_mut().on_pull_gesture();
    tracing::info!(?outcome, "pulled to refresh");
    ui.run_until(|| !grid.borrow().is_refreshing());

    let grid = grid.borrow();
    let first = grid
        .controllers()
        .first()
        .and_then(|handle| handle.text_content().map(|label| label.text()));
    tracing::info!(
        items = grid.controllers().len(),
        first = first.as_deref().unwrap_or("-"),
        diagnostics = grid.diagnostics().len(),
        "done"
    );
}
