//! One interactive grid instance.
//!
//! [`Grid`] owns the selection, the edit sessions and the validation state
//! for one dataset, and holds the host's collaborators. Several grids can
//! live side by side; nothing here is global.
//!
//! The host forwards input events (`handle_key`, `pointer_*`, `*_edit`) and
//! calls [`Grid::tick`] from its event loop to fire debounce timers, drive
//! drag auto-scroll and advance bulk revalidation.

use std::rc::Rc;

use tracing::debug;

use crate::adapter::{
    CellStore, CommitSink, GeometryProvider, GridEvents, NoopCommitSink, NoopEvents,
    StructureStore, ValidationRules,
};
use crate::clipboard::{
    copy_block, parse_block, place_block, serialize_block, ClipboardBackend, MemoryClipboard,
};
use crate::clock::{Clock, SystemClock};
use crate::commit::{commit_cell, CommitMode, CommitOutcome, CommitTarget};
use crate::config::GridConfig;
use crate::editor::{EditCommit, EditController, EditKeyOutcome, EditingSession, OpenRequest};
use crate::error::{GridError, Result};
use crate::layout::{GridGeometry, GridLayout};
use crate::navigation::{next_cell, route_key, KeyInput, NavAction, NavContext};
use crate::remap::{apply_column_remap, apply_rows_deleted, apply_rows_inserted, ColumnRemap};
use crate::selection::{AutoScroller, SelectionState, SelectionSystem};
use crate::types::{CellPos, CellValue, ColumnDescriptor, PasteSummary, ValidationError, ValidationOutcome};
use crate::validation::{
    ErrorStore, RevalidationReport, RevalidationStatus, RuleSet, SharedRules, ValidationManager,
};

/// Pointer button of a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// Modifier keys held during a pointer press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    /// Ctrl, or Cmd on macOS.
    pub ctrl: bool,
}

/// What one [`Grid::tick`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Debounced validations that ran.
    pub validations: usize,
    /// The drag target moved because of auto-scroll.
    pub scrolled: bool,
    /// Set when a bulk revalidation finished on this tick.
    pub revalidated: Option<RevalidationReport>,
}

fn accept_all(_: &CellValue, _: &str) -> ValidationOutcome {
    ValidationOutcome::ok()
}

/// Number of header rows implied by the columns' header row indices.
fn header_rows(columns: &[ColumnDescriptor]) -> u32 {
    columns
        .iter()
        .map(|c| c.header_row.unsigned_abs())
        .max()
        .unwrap_or(1)
        .max(1)
}

/// Builder for [`Grid`].
pub struct GridBuilder<S: CellStore> {
    store: S,
    config: GridConfig,
    rules: Option<RuleSet>,
    geometry: Option<Box<dyn GeometryProvider>>,
    sink: Box<dyn CommitSink>,
    events: Box<dyn GridEvents>,
    clock: Rc<dyn Clock>,
    clipboard: Box<dyn ClipboardBackend>,
    text_editor: Option<Box<dyn EditingSession>>,
}

impl<S: CellStore> GridBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: GridConfig::default(),
            rules: None,
            geometry: None,
            sink: Box::new(NoopCommitSink),
            events: Box::new(NoopEvents),
            clock: Rc::new(SystemClock::new()),
            clipboard: Box::new(MemoryClipboard::new()),
            text_editor: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    /// Rules evaluated on this thread only.
    #[must_use]
    pub fn rules(mut self, rules: impl ValidationRules + 'static) -> Self {
        self.rules = Some(RuleSet::Local(Box::new(rules)));
        self
    }

    /// Rules that may also run on a background worker.
    #[must_use]
    pub fn shared_rules(mut self, rules: SharedRules) -> Self {
        self.rules = Some(RuleSet::Shared(rules));
        self
    }

    #[must_use]
    pub fn geometry(mut self, geometry: impl GeometryProvider + 'static) -> Self {
        self.geometry = Some(Box::new(geometry));
        self
    }

    #[must_use]
    pub fn commit_sink(mut self, sink: impl CommitSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    #[must_use]
    pub fn events(mut self, events: impl GridEvents + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn clipboard(mut self, clipboard: impl ClipboardBackend + 'static) -> Self {
        self.clipboard = Box::new(clipboard);
        self
    }

    /// Editing strategy for non-date columns. Defaults to the overlay.
    #[must_use]
    pub fn text_editor(mut self, editor: impl EditingSession + 'static) -> Self {
        self.text_editor = Some(Box::new(editor));
        self
    }

    pub fn build(self) -> Result<Grid<S>> {
        self.config.validate()?;
        let rows = self.store.row_count();
        let cols = self.store.column_count();
        let headers = header_rows(self.store.columns());
        let geometry = self.geometry.unwrap_or_else(|| {
            let mut layout = GridLayout::uniform(cols, rows);
            layout.header_rows = headers;
            Box::new(GridGeometry::new(layout, 800.0, 600.0))
        });
        let rules = self
            .rules
            .unwrap_or_else(|| RuleSet::Local(Box::new(accept_all)));
        let editor = match self.text_editor {
            Some(text) => EditController::new(text),
            None => EditController::default(),
        };
        Ok(Grid {
            validation: ValidationManager::new(rules, &self.config),
            scroller: AutoScroller::new(&self.config),
            selection: SelectionSystem::new(rows, cols, headers),
            editor,
            geometry,
            sink: self.sink,
            events: self.events,
            clock: self.clock,
            clipboard: self.clipboard,
            store: self.store,
            config: self.config,
        })
    }
}

/// State and collaborators of one grid.
pub struct Grid<S: CellStore> {
    config: GridConfig,
    store: S,
    selection: SelectionSystem,
    editor: EditController,
    validation: ValidationManager,
    scroller: AutoScroller,
    geometry: Box<dyn GeometryProvider>,
    sink: Box<dyn CommitSink>,
    events: Box<dyn GridEvents>,
    clock: Rc<dyn Clock>,
    clipboard: Box<dyn ClipboardBackend>,
}

impl<S: CellStore> std::fmt::Debug for Grid<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("rows", &self.store.row_count())
            .field("cols", &self.store.column_count())
            .field("selection", self.selection.state())
            .field("errors", &self.validation.errors().len())
            .finish()
    }
}

impl<S: CellStore> Grid<S> {
    pub fn builder(store: S) -> GridBuilder<S> {
        GridBuilder::new(store)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct access for host-side restructuring. Report the change with
    /// [`Self::rows_inserted`], [`Self::rows_deleted`] or
    /// [`Self::columns_changed`] afterwards.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn selection(&self) -> &SelectionSystem {
        &self.selection
    }

    pub fn selection_state(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn editor(&self) -> &EditController {
        &self.editor
    }

    pub fn validation(&self) -> &ValidationManager {
        &self.validation
    }

    pub fn errors(&self) -> &ErrorStore {
        self.validation.errors()
    }

    pub fn geometry(&self) -> &dyn GeometryProvider {
        self.geometry.as_ref()
    }

    /// Error shown on the cell at `pos`, if any.
    pub fn error_at(&self, pos: CellPos) -> Option<&ValidationError> {
        let row = pos.body_row()?;
        let column = self.store.column_at(pos.col)?;
        self.validation.errors().at(row, &column.key())
    }

    pub fn cell_value(&self, pos: CellPos) -> Option<CellValue> {
        let column = self.store.column_at(pos.col)?;
        Some(self.store.cell_value(pos.row, column))
    }

    fn nav_context(&self) -> NavContext<'_> {
        NavContext::new(
            self.store.columns(),
            self.store.row_count(),
            self.config.editable_header_row,
        )
    }

    fn now(&self) -> f64 {
        self.clock.now_ms()
    }

    fn commit(
        &mut self,
        pos: CellPos,
        value: CellValue,
        original: Option<&CellValue>,
        mode: CommitMode,
    ) -> Result<CommitOutcome> {
        let now = self.now();
        let mut target = CommitTarget {
            store: &mut self.store,
            sink: self.sink.as_mut(),
            validation: &mut self.validation,
        };
        commit_cell(&mut target, pos, value, original, mode, now)
    }

    /// Earliest time the host should call [`Self::tick`] again.
    pub fn next_deadline(&self) -> Option<f64> {
        match (
            self.validation.pending().next_deadline(),
            self.scroller.next_deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire due timers, auto-scroll a drag, and advance bulk revalidation.
    pub fn tick(&mut self) -> TickReport {
        let now = self.now();
        let mut report = TickReport {
            validations: self.validation.flush_due(now),
            ..TickReport::default()
        };
        if self.selection.is_dragging() {
            if let Some(pos) = self.scroller.tick(now, self.geometry.as_mut()) {
                report.scrolled = self.selection.update_drag_selection(pos);
            }
        }
        if self.validation.is_revalidating() {
            report.revalidated = self.validation.poll_revalidation(self.events.as_mut());
        }
        report
    }

    // ---- selection --------------------------------------------------------

    /// Select one cell and scroll it into view.
    pub fn select_cell(&mut self, pos: CellPos) -> bool {
        self.move_to(pos)
    }

    /// Extend the range from the anchor to `pos`.
    pub fn extend_selection(&mut self, pos: CellPos) -> bool {
        self.selection.extend_selection(pos)
    }

    pub fn select_all(&mut self) -> bool {
        self.selection.select_all()
    }

    // ---- keyboard ---------------------------------------------------------

    /// Route a key press. Returns whether the grid handled it.
    pub fn handle_key(&mut self, input: KeyInput) -> Result<bool> {
        if self.editor.is_open() {
            return self.handle_edit_key(input);
        }
        let action = route_key(input, self.selection.state(), &self.nav_context());
        self.apply_action(action)
    }

    fn handle_edit_key(&mut self, input: KeyInput) -> Result<bool> {
        let column = self.editor.column().cloned();
        match self.editor.handle_key(input) {
            EditKeyOutcome::Ignored => Ok(false),
            EditKeyOutcome::Updated => {
                self.validate_draft();
                Ok(true)
            }
            EditKeyOutcome::Committed { commit, advance } => {
                let from = commit.pos;
                self.finish_commit(commit)?;
                let target = next_cell(from, advance, &self.nav_context());
                self.move_to(target);
                Ok(true)
            }
            EditKeyOutcome::Cancelled { pos, original } => {
                self.finish_cancel(pos, original, column);
                Ok(true)
            }
        }
    }

    fn apply_action(&mut self, action: NavAction) -> Result<bool> {
        match action {
            NavAction::None => Ok(false),
            NavAction::Move(pos) => Ok(self.move_to(pos)),
            NavAction::Extend(pos) => {
                let changed = self.selection.extend_selection(pos);
                if changed {
                    self.geometry.ensure_visible(pos);
                }
                Ok(changed)
            }
            NavAction::Collapse => Ok(self
                .selection
                .selected_cell()
                .is_some_and(|pos| self.selection.select_cell(pos))),
            NavAction::SelectAll => Ok(self.selection.select_all()),
            NavAction::BeginEdit { pos, initial } => self.begin_edit(pos, initial),
            NavAction::Copy => self.copy().map(|_| true),
            NavAction::Paste => self.paste().map(|_| true),
            NavAction::Clear => self.clear_selection().map(|n| n > 0),
        }
    }

    fn move_to(&mut self, pos: CellPos) -> bool {
        let moved = self.selection.select_cell(pos);
        if moved {
            self.geometry.ensure_visible(pos);
        }
        moved
    }

    // ---- editing ----------------------------------------------------------

    /// Open an editor on `pos`. `initial` seeds it for type-to-edit.
    ///
    /// An edit already open elsewhere is committed first.
    pub fn begin_edit(&mut self, pos: CellPos, initial: Option<String>) -> Result<bool> {
        if self.editor.is_open() {
            if self.editor.cell() == Some(pos) {
                return Ok(false);
            }
            self.confirm_edit()?;
        }
        if !self.nav_context().is_editable(pos) {
            return Ok(false);
        }
        let column = self
            .store
            .column_at(pos.col)
            .cloned()
            .ok_or(GridError::UnknownColumn(pos.col))?;
        let current = self.store.cell_value(pos.row, &column);
        // Virtualized rows only have a rect once scrolled into view.
        self.geometry.ensure_visible(pos);
        let rect = self.geometry.cell_rect(pos);
        if !self.selection.start_editing(pos) {
            return Ok(false);
        }
        let seeded = initial.is_some();
        let mut request = OpenRequest::new(pos, current).with_rect(rect);
        request.initial = initial;
        self.editor.open(request, &column);
        if seeded {
            self.validate_draft();
        }
        Ok(true)
    }

    /// The surface's text changed.
    pub fn input_edit(&mut self, text: &str) -> bool {
        let updated = self.editor.input(text);
        if updated {
            self.validate_draft();
        }
        updated
    }

    /// Commit the open edit. Returns `None` when nothing was open.
    pub fn confirm_edit(&mut self) -> Result<Option<CommitOutcome>> {
        match self.editor.confirm() {
            Some(commit) => self.finish_commit(commit).map(Some),
            None => Ok(None),
        }
    }

    /// Close the open edit without writing.
    pub fn cancel_edit(&mut self) -> bool {
        let column = self.editor.column().cloned();
        match self.editor.cancel() {
            Some((pos, original)) => {
                self.finish_cancel(pos, original, column);
                true
            }
            None => false,
        }
    }

    /// Focus left the editor surface.
    pub fn blur_edit(&mut self) -> Result<Option<CommitOutcome>> {
        let Some(pos) = self.editor.cell() else {
            return Ok(None);
        };
        let original = self.cell_value(pos).unwrap_or_default();
        let column = self.editor.column().cloned();
        match self.editor.blur() {
            Some(commit) => self.finish_commit(commit).map(Some),
            None => {
                self.finish_cancel(pos, original, column);
                Ok(None)
            }
        }
    }

    /// Debounced validation of the value being typed.
    fn validate_draft(&mut self) {
        let (Some(pos), Some(value)) = (self.editor.cell(), self.editor.value()) else {
            return;
        };
        let (Some(row), Some(column)) = (pos.body_row(), self.store.column_at(pos.col).cloned())
        else {
            return;
        };
        let now = self.now();
        self.validation
            .validate_cell(row, &column, value, false, now);
    }

    fn finish_commit(&mut self, commit: EditCommit) -> Result<CommitOutcome> {
        self.selection.stop_editing(true);
        let outcome = self.commit(
            commit.pos,
            commit.value,
            Some(&commit.original),
            CommitMode::Interactive,
        )?;
        if !outcome.written {
            // A draft may have armed a timer or left an error; settle on the kept value.
            self.revalidate_cell(commit.pos, commit.original);
        }
        Ok(outcome)
    }

    /// `column` is the one the session opened on; the store's column at
    /// `pos.col` may have changed since.
    fn finish_cancel(
        &mut self,
        pos: CellPos,
        original: CellValue,
        column: Option<ColumnDescriptor>,
    ) {
        self.selection.stop_editing(false);
        let Some(column) = column.or_else(|| self.store.column_at(pos.col).cloned()) else {
            return;
        };
        self.revalidate_with(pos, &column, original);
    }

    fn revalidate_cell(&mut self, pos: CellPos, value: CellValue) {
        if let Some(column) = self.store.column_at(pos.col).cloned() {
            self.revalidate_with(pos, &column, value);
        }
    }

    fn revalidate_with(&mut self, pos: CellPos, column: &ColumnDescriptor, value: CellValue) {
        let Some(row) = pos.body_row() else {
            return;
        };
        let now = self.now();
        self.validation.validate_cell(row, column, value, true, now);
    }

    // ---- pointer ----------------------------------------------------------

    /// Pointer pressed at a screen point.
    pub fn pointer_down(
        &mut self,
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Result<bool> {
        let Some(pos) = self.geometry.cell_at_point(x, y) else {
            return Ok(false);
        };
        if self.editor.is_open() {
            if self.editor.cell() == Some(pos) {
                return Ok(false);
            }
            self.confirm_edit()?;
        }
        let changed = match button {
            PointerButton::Secondary => self.selection.context_click(pos),
            PointerButton::Primary if modifiers.shift => self.selection.extend_selection(pos),
            PointerButton::Primary if modifiers.ctrl => self.selection.toggle_individual_cell(pos),
            PointerButton::Primary => self.selection.start_drag(pos),
        };
        Ok(changed)
    }

    /// Pointer moved. Extends a drag and arms edge auto-scroll.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        if !self.selection.is_dragging() {
            return false;
        }
        let now = self.now();
        let viewport = self.geometry.viewport_rect();
        self.scroller.pointer_moved(x, y, viewport, now);
        match self.geometry.cell_at_point(x, y) {
            Some(pos) => self.selection.update_drag_selection(pos),
            None => false,
        }
    }

    /// Pointer released. Ends a drag and stops auto-scroll.
    pub fn pointer_up(&mut self) -> bool {
        self.scroller.stop();
        self.selection.end_drag_selection()
    }

    /// Double click opens an editor on the cell.
    pub fn double_click(&mut self, x: f32, y: f32) -> Result<bool> {
        match self.geometry.cell_at_point(x, y) {
            Some(pos) => self.begin_edit(pos, None),
            None => Ok(false),
        }
    }

    /// Click on a row header.
    pub fn row_header_click(&mut self, row: i32, modifiers: Modifiers) -> bool {
        if modifiers.ctrl {
            return self.selection.toggle_individual_row(row);
        }
        if modifiers.shift {
            if let Some(anchor) = self.selection.state().anchor {
                return self.selection.select_row_range(anchor.row, row);
            }
        }
        self.selection.select_row(row)
    }

    // ---- clipboard --------------------------------------------------------

    /// Copy the rectangular selection to the clipboard. Returns the text.
    pub fn copy(&mut self) -> Result<String> {
        let Some((min, max)) = self.selection.bounds() else {
            return Ok(String::new());
        };
        let text = serialize_block(&copy_block(&self.store, min, max));
        self.clipboard.write_text(&text)?;
        Ok(text)
    }

    /// Paste the clipboard at the selected cell.
    pub fn paste(&mut self) -> Result<PasteSummary> {
        let text = self.clipboard.read_text()?;
        self.paste_text(&text)
    }

    /// Paste tab-separated text at the selected cell.
    ///
    /// Cells past the grid edge, in read-only columns or on non-editable
    /// header cells are skipped. Every written cell is validated at once.
    pub fn paste_text(&mut self, text: &str) -> Result<PasteSummary> {
        if self.editor.is_open() {
            return Ok(PasteSummary::default());
        }
        let Some(anchor) = self
            .selection
            .selected_cell()
            .or_else(|| self.selection.bounds().map(|(min, _)| min))
        else {
            return Ok(PasteSummary::default());
        };
        let block = parse_block(text);
        let cells = place_block(
            &block,
            anchor,
            self.store.row_count(),
            self.store.column_count(),
        );
        let multi_cell = cells.len() > 1;
        let mut written = 0;
        let mut invalid = 0;
        let mut last = anchor;
        for cell in cells {
            if !self.nav_context().is_editable(cell.pos) {
                continue;
            }
            let outcome = self.commit(
                cell.pos,
                CellValue::from_input(&cell.text),
                None,
                CommitMode::Paste,
            )?;
            if outcome.written {
                written += 1;
                last = CellPos::new(last.row.max(cell.pos.row), last.col.max(cell.pos.col));
            }
            if outcome.valid == Some(false) {
                invalid += 1;
            }
        }
        let summary = PasteSummary::new(written, invalid);
        if multi_cell {
            self.events.on_summary(&summary);
        }
        if self.selection.select_cell(anchor) && last != anchor {
            self.selection.extend_selection(last);
        }
        debug!(written, invalid, "paste finished");
        Ok(summary)
    }

    /// Clear every editable selected cell. Returns how many changed.
    pub fn clear_selection(&mut self) -> Result<usize> {
        if self.editor.is_open() {
            return Ok(0);
        }
        let mut cleared = 0;
        for pos in self.selection.selected_positions() {
            if !self.nav_context().is_editable(pos) {
                continue;
            }
            let current = self.cell_value(pos).unwrap_or_default();
            if current.is_empty() {
                continue;
            }
            let outcome = self.commit(pos, CellValue::Null, Some(&current), CommitMode::Interactive)?;
            if outcome.written {
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    /// Write a block of values starting at `anchor` through the commit path,
    /// reporting progress per row and one summary at the end.
    pub fn import_block(&mut self, anchor: CellPos, rows: &[Vec<CellValue>]) -> Result<PasteSummary> {
        let row_limit = self.store.row_count();
        let col_count = self.store.column_count();
        let mut written = 0;
        let mut invalid = 0;
        for (i, values) in rows.iter().enumerate() {
            let Some(row) = i32::try_from(i)
                .ok()
                .and_then(|i| anchor.row.checked_add(i))
                .filter(|&r| usize::try_from(r).is_ok_and(|r| r < row_limit))
            else {
                break;
            };
            for (j, value) in values.iter().enumerate() {
                let Some(col) = u32::try_from(j)
                    .ok()
                    .and_then(|j| anchor.col.checked_add(j))
                    .filter(|&c| c < col_count)
                else {
                    break;
                };
                let pos = CellPos::new(row, col);
                if !self.nav_context().is_editable(pos) {
                    continue;
                }
                let outcome = self.commit(pos, value.clone(), None, CommitMode::Paste)?;
                written += usize::from(outcome.written);
                invalid += usize::from(outcome.valid == Some(false));
            }
            self.events
                .on_progress((i + 1) as f32 * 100.0 / rows.len() as f32);
        }
        let summary = PasteSummary::new(written, invalid);
        self.events.on_summary(&summary);
        Ok(summary)
    }

    // ---- validation -------------------------------------------------------

    /// Validate a cell's current value now.
    pub fn validate_cell(&mut self, pos: CellPos) -> Option<bool> {
        let row = pos.body_row()?;
        let column = self.store.column_at(pos.col)?.clone();
        let value = self.store.cell_value(pos.row, &column);
        let now = self.now();
        self.validation.validate_cell(row, &column, value, true, now)
    }

    /// Run every pending debounce timer now.
    pub fn flush_validation(&mut self) -> usize {
        self.validation.flush_all()
    }

    /// Start a bulk revalidation advanced by [`Self::tick`].
    pub fn start_revalidation(&mut self) -> RevalidationStatus {
        self.validation.start_revalidation(&self.store)
    }

    /// Revalidate every editable body cell to completion.
    pub fn revalidate_all(&mut self) -> RevalidationReport {
        self.validation
            .revalidate_all(&self.store, self.events.as_mut())
    }

    // ---- structure --------------------------------------------------------

    /// Close any edit, drag and running revalidation before keys are
    /// rewritten. A cancelled edit settles on its original value under the
    /// old identity, so the rekey carries it along.
    fn before_restructure(&mut self) {
        self.cancel_edit();
        self.validation.cancel_revalidation();
        self.scroller.stop();
        self.selection.end_drag_selection();
    }

    fn after_restructure(&mut self) {
        let rows = self.store.row_count();
        let cols = self.store.column_count();
        self.selection.clamp_to(rows, cols);
        self.geometry.grid_resized(rows, cols);
    }

    /// The host inserted `count` rows before `at` in its own store.
    pub fn rows_inserted(&mut self, at: usize, count: usize) {
        self.before_restructure();
        apply_rows_inserted(&mut self.validation, at, count);
        self.after_restructure();
    }

    /// The host deleted the rows at `deleted` from its own store.
    pub fn rows_deleted(&mut self, deleted: &[usize]) {
        self.before_restructure();
        apply_rows_deleted(&mut self.validation, deleted);
        self.after_restructure();
    }

    /// The host changed its columns; `remap` says how identities moved.
    pub fn columns_changed(&mut self, remap: &ColumnRemap) -> usize {
        self.before_restructure();
        let dropped = apply_column_remap(&mut self.validation, remap, &self.store);
        self.after_restructure();
        dropped
    }
}

impl<S: StructureStore> Grid<S> {
    /// Insert `count` empty rows before `at`, shifting errors below.
    pub fn insert_rows(&mut self, at: usize, count: usize) -> usize {
        let at = self.store.insert_rows(at, count);
        self.rows_inserted(at, count);
        at
    }

    /// Delete rows, dropping their errors and shifting the rest up.
    pub fn delete_rows(&mut self, indices: &[usize]) -> Vec<usize> {
        let removed = self.store.delete_rows(indices);
        self.rows_deleted(&removed);
        removed
    }

    /// Replace the column set, inferring how identities moved.
    pub fn set_columns(&mut self, columns: Vec<ColumnDescriptor>) -> usize {
        let old = self.store.columns().to_vec();
        self.store.set_columns(columns);
        let remap = ColumnRemap::between(&old, self.store.columns());
        self.columns_changed(&remap)
    }

    /// Replace the column set with a known remap, e.g.
    /// [`ColumnRemap::insert_columns`].
    pub fn restructure_columns(
        &mut self,
        columns: Vec<ColumnDescriptor>,
        remap: &ColumnRemap,
    ) -> usize {
        self.store.set_columns(columns);
        self.columns_changed(remap)
    }
}
