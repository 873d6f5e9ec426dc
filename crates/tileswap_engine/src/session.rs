//! Puzzle session: the level lifecycle controller.
//!
//! A session owns the catalog, the tile registry of the current level, the
//! selection machine and the lifecycle phase. Render and input layers borrow
//! it; nothing else holds engine state.
//!
//! Image acquisition happens outside. `load_level` hands out a
//! [`LoadRequest`]; the caller fetches the image however it likes and
//! reports back through `complete_load` with the request's ticket. A
//! ticket from a superseded load is ignored.

use crate::acquisition::{AcquisitionError, LoadOutcome, LoadRequest, LoadTicket, Raster};
use crate::config::EngineConfig;
use crate::error::LifecycleError;
use crate::geometry::{partition, DisplayGrid, GridShape};
use crate::level::{LevelCatalog, LevelDescriptor};
use crate::phases::{CellView, Phase, SessionEvent, TapOutcome};
use crate::registry::TileRegistry;
use crate::selection::{Selection, SelectionMachine, Transition};
use crate::shuffle::{shuffle, FisherYates, Shuffler};
use crate::solved::{is_solved, tiles_home, SolvedCache};
use rand::rngs::StdRng;
use tracing::{debug, error, info, instrument, warn};

/// Everything built for the level currently on screen.
#[derive(Debug, Clone)]
struct Board {
    descriptor: LevelDescriptor,
    raster: Raster,
    display: DisplayGrid,
    registry: TileRegistry,
}

/// Engine state for one player.
#[derive(Debug)]
pub struct PuzzleSession<S = FisherYates<StdRng>> {
    config: EngineConfig,
    catalog: LevelCatalog,
    shuffler: S,
    phase: Phase,
    level_index: usize,
    generation: u64,
    pending: Option<LoadTicket>,
    board: Option<Board>,
    selection: SelectionMachine,
    solved: SolvedCache,
    completion_signalled: bool,
    events: Vec<SessionEvent>,
}

impl PuzzleSession<FisherYates<StdRng>> {
    /// Session shuffling with an OS-seeded generator.
    pub fn with_os_rng(config: EngineConfig, catalog: LevelCatalog) -> Self {
        Self::new(config, catalog, FisherYates::from_os_rng())
    }
}

impl<S: Shuffler> PuzzleSession<S> {
    /// Creates a session in `Loading` with nothing requested yet.
    ///
    /// Call [`start`](Self::start) to request the first level.
    #[instrument(skip_all, fields(levels = catalog.len()))]
    pub fn new(config: EngineConfig, catalog: LevelCatalog, shuffler: S) -> Self {
        info!(
            canvas_width = config.canvas_width,
            canvas_height = config.canvas_height,
            "Creating puzzle session"
        );
        Self {
            config,
            catalog,
            shuffler,
            phase: Phase::Loading,
            level_index: 0,
            generation: 0,
            pending: None,
            board: None,
            selection: SelectionMachine::new(0),
            solved: SolvedCache::default(),
            completion_signalled: false,
            events: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Level transitions
    // ─────────────────────────────────────────────────────────────

    /// Requests the first level.
    pub fn start(&mut self) -> Result<Option<LoadRequest>, LifecycleError> {
        self.load_level(0)
    }

    /// Starts loading the level at `index`, superseding any pending load.
    ///
    /// The current board is discarded immediately. An index past the end of
    /// the catalog moves the session to `AllLevelsComplete` and returns
    /// `Ok(None)`.
    #[instrument(skip(self), fields(phase = %self.phase, generation = self.generation))]
    pub fn load_level(&mut self, index: usize) -> Result<Option<LoadRequest>, LifecycleError> {
        if self.phase.is_terminal() {
            return Err(LifecycleError::Terminal);
        }
        if let Some(stale) = self.pending {
            debug!(?stale, "Superseding pending load");
        }

        self.generation += 1;
        self.phase = Phase::Loading;
        self.board = None;
        self.selection = SelectionMachine::new(0);
        self.solved.invalidate();
        self.completion_signalled = false;

        let Some(descriptor) = self.catalog.get(index).cloned() else {
            info!(index, levels = self.catalog.len(), "No level left to load");
            self.pending = None;
            self.phase = Phase::AllLevelsComplete;
            self.events.push(SessionEvent::AllLevelsComplete);
            return Ok(None);
        };

        self.level_index = index;
        let ticket = LoadTicket::new(self.generation, index);
        self.pending = Some(ticket);
        self.events.push(SessionEvent::LevelLoading {
            level_index: index,
            generation: self.generation,
        });

        let image = descriptor.image_reference();
        info!(
            index,
            generation = self.generation,
            image = %image,
            fetch_path = %image.fetch_path(),
            "Level loading"
        );
        Ok(Some(LoadRequest {
            ticket,
            image,
            descriptor,
            canvas: (self.config.canvas_width, self.config.canvas_height),
        }))
    }

    /// Loads the level carrying `level_number`.
    pub fn load_level_number(&mut self, level_number: u32) -> Result<Option<LoadRequest>, LifecycleError> {
        let index = self
            .catalog
            .index_of_number(level_number)
            .ok_or(LifecycleError::UnknownLevel(level_number))?;
        self.load_level(index)
    }

    /// Moves on to the next level. Only valid once the current one is solved.
    #[instrument(skip(self), fields(phase = %self.phase, level = self.level_index))]
    pub fn advance(&mut self) -> Result<Option<LoadRequest>, LifecycleError> {
        match self.phase {
            Phase::Solved => self.load_level(self.level_index + 1),
            Phase::AllLevelsComplete => Err(LifecycleError::Terminal),
            phase => Err(LifecycleError::NotSolved(phase)),
        }
    }

    /// Delivers the result of an image acquisition.
    ///
    /// A failed acquisition is not fatal: the level is built on a placeholder
    /// raster of canvas size and an `AcquisitionFailed` event is queued.
    #[instrument(skip(self, result), fields(phase = %self.phase, pending = ?self.pending))]
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Raster, AcquisitionError>,
    ) -> LoadOutcome {
        if self.pending != Some(ticket) {
            debug!(?ticket, "Discarding stale completion");
            return LoadOutcome::Stale;
        }
        self.pending = None;

        let Some(descriptor) = self.catalog.get(ticket.level_index).cloned() else {
            error!(?ticket, "Pending ticket points outside the catalog");
            return LoadOutcome::Stale;
        };

        let (raster, outcome) = match result {
            Ok(raster) => (raster, LoadOutcome::Ready),
            Err(e) => {
                warn!(error = %e, "Image acquisition failed, using placeholder");
                self.events.push(SessionEvent::AcquisitionFailed {
                    level_index: ticket.level_index,
                    message: e.to_string(),
                });
                (
                    Raster::placeholder(self.config.canvas_width, self.config.canvas_height),
                    LoadOutcome::ReadyWithPlaceholder,
                )
            }
        };

        let shape = descriptor.grid_shape();
        let placeholder = raster.is_placeholder();
        self.install(descriptor, raster, shape);
        self.events.push(SessionEvent::LevelReady {
            level_index: ticket.level_index,
            placeholder,
        });
        self.settle_if_trivially_solved();
        outcome
    }

    /// Re-runs the shuffle on the current level without reloading the image.
    #[instrument(skip(self), fields(phase = %self.phase, level = self.level_index))]
    pub fn reshuffle(&mut self) -> Result<(), LifecycleError> {
        if !self.phase.has_level() {
            return Err(LifecycleError::NotPlayable(self.phase));
        }
        let Some(board) = self.board.as_mut() else {
            return Err(LifecycleError::NotPlayable(self.phase));
        };

        self.phase = Phase::Loading;
        let draws = shuffle(&mut board.registry, &mut self.shuffler);
        self.selection.reset();
        self.solved.invalidate();
        self.completion_signalled = false;
        self.phase = Phase::Ready;
        debug!(draws, "Reshuffled");

        self.settle_if_trivially_solved();
        Ok(())
    }

    /// Rebuilds the current level with a different grid shape.
    #[instrument(skip(self), fields(phase = %self.phase, level = self.level_index))]
    pub fn regrid(&mut self, shape: GridShape) -> Result<(), LifecycleError> {
        if !self.phase.has_level() {
            return Err(LifecycleError::NotPlayable(self.phase));
        }
        let Some(board) = self.board.take() else {
            return Err(LifecycleError::NotPlayable(self.phase));
        };

        self.phase = Phase::Loading;
        self.install(board.descriptor, board.raster, shape);
        info!(%shape, "Regridded");
        self.settle_if_trivially_solved();
        Ok(())
    }

    /// Puts every tile in its correct slot and marks the level solved.
    #[instrument(skip(self), fields(phase = %self.phase, level = self.level_index))]
    pub fn reveal_solution(&mut self) -> Result<(), LifecycleError> {
        if self.phase != Phase::Ready {
            return Err(LifecycleError::NotPlayable(self.phase));
        }
        let Some(board) = self.board.as_mut() else {
            return Err(LifecycleError::NotPlayable(self.phase));
        };
        board.registry.reset_to_identity();
        self.solved.refresh(&board.registry);
        self.mark_solved();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    //  Interaction
    // ─────────────────────────────────────────────────────────────

    /// Feeds a tap on `slot`.
    ///
    /// Taps are discarded, never queued, unless the session is `Ready`.
    #[instrument(skip(self), fields(phase = %self.phase))]
    pub fn tap(&mut self, slot: usize) -> TapOutcome {
        if self.phase != Phase::Ready {
            debug!("Tap discarded");
            return TapOutcome::Discarded;
        }
        let Some(board) = self.board.as_mut() else {
            return TapOutcome::Discarded;
        };

        let transition = match self.selection.tap(slot) {
            Some(transition) => transition,
            None => return TapOutcome::OutOfRange,
        };

        match transition {
            Transition::Select(slot) => TapOutcome::Selected(slot),
            Transition::Deselect(slot) => TapOutcome::Deselected(slot),
            Transition::Swap(a, b) => {
                if let Err(e) = board.registry.swap(a, b) {
                    // The selection machine only emits in-range slots
                    error!(error = %e, "Swap rejected");
                    debug_assert!(false, "Swap rejected: {}", e);
                    return TapOutcome::OutOfRange;
                }
                if self.solved.refresh(&board.registry) {
                    self.mark_solved();
                    TapOutcome::Completed(a, b)
                } else {
                    TapOutcome::Swapped(a, b)
                }
            }
        }
    }

    /// Feeds a tap at canvas coordinates.
    ///
    /// Coordinates outside the canvas never become a tap.
    pub fn tap_at(&mut self, x: f64, y: f64) -> TapOutcome {
        if self.phase != Phase::Ready {
            return TapOutcome::Discarded;
        }
        match self.board.as_ref().and_then(|board| board.display.slot_at(x, y)) {
            Some(slot) => self.tap(slot),
            None => TapOutcome::OutOfRange,
        }
    }

    // ─────────────────────────────────────────────────────────────
    //  Views
    // ─────────────────────────────────────────────────────────────

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Catalog index of the current (or loading) level.
    pub fn level_index(&self) -> usize {
        self.level_index
    }

    /// Current load generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Ticket of the load in flight, if any.
    pub fn pending(&self) -> Option<LoadTicket> {
        self.pending
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Level catalog.
    pub fn catalog(&self) -> &LevelCatalog {
        &self.catalog
    }

    /// Descriptor of the current (or loading) level.
    pub fn descriptor(&self) -> Option<&LevelDescriptor> {
        if self.phase.is_terminal() {
            return None;
        }
        self.catalog.get(self.level_index)
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection.selection()
    }

    /// Tile registry of the level on screen.
    pub fn registry(&self) -> Option<&TileRegistry> {
        self.board.as_ref().map(|board| &board.registry)
    }

    /// Raster of the level on screen.
    pub fn raster(&self) -> Option<&Raster> {
        self.board.as_ref().map(|board| &board.raster)
    }

    /// Display grid of the level on screen.
    pub fn display_grid(&self) -> Option<DisplayGrid> {
        self.board.as_ref().map(|board| board.display)
    }

    /// Whether the level on screen is solved.
    pub fn is_solved(&self) -> bool {
        self.board.as_ref().is_some_and(|board| {
            self.solved
                .get(&board.registry)
                .unwrap_or_else(|| is_solved(&board.registry))
        })
    }

    /// Tiles in their correct slot, and the tile count.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.registry()
            .map(|registry| (tiles_home(registry), registry.len()))
    }

    /// What to draw at every slot, in slot order.
    pub fn cells(&self) -> Vec<CellView> {
        let Some(board) = self.board.as_ref() else {
            return Vec::new();
        };
        let selected = self.selection.selection().slot();
        (0..board.registry.len())
            .filter_map(|slot| {
                board.registry.tile_at(slot).map(|tile| CellView {
                    slot,
                    source_rect: tile.source_rect(),
                    correct_slot: tile.correct_slot(),
                    selected: selected == Some(slot),
                })
            })
            .collect()
    }

    /// Takes all queued events.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────────
    //  Internals
    // ─────────────────────────────────────────────────────────────

    /// Partitions, builds and shuffles a fresh board, leaving the session `Ready`.
    fn install(&mut self, descriptor: LevelDescriptor, raster: Raster, shape: GridShape) {
        let requested = shape;
        let shape = shape.fit_to(self.config.canvas_width, self.config.canvas_height);
        if shape != requested {
            warn!(%requested, %shape, "Grid shrunk to fit the canvas");
        }
        let rects = partition(raster.width(), raster.height(), shape);
        let mut registry = TileRegistry::from_rects(rects);
        let draws = shuffle(&mut registry, &mut self.shuffler);

        self.selection = SelectionMachine::new(registry.len());
        self.solved.invalidate();
        self.completion_signalled = false;
        let display = DisplayGrid::new(self.config.canvas_width, self.config.canvas_height, shape);

        info!(
            level = self.level_index,
            %shape,
            tiles = registry.len(),
            draws,
            placeholder = raster.is_placeholder(),
            "Level ready"
        );
        self.board = Some(Board {
            descriptor,
            raster,
            display,
            registry,
        });
        self.phase = Phase::Ready;
    }

    /// Grids of one tile cannot be shuffled; they are solved on arrival.
    fn settle_if_trivially_solved(&mut self) {
        let solved = match self.board.as_ref() {
            Some(board) => self.solved.refresh(&board.registry),
            None => false,
        };
        if solved {
            debug!("Level solved on arrival");
            self.mark_solved();
        }
    }

    fn mark_solved(&mut self) {
        self.phase = Phase::Solved;
        self.selection.freeze();
        if !self.completion_signalled {
            self.completion_signalled = true;
            info!(level = self.level_index, "Level complete");
            self.events.push(SessionEvent::LevelComplete {
                level_index: self.level_index,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MAX_GRID_DIMENSION;

    fn catalog() -> LevelCatalog {
        LevelCatalog::new(vec![
            LevelDescriptor::new(1, 2, 2, "Easy", "One", "", "/assets/one.jpg"),
            LevelDescriptor::new(2, 3, 3, "Medium", "Two", "", "https://example.com/two.jpg"),
        ])
    }

    fn session() -> PuzzleSession {
        PuzzleSession::new(EngineConfig::default(), catalog(), FisherYates::from_seed(1))
    }

    fn ready(session: &mut PuzzleSession) -> LoadTicket {
        let request = session.start().unwrap().unwrap();
        let raster = Raster::acquired(600, 600, "image/jpeg", 1024);
        assert_eq!(session.complete_load(request.ticket, Ok(raster)), LoadOutcome::Ready);
        request.ticket
    }

    #[test]
    fn test_starts_loading_without_board() {
        let mut session = session();
        assert_eq!(session.phase(), Phase::Loading);
        let request = session.start().unwrap().unwrap();
        assert_eq!(request.ticket, LoadTicket::new(1, 0));
        assert_eq!(request.canvas, (600, 600));
        assert!(session.cells().is_empty());
        assert_eq!(session.tap(0), TapOutcome::Discarded);
    }

    #[test]
    fn test_complete_load_builds_shuffled_level() {
        let mut session = session();
        ready(&mut session);
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.cells().len(), 4);
        assert!(!session.is_solved());
        assert_eq!(session.display_grid().map(|g| g.tile_width()), Some(300));
    }

    #[test]
    fn test_remote_request_uses_relay_path() {
        let mut session = session();
        let request = session.load_level(1).unwrap().unwrap();
        assert!(request.image.is_remote());
        assert!(request.image.fetch_path().starts_with("/api/image-proxy?url="));
    }

    #[test]
    fn test_selected_cell_is_flagged() {
        let mut session = session();
        ready(&mut session);
        assert_eq!(session.tap(3), TapOutcome::Selected(3));
        let cells = session.cells();
        assert!(cells[3].selected);
        assert_eq!(cells.iter().filter(|c| c.selected).count(), 1);
    }

    #[test]
    fn test_advance_requires_solved() {
        let mut session = session();
        ready(&mut session);
        assert_eq!(session.advance(), Err(LifecycleError::NotSolved(Phase::Ready)));
    }

    #[test]
    fn test_reveal_solution_then_advance() {
        let mut session = session();
        ready(&mut session);
        session.reveal_solution().unwrap();
        assert_eq!(session.phase(), Phase::Solved);
        assert!(session.is_solved());
        assert_eq!(session.tap(0), TapOutcome::Discarded);

        let request = session.advance().unwrap().unwrap();
        assert_eq!(request.ticket.level_index, 1);
        assert!(session.registry().is_none());
    }

    #[test]
    fn test_advance_past_last_level_is_terminal() {
        let mut session = session();
        session.load_level(1).unwrap();
        let ticket = session.pending().unwrap();
        session.complete_load(ticket, Ok(Raster::acquired(600, 600, "image/png", 1)));
        session.reveal_solution().unwrap();

        assert_eq!(session.advance(), Ok(None));
        assert_eq!(session.phase(), Phase::AllLevelsComplete);
        assert!(session.descriptor().is_none());
        assert_eq!(session.load_level(0), Err(LifecycleError::Terminal));
        assert_eq!(session.advance(), Err(LifecycleError::Terminal));
        assert!(session.drain_events().contains(&SessionEvent::AllLevelsComplete));
    }

    #[test]
    fn test_reshuffle_keeps_raster_and_rearms() {
        let mut session = session();
        ready(&mut session);
        session.reveal_solution().unwrap();
        let raster = session.raster().cloned();

        session.reshuffle().unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert!(!session.is_solved());
        assert_eq!(session.raster().cloned(), raster);
        assert_eq!(session.selection(), Selection::NoSelection);
    }

    #[test]
    fn test_reshuffle_rejected_while_loading() {
        let mut session = session();
        session.start().unwrap();
        assert_eq!(
            session.reshuffle(),
            Err(LifecycleError::NotPlayable(Phase::Loading))
        );
    }

    #[test]
    fn test_regrid_rebuilds_registry() {
        let mut session = session();
        ready(&mut session);
        session.regrid(GridShape::new(4, 3)).unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.cells().len(), 12);
        assert_eq!(session.display_grid().map(|g| g.tile_height()), Some(200));
        assert!(!session.is_solved());
    }

    #[test]
    fn test_regrid_clamps_oversized_shape() {
        let mut session = session();
        ready(&mut session);
        session.regrid(GridShape::new(u32::MAX, u32::MAX)).unwrap();
        let side = MAX_GRID_DIMENSION as usize;
        assert_eq!(session.cells().len(), side * side);
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn test_oversized_level_descriptor_loads() {
        let catalog = LevelCatalog::new(vec![LevelDescriptor::new(
            1,
            u32::MAX,
            u32::MAX,
            "Hard",
            "Huge",
            "",
            "/assets/huge.jpg",
        )]);
        let mut session = PuzzleSession::new(EngineConfig::default(), catalog, FisherYates::from_seed(3));
        let request = session.start().unwrap().unwrap();
        let outcome = session.complete_load(request.ticket, Err(AcquisitionError::new("huge", "offline")));
        assert_eq!(outcome, LoadOutcome::ReadyWithPlaceholder);
        assert_eq!(
            session.display_grid().map(|g| g.shape()),
            Some(GridShape::new(MAX_GRID_DIMENSION, MAX_GRID_DIMENSION))
        );
    }

    #[test]
    fn test_grid_wider_than_canvas_stays_playable() {
        let mut session = PuzzleSession::new(EngineConfig::square(40), catalog(), FisherYates::from_seed(4));
        let request = session.start().unwrap().unwrap();
        session.complete_load(request.ticket, Ok(Raster::acquired(40, 40, "image/png", 8)));
        session.regrid(GridShape::new(60, 1)).unwrap();

        let grid = session.display_grid().unwrap();
        assert_eq!(grid.shape().columns(), 40);
        assert_eq!(grid.tile_width(), 1);
        assert_eq!(session.tap_at(39.5, 20.0), TapOutcome::Selected(39));
    }

    #[test]
    fn test_single_tile_level_is_solved_on_arrival() {
        let catalog = LevelCatalog::new(vec![LevelDescriptor::new(1, 1, 1, "", "Solo", "", "a.jpg")]);
        let mut session = PuzzleSession::new(EngineConfig::default(), catalog, FisherYates::from_seed(0));
        let request = session.start().unwrap().unwrap();
        session.complete_load(request.ticket, Ok(Raster::acquired(600, 600, "image/png", 1)));

        assert!(session.is_solved());
        assert_eq!(session.phase(), Phase::Solved);
        let completions = session
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::LevelComplete { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_load_level_number() {
        let mut session = session();
        let request = session.load_level_number(2).unwrap().unwrap();
        assert_eq!(request.ticket.level_index, 1);
        assert_eq!(
            session.load_level_number(9),
            Err(LifecycleError::UnknownLevel(9))
        );
    }

    #[test]
    fn test_tap_at_outside_canvas() {
        let mut session = session();
        ready(&mut session);
        assert_eq!(session.tap_at(-5.0, 10.0), TapOutcome::OutOfRange);
        assert_eq!(session.tap_at(450.0, 10.0), TapOutcome::Selected(1));
    }

    #[test]
    fn test_duplicate_completion_is_stale() {
        let mut session = session();
        let ticket = ready(&mut session);
        let again = session.complete_load(ticket, Err(AcquisitionError::new("x", "late")));
        assert_eq!(again, LoadOutcome::Stale);
        assert_eq!(session.phase(), Phase::Ready);
    }
}
