//! Text rendering of a puzzle session.
//!
//! Each cell shows the 1-based home slot of the tile it holds, so a solved
//! board reads `1 2 3 / 4 5 6 / ...`. The selected cell is bracketed and
//! tiles already home are marked with `*`.

use tileswap_engine::{Phase, PuzzleSession, SessionEvent, Shuffler, PLACEHOLDER_MESSAGE};

/// Renders the header, the grid and the status line.
pub fn render_board<S: Shuffler>(session: &PuzzleSession<S>) -> String {
    let mut out = String::new();

    if let Some(level) = session.descriptor() {
        out.push_str(&format!(
            "Level {}: {} ({})\n",
            level.level_number(),
            level.name(),
            level.difficulty()
        ));
        if !level.description().is_empty() {
            out.push_str(&format!("{}\n", level.description()));
        }
    }

    match session.phase() {
        Phase::Loading => {
            out.push_str("Loading...\n");
            return out;
        }
        Phase::AllLevelsComplete => {
            out.push_str("All levels complete!\n");
            return out;
        }
        Phase::Ready | Phase::Solved => {}
    }

    if session.raster().is_some_and(|r| r.is_placeholder()) {
        out.push_str(&format!("[{}]\n", PLACEHOLDER_MESSAGE));
    }

    if let Some(grid) = session.display_grid() {
        let columns = grid.shape().columns() as usize;
        let cells = session.cells();
        let width = cells.len().to_string().len();
        for row in cells.chunks(columns.max(1)) {
            let line: Vec<String> = row
                .iter()
                .map(|cell| {
                    let label = format!("{:>width$}", cell.correct_slot + 1, width = width);
                    let home = if cell.is_home() { '*' } else { ' ' };
                    if cell.selected {
                        format!("[{}]{}", label, home)
                    } else {
                        format!(" {} {}", label, home)
                    }
                })
                .collect();
            out.push_str(line.join("").trim_end());
            out.push('\n');
        }
    }

    if let Some((home, total)) = session.progress() {
        out.push_str(&format!("{}/{} tiles home", home, total));
    }
    if session.phase() == Phase::Solved {
        out.push_str(" - solved! Type 'next' to continue");
    }
    out.push('\n');
    out
}

/// One line per event worth telling the player about.
pub fn render_events(events: &[SessionEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::AcquisitionFailed { message, .. } => {
                Some(format!("Image failed to load: {}", message))
            }
            SessionEvent::LevelComplete { level_index } => {
                Some(format!("Level {} complete!", level_index + 1))
            }
            SessionEvent::AllLevelsComplete => Some("Congratulations, every level is done!".to_string()),
            SessionEvent::LevelLoading { .. } | SessionEvent::LevelReady { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileswap_engine::{EngineConfig, FisherYates, LevelCatalog, LevelDescriptor, Raster};

    fn ready_session() -> PuzzleSession {
        let catalog = LevelCatalog::new(vec![LevelDescriptor::new(
            7,
            2,
            2,
            "Easy",
            "Pier",
            "Low tide",
            "/assets/pier.jpg",
        )]);
        let mut session = PuzzleSession::new(EngineConfig::default(), catalog, FisherYates::from_seed(2));
        let request = session.start().unwrap().unwrap();
        session.complete_load(request.ticket, Ok(Raster::acquired(600, 600, "image/jpeg", 10)));
        session
    }

    #[test]
    fn test_loading_board() {
        let catalog = LevelCatalog::fallback();
        let mut session = PuzzleSession::new(EngineConfig::default(), catalog, FisherYates::from_seed(2));
        session.start().unwrap();
        let text = render_board(&session);
        assert!(text.starts_with("Level 1: Fallback (Easy)"));
        assert!(text.ends_with("Loading...\n"));
    }

    #[test]
    fn test_solved_board_reads_in_order() {
        let mut session = ready_session();
        session.reveal_solution().unwrap();
        let text = render_board(&session);
        assert!(text.contains(" 1 * 2 *\n 3 * 4 *\n"));
        assert!(text.contains("4/4 tiles home - solved!"));
    }

    #[test]
    fn test_selected_cell_is_bracketed() {
        let mut session = ready_session();
        session.tap(0);
        let text = render_board(&session);
        let first_row = text.lines().nth(2).unwrap();
        assert!(first_row.starts_with('['), "{}", text);
    }

    #[test]
    fn test_event_lines() {
        let lines = render_events(&[
            SessionEvent::LevelReady {
                level_index: 0,
                placeholder: false,
            },
            SessionEvent::LevelComplete { level_index: 0 },
        ]);
        assert_eq!(lines, vec!["Level 1 complete!".to_string()]);
    }
}
