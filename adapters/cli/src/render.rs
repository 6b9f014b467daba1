//! Text rendering of a session with torch fog.

use std::collections::BTreeSet;

use torchlight_core::{CellCoord, CellState};
use torchlight_world::{query, Session};

const FOG: char = ' ';
const WALL: char = '#';
const PATH: char = '.';
const START: char = 'S';
const EXIT: char = 'E';
const PLAYER: char = '@';
const ENEMY: char = 'M';

/// Renders the maze row by row. Cells outside the torch are fogged unless
/// `reveal` is set; enemies are drawn only where the player can see them.
pub(crate) fn render(session: &Session, reveal: bool) -> String {
    let grid = query::grid(session);
    let visible = query::visible_tiles(session);
    let player = query::player_cell(session);
    let enemies: BTreeSet<CellCoord> = query::enemies(session)
        .into_iter()
        .map(|enemy| enemy.cell)
        .collect();

    let mut out = String::new();
    for row in 0..grid.height() {
        for column in 0..grid.width() {
            let cell = CellCoord::new(column, row);
            let lit = reveal || visible.contains(cell);
            let glyph = if !lit {
                FOG
            } else if cell == player {
                PLAYER
            } else if enemies.contains(&cell) {
                ENEMY
            } else if cell == grid.start() {
                START
            } else if cell == grid.exit() {
                EXIT
            } else {
                match grid.cell_state(cell) {
                    CellState::Path => PATH,
                    CellState::Wall | CellState::OutOfBounds => WALL,
                }
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use torchlight_core::{Difficulty, DifficultySettings, GameConfig};

    use super::*;

    fn quiet_session() -> Session {
        Session::new(GameConfig {
            seed: 42,
            enemies: Some(DifficultySettings {
                enemy_count: 0,
                ..DifficultySettings::preset(Difficulty::Easy)
            }),
            ..GameConfig::default()
        })
        .expect("session starts")
    }

    #[test]
    fn revealed_render_matches_grid_with_player() {
        let session = quiet_session();
        let grid = query::grid(&session).to_string();
        let expected = grid.replacen('S', "@", 1);

        assert_eq!(render(&session, true), expected);
    }

    #[test]
    fn fog_hides_cells_beyond_torch() {
        let session = quiet_session();
        let rendered = render(&session, false);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 15);
        assert_eq!(&lines[0][..3], "###");
        assert!(lines[0][3..].chars().all(|glyph| glyph == FOG));
        assert_eq!(&lines[1][..4], "#@..");
        assert!(lines[1][4..].chars().all(|glyph| glyph == FOG));
        assert!(lines[14].chars().all(|glyph| glyph == FOG));
    }
}
