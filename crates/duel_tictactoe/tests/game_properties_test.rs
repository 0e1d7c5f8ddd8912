//! Property tests for the game state machine.

use duel_tictactoe::rules::{LINES, is_full};
use duel_tictactoe::{Cell, Coord, Game, Move, MoveError, Outcome, Phase, Symbol};

fn coord(row: i64, col: i64) -> Coord {
    Coord::try_new(row, col).expect("in range")
}

fn started() -> Game {
    let mut game = Game::new();
    game.start();
    game
}

/// Cells of the grid not on the given line.
fn filler_for(line_index: usize) -> Vec<Coord> {
    let line = LINES[line_index];
    Coord::all()
        .filter(|c| !line.cells().contains(c))
        .collect()
}

#[test]
fn test_every_line_is_detected_when_completed() {
    for (index, line) in LINES.iter().enumerate() {
        let mut game = started();
        let mut spare = filler_for(index).into_iter();
        let mut last = None;
        for (i, target) in line.cells().iter().enumerate() {
            let report = game.apply_move(Move::new(Symbol::A, *target));
            last = Some(report.expect("A move"));
            if i < 2 {
                // Two B moves off the line can never complete a line of their own.
                let c = spare.next().expect("spare cell");
                let report = game.apply_move(Move::new(Symbol::B, c)).expect("B move");
                assert_eq!(report.outcome, Outcome::InProgress);
            }
        }
        let report = last.expect("three moves");
        match report.outcome {
            Outcome::Won { winner, line: won } => {
                assert_eq!(winner, Symbol::A);
                assert_eq!(won, *line, "line {index}");
            }
            other => panic!("line {index}: expected win, got {other:?}"),
        }
    }
}

#[test]
fn test_turn_strictly_alternates_and_only_current_symbol_moves() {
    let mut game = started();
    let mut expected = Symbol::A;
    for c in [coord(1, 1), coord(0, 0), coord(2, 2), coord(0, 2)] {
        assert_eq!(game.turn(), expected);
        assert_eq!(
            game.apply_move(Move::new(expected.opponent(), c)),
            Err(MoveError::WrongTurn(expected.opponent()))
        );
        game.apply_move(Move::new(expected, c)).expect("legal");
        expected = expected.opponent();
    }
}

#[test]
fn test_no_cell_changes_twice() {
    let mut game = started();
    let attempts = [
        (Symbol::A, 0, 0),
        (Symbol::B, 0, 0),
        (Symbol::B, 1, 1),
        (Symbol::A, 1, 1),
        (Symbol::A, 0, 0),
        (Symbol::A, 2, 0),
    ];
    let mut first_mark: Vec<Option<Cell>> = vec![None; 9];
    for (s, r, c) in attempts {
        let _ = game.apply_move(Move::new(s, coord(r, c)));
        for (i, cell) in game.board().cells().iter().enumerate() {
            if *cell != Cell::Empty {
                let seen = first_mark[i].get_or_insert(*cell);
                assert_eq!(seen, cell, "cell {i} changed");
            }
        }
    }
}

#[test]
fn test_draw_iff_full_without_line() {
    // Ends as A B A / A B B / B A A with no line along the way.
    let order = [
        (Symbol::A, 0, 0),
        (Symbol::B, 1, 1),
        (Symbol::A, 0, 2),
        (Symbol::B, 0, 1),
        (Symbol::A, 2, 1),
        (Symbol::B, 1, 2),
        (Symbol::A, 1, 0),
        (Symbol::B, 2, 0),
    ];
    let mut game = started();
    for (s, r, c) in order {
        let report = game.apply_move(Move::new(s, coord(r, c))).expect("legal");
        assert_eq!(report.outcome, Outcome::InProgress);
        assert!(!is_full(game.board()));
    }
    let report = game
        .apply_move(Move::new(Symbol::A, coord(2, 2)))
        .expect("legal");
    assert!(is_full(game.board()));
    assert_eq!(report.outcome, Outcome::Draw);
    assert_eq!(game.phase(), Phase::Drawn);
}
