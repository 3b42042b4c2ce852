//! The tic-tac-toe demo driven through the headless document.

#[allow(dead_code)]
#[path = "../demos/tictactoe/game.rs"]
mod game;

use std::rc::Rc;

use rstest::rstest;
use spark_vdom::renderer::layout;
use spark_vdom::state::mouse;
use spark_vdom::{mount, ComponentRef, HeadlessDocument, MountHandle};

use game::{calculate_winner, jump_to, Game, GameState};

fn start() -> (Rc<HeadlessDocument>, ComponentRef, MountHandle) {
    let doc = HeadlessDocument::new();
    let game = ComponentRef::new(Game);
    let handle = mount(&game, &doc, doc.body()).unwrap();
    (doc, game, handle)
}

/// Click the n-th button in document order. Squares come first, then moves.
fn click(doc: &HeadlessDocument, n: usize) -> usize {
    let buttons = doc.find_all(doc.body(), "button").unwrap();
    doc.dispatch(buttons[n], "click").unwrap()
}

fn squares(doc: &HeadlessDocument) -> Vec<String> {
    let buttons = doc.find_all(doc.body(), "button").unwrap();
    buttons[..9]
        .iter()
        .map(|&b| doc.text_content(b).unwrap())
        .collect()
}

fn state(game: &ComponentRef) -> GameState {
    game.state_as().unwrap()
}

#[test]
fn test_initial_board() {
    let (doc, game, _handle) = start();

    assert_eq!(squares(&doc), vec![""; 9]);
    assert_eq!(doc.find_all(doc.body(), "button").unwrap().len(), 10);
    assert_eq!(doc.find_all(doc.body(), "div").unwrap().len(), 8);

    let text = doc.text_content(doc.body()).unwrap();
    assert!(text.contains("Next player: X"));
    assert!(text.contains("Go to game start"));
    assert_eq!(state(&game), GameState::default());
}

#[test]
fn test_square_markup() {
    let (doc, _game, _handle) = start();
    click(&doc, 4);

    let buttons = doc.find_all(doc.body(), "button").unwrap();
    assert_eq!(doc.to_html(buttons[4]).unwrap(), r#"<button class="square">X</button>"#);
    assert_eq!(doc.to_html(buttons[0]).unwrap(), r#"<button class="square"></button>"#);
    assert!(doc.has_listener(buttons[0], "click"));
}

#[test]
fn test_moves_alternate() {
    let (doc, game, _handle) = start();

    assert_eq!(click(&doc, 0), 1);
    click(&doc, 4);
    click(&doc, 8);

    let board = squares(&doc);
    assert_eq!((board[0].as_str(), board[4].as_str(), board[8].as_str()), ("X", "O", "X"));

    let state = state(&game);
    assert_eq!(state.history.len(), 4);
    assert_eq!(state.step_number, 3);
    assert!(!state.x_is_next);
    assert!(doc.text_content(doc.body()).unwrap().contains("Next player: O"));
    assert!(doc.text_content(doc.body()).unwrap().contains("Go to move #3"));
}

#[test]
fn test_occupied_square_is_ignored() {
    let (doc, game, _handle) = start();
    click(&doc, 0);

    let before = doc.mutation_count();
    click(&doc, 0);
    assert_eq!(doc.mutation_count(), before);
    assert_eq!(state(&game).history.len(), 2);
    assert_eq!(squares(&doc)[0], "X");
}

#[test]
fn test_winner_ends_game() {
    let (doc, game, _handle) = start();
    for square in [0, 3, 1, 4, 2] {
        click(&doc, square);
    }

    assert!(doc.text_content(doc.body()).unwrap().contains("Winner: X"));

    click(&doc, 8);
    assert_eq!(state(&game).history.len(), 6);
    assert_eq!(squares(&doc)[8], "");
}

#[test]
fn test_jump_back_and_branch() {
    let (doc, game, _handle) = start();
    for square in [0, 4, 8] {
        click(&doc, square);
    }

    // "Go to move #1"
    click(&doc, 10);
    let rewound = state(&game);
    assert_eq!(rewound.step_number, 1);
    assert!(!rewound.x_is_next);
    assert_eq!(rewound.history.len(), 4);

    let board = squares(&doc);
    assert_eq!(board[0], "X");
    assert!(board[1..].iter().all(String::is_empty));
    assert!(doc.text_content(doc.body()).unwrap().contains("Next player: O"));

    click(&doc, 2);
    let branched = state(&game);
    assert_eq!(branched.history.len(), 3);
    assert_eq!(branched.step_number, 2);
    assert_eq!(squares(&doc)[2], "O");
    assert_eq!(doc.find_all(doc.body(), "li").unwrap().len(), 3);
}

#[test]
fn test_jump_to_start_directly() {
    let (doc, game, _handle) = start();
    click(&doc, 0);
    click(&doc, 1);

    jump_to(&game, 0).unwrap();
    assert_eq!(squares(&doc), vec![""; 9]);
    assert!(state(&game).x_is_next);
}

#[test]
fn test_unmount_clears_body() {
    let (doc, _game, handle) = start();
    click(&doc, 0);

    handle.unmount().unwrap();
    assert_eq!(doc.inner_html(doc.body()).unwrap(), "");
    assert_eq!(doc.open_span_count(), 0);
}

#[test]
fn test_click_through_terminal_hit_grid() {
    let (doc, _game, _handle) = start();

    let frame = layout(&doc, doc.body(), 40, 20).unwrap();
    assert_eq!(frame.buffer.row_text(0), "[ ][ ][ ]");
    assert_eq!(frame.hit_regions.len(), 10);
    mouse::apply_hit_regions(40, 20, &frame.hit_regions);

    assert!(mouse::dispatch_click(&doc, 4, 1).unwrap());
    let frame = layout(&doc, doc.body(), 40, 20).unwrap();
    assert_eq!(frame.buffer.row_text(1), "[ ][X][ ]");

    // Status line, no listener there.
    mouse::apply_hit_regions(40, 20, &frame.hit_regions);
    assert!(!mouse::dispatch_click(&doc, 30, 19).unwrap());
}

#[rstest]
#[case::empty(&[None; 9], None)]
#[case::top_row(&[Some("X"), Some("X"), Some("X"), None, None, None, None, None, None], Some("X"))]
#[case::diagonal(&[Some("O"), None, Some("X"), None, Some("O"), Some("X"), None, None, Some("O")], Some("O"))]
#[case::column(&[None, Some("X"), None, None, Some("X"), None, Some("O"), Some("X"), None], Some("X"))]
#[case::mixed_line(&[Some("X"), Some("O"), Some("X"), None, None, None, None, None, None], None)]
fn test_calculate_winner(#[case] board: &[Option<&str>], #[case] expected: Option<&str>) {
    let squares: Vec<Option<String>> = board.iter().map(|s| s.map(String::from)).collect();
    assert_eq!(calculate_winner(&squares).as_deref(), expected);
}
