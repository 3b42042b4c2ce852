//! Tic-tac-toe with move history.
//!
//! Three components: `Square` draws one cell as a button, `Board` lays out
//! nine squares in rows and forwards clicks with the square index, and
//! `Game` owns the history and handles the moves.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use spark_vdom::{
    build, children, props, Callback, Component, ComponentRef, Context, ElementType, Node, Result,
};

/// Nine cells, each `"X"`, `"O"` or empty.
pub type Squares = Vec<Option<String>>;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// The mark that completes a line, if any.
pub fn calculate_winner(squares: &[Option<String>]) -> Option<String> {
    LINES.iter().find_map(|&[a, b, c]| {
        let mark = squares.get(a)?.as_ref()?;
        let same = |i: usize| squares.get(i).and_then(Option::as_ref) == Some(mark);
        (same(b) && same(c)).then(|| mark.clone())
    })
}

// =============================================================================
// Square
// =============================================================================

#[derive(Default)]
pub struct Square;

impl Component for Square {
    fn render(&self, cx: &Context) -> Result<Node> {
        let value: Option<String> = cx.prop_as::<Option<String>>("value")?.flatten();
        let mut attributes = props! { "className" => "square" };
        if let Some(on_click) = cx.callback("onClick") {
            attributes.insert("onClick".to_string(), on_click.into());
        }
        build("button", attributes, children![value])
    }

    fn name(&self) -> &'static str {
        "Square"
    }
}

// =============================================================================
// Board
// =============================================================================

#[derive(Default)]
pub struct Board;

impl Board {
    fn render_square(squares: &[Option<String>], on_click: Option<&Callback>, i: usize) -> Result<Node> {
        let mut attributes = props! { "value" => json!(squares.get(i).cloned().flatten()) };
        if let Some(on_click) = on_click.cloned() {
            let forward = Callback::new(move |_event| on_click.call(&json!(i)));
            attributes.insert("onClick".to_string(), forward.into());
        }
        build(ElementType::component::<Square>(), attributes, children![])
    }
}

impl Component for Board {
    fn render(&self, cx: &Context) -> Result<Node> {
        let squares: Squares = cx.prop_as("squares")?.unwrap_or_else(|| vec![None; 9]);
        let on_click = cx.callback("onClick");

        let rows = (0..3)
            .map(|row| {
                let cells = (0..3)
                    .map(|col| Self::render_square(&squares, on_click.as_ref(), row * 3 + col))
                    .collect::<Result<Vec<_>>>()?;
                build("div", props! { "className" => "board-row" }, children![cells])
            })
            .collect::<Result<Vec<_>>>()?;

        build("div", props! {}, children![rows])
    }

    fn name(&self) -> &'static str {
        "Board"
    }
}

// =============================================================================
// Game
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub squares: Squares,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub history: Vec<Step>,
    pub step_number: usize,
    pub x_is_next: bool,
}

impl GameState {
    /// The board at the selected step.
    pub fn current(&self) -> &[Option<String>] {
        self.history
            .get(self.step_number)
            .or_else(|| self.history.last())
            .map(|step| step.squares.as_slice())
            .unwrap_or_default()
    }

    pub fn status(&self) -> String {
        match calculate_winner(self.current()) {
            Some(winner) => format!("Winner: {winner}"),
            None => format!("Next player: {}", if self.x_is_next { "X" } else { "O" }),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            history: vec![Step { squares: vec![None; 9] }],
            step_number: 0,
            x_is_next: true,
        }
    }
}

#[derive(Default)]
pub struct Game;

/// Play square `i` for the player to move.
///
/// Ignored when the square is taken or the game is already won. Moves made
/// after jumping back discard the later history.
pub fn handle_click(game: &ComponentRef, i: usize) -> Result<()> {
    let state: GameState = game.state_as()?;
    let mut history = state.history;
    history.truncate(state.step_number + 1);

    let mut squares = history.last().map(|step| step.squares.clone()).unwrap_or_default();
    if calculate_winner(&squares).is_some() || squares.get(i).is_none_or(Option::is_some) {
        return Ok(());
    }
    squares[i] = Some(if state.x_is_next { "X" } else { "O" }.to_string());
    history.push(Step { squares });

    game.set_state(json!({
        "stepNumber": history.len() - 1,
        "history": history,
        "xIsNext": !state.x_is_next,
    }))
}

/// Show the board as it was after `step` moves.
pub fn jump_to(game: &ComponentRef, step: usize) -> Result<()> {
    game.set_state(json!({
        "stepNumber": step,
        "xIsNext": step % 2 == 0,
    }))
}

/// Board callback: the payload is the clicked square's index.
fn square_clicked(cx: &Context) -> Callback {
    let handle = cx.handle();
    Callback::new(move |payload: &Value| {
        let (Some(game), Some(index)) = (handle.upgrade(), payload.as_u64()) else {
            return Ok(());
        };
        handle_click(&game, index as usize)
    })
}

impl Component for Game {
    fn initial_state(&self) -> Option<Value> {
        serde_json::to_value(GameState::default()).ok()
    }

    fn render(&self, cx: &Context) -> Result<Node> {
        let state: GameState = cx.state_as()?;

        let moves = (0..state.history.len())
            .map(|step| {
                let desc = match step {
                    0 => "Go to game start".to_string(),
                    n => format!("Go to move #{n}"),
                };
                let handle = cx.handle();
                let on_click = Callback::new(move |_event| match handle.upgrade() {
                    Some(game) => jump_to(&game, step),
                    None => Ok(()),
                });
                let button = build("button", props! { "onClick" => on_click }, children![desc])?;
                build("li", props! { "key" => step }, children![button])
            })
            .collect::<Result<Vec<_>>>()?;

        let board = build(
            ElementType::component::<Board>(),
            props! {
                "squares" => serde_json::to_value(state.current())?,
                "onClick" => square_clicked(cx),
            },
            children![],
        )?;

        build(
            "div",
            props! { "className" => "game" },
            children![
                build("div", props! { "className" => "game-board" }, children![board])?,
                build(
                    "div",
                    props! { "className" => "game-info" },
                    children![
                        build("div", props! {}, children![state.status()])?,
                        build("ol", props! {}, children![moves])?,
                    ],
                )?,
            ],
        )
    }

    fn name(&self) -> &'static str {
        "Game"
    }
}
