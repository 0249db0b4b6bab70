use crate::engine::Chain;
use crate::{Cell, Direction, STEP};

/// Decide whether a requested turn may replace `current`.
///
/// Before the first growth any request is admitted, so the player can
/// choose the opening direction. After that a turn must cross the current
/// axis, and the head must not already sit one `STEP` away from its neck
/// in the requested direction (the chain has not yet moved off the last
/// turn, and turning now would double back into the neck).
pub fn admits(request: Direction, current: Direction, chain: &Chain, score: u32) -> bool {
    if score == 0 {
        return true;
    }
    if request.axis() == current.axis() {
        return false;
    }
    match chain.neck() {
        Some(neck) => cross_axis_displacement(chain.head(), neck, request) != STEP,
        None => true,
    }
}

/// Signed distance from `head` to `neck` measured along `toward`.
fn cross_axis_displacement(head: Cell, neck: Cell, toward: Direction) -> i32 {
    let (dx, dy) = toward.dx_dy();
    ((neck.x - head.x) * dx + (neck.y - head.y) * dy) / STEP
}

/// Single-slot mailbox holding the latest admitted velocity.
///
/// Writers overwrite; the tick takes whatever is there at its start, so a
/// tick always moves with exactly one velocity.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inbox {
    pending: Option<Direction>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, dir: Direction) {
        self.pending = Some(dir);
    }

    pub fn peek(&self) -> Option<Direction> {
        self.pending
    }

    pub fn take(&mut self) -> Option<Direction> {
        self.pending.take()
    }
}
