use std::fmt;

/// Stage of a tick, in execution order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Update,
    GlobalUpdate,
    Draw,
    GlobalDraw,
    Overlay,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Update => "update",
            Phase::GlobalUpdate => "global update",
            Phase::Draw => "draw",
            Phase::GlobalDraw => "global draw",
            Phase::Overlay => "overlay",
        })
    }
}
