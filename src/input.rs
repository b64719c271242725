use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Cursor shown over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

impl CursorStyle {
    pub fn as_css(self) -> &'static str {
        match self {
            CursorStyle::Default => "default",
            CursorStyle::Pointer => "pointer",
        }
    }
}

/// Pointer snapshot shared between the event source and the frame loop.
#[derive(Debug, Default)]
pub struct PointerState {
    buttons: RwLock<HashSet<MouseButton>>,
    position: RwLock<Vec2>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, position: Vec2) {
        *self.position.write() = position;
    }

    pub fn position(&self) -> Vec2 {
        *self.position.read()
    }

    pub fn press(&self, button: MouseButton) {
        self.buttons.write().insert(button);
    }

    /// Releases `button`; a release of a pressed left button is a click.
    pub fn release(&self, button: MouseButton) -> bool {
        self.buttons.write().remove(&button) && button == MouseButton::LEFT
    }

    pub fn is_down(&self, button: MouseButton) -> bool {
        self.buttons.read().contains(&button)
    }
}

/// UI event replayed by the headless driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedEvent {
    Click(Vec2),
    Move(Vec2),
    TurnOn,
    TurnOff,
    Return,
    Next,
    Prev,
    Close,
}

impl FromStr for ScriptedEvent {
    type Err = anyhow::Error;

    fn from_str(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Some((kind, coords)) = text.split_once(':') {
            let position = parse_point(coords)
                .with_context(|| format!("bad coordinates in event `{text}`"))?;
            return match kind {
                "click" => Ok(Self::Click(position)),
                "move" => Ok(Self::Move(position)),
                other => bail!("unknown pointer event `{other}`"),
            };
        }
        match text {
            "turn-on" => Ok(Self::TurnOn),
            "turn-off" => Ok(Self::TurnOff),
            "return" => Ok(Self::Return),
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            "close" => Ok(Self::Close),
            other => Err(anyhow!(
                "unknown event `{other}`; expected click:X,Y, move:X,Y, turn-on, turn-off, return, next, prev or close"
            )),
        }
    }
}

impl fmt::Display for ScriptedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptedEvent::Click(p) => write!(f, "click:{},{}", p.x, p.y),
            ScriptedEvent::Move(p) => write!(f, "move:{},{}", p.x, p.y),
            ScriptedEvent::TurnOn => f.write_str("turn-on"),
            ScriptedEvent::TurnOff => f.write_str("turn-off"),
            ScriptedEvent::Return => f.write_str("return"),
            ScriptedEvent::Next => f.write_str("next"),
            ScriptedEvent::Prev => f.write_str("prev"),
            ScriptedEvent::Close => f.write_str("close"),
        }
    }
}

fn parse_point(text: &str) -> Result<Vec2> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| anyhow!("expected X,Y"))?;
    Ok(Vec2::new(x.trim().parse()?, y.trim().parse()?))
}
