//! Room/popup state machine driven by hit-test results.
//!
//! Every rule is a pure function from the current [`InteractionState`] to an
//! optional [`Transition`]; the caller commits transitions one at a time, in
//! [`ClickRule::PRIORITY`] order, so a later rule sees the state left by an
//! earlier one. A single click may therefore fire several rules (the window
//! arms the oven, and the oven can open in the same click if the ray crosses
//! both).

use std::fmt;

use serde::Serialize;

use crate::camera::CameraId;
use crate::config::RoomLayout;
use crate::hotspots::Trigger;
use crate::picking::HitSet;
use crate::popup::PopupKey;

/// Where the visitor currently is. Exactly one room is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Room {
    #[default]
    Exterior,
    Kitchen,
    Garage,
}

impl Room {
    pub fn camera(self) -> CameraId {
        match self {
            Room::Exterior => CameraId::Exterior,
            Room::Kitchen => CameraId::Kitchen,
            Room::Garage => CameraId::Garage,
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Exterior => f.write_str("exterior"),
            Room::Kitchen => f.write_str("kitchen"),
            Room::Garage => f.write_str("garage"),
        }
    }
}

/// Choice made on the intro menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    On,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InteractionState {
    pub room: Room,
    pub oven_armed: bool,
    pub menu_started: bool,
    pub power: Option<PowerMode>,
    /// Hot objects under the pointer after the last move.
    pub hovered: HitSet,
}

impl InteractionState {
    pub fn at_exterior(&self) -> bool {
        self.room == Room::Exterior
    }

    pub fn at_kitchen(&self) -> bool {
        self.room == Room::Kitchen
    }

    pub fn at_garage(&self) -> bool {
        self.room == Room::Garage
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    HidePrefixes(Vec<String>),
    Hide(String),
    Reveal(String),
    ShowAll,
    SwitchCamera(CameraId),
    OpenPopup(PopupKey),
    ClosePopup,
    DismissIntro,
}

/// State to commit together with the effects that realise it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: InteractionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    /// Camera this transition switches to, if any.
    pub fn camera(&self) -> Option<CameraId> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::SwitchCamera(id) => Some(*id),
            _ => None,
        })
    }
}

/// Click handlers in the order they are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickRule {
    EnterKitchen,
    OpenOven,
    EnterGarage,
    OpenWaterHeater,
    OpenHeatPump,
    OpenGrid,
    OpenSolar,
    OpenEv,
}

impl ClickRule {
    pub const PRIORITY: [ClickRule; 8] = [
        ClickRule::EnterKitchen,
        ClickRule::OpenOven,
        ClickRule::EnterGarage,
        ClickRule::OpenWaterHeater,
        ClickRule::OpenHeatPump,
        ClickRule::OpenGrid,
        ClickRule::OpenSolar,
        ClickRule::OpenEv,
    ];

    pub fn trigger(self) -> Trigger {
        match self {
            ClickRule::EnterKitchen => Trigger::Window,
            ClickRule::OpenOven => Trigger::Oven,
            ClickRule::EnterGarage => Trigger::GarageDoor,
            ClickRule::OpenWaterHeater => Trigger::WaterHeater,
            ClickRule::OpenHeatPump => Trigger::HeatPump,
            ClickRule::OpenGrid => Trigger::ElectricPole,
            ClickRule::OpenSolar => Trigger::SolarPanels,
            ClickRule::OpenEv => Trigger::CarParts,
        }
    }

    /// Whether the rule may fire, ignoring whether its trigger was hit.
    pub fn enabled(self, state: &InteractionState, popup_open: bool) -> bool {
        let can_open = !popup_open && state.menu_started;
        match self {
            ClickRule::EnterKitchen | ClickRule::EnterGarage => state.at_exterior(),
            ClickRule::OpenOven => can_open && state.oven_armed,
            ClickRule::OpenWaterHeater => can_open && state.at_garage(),
            ClickRule::OpenHeatPump | ClickRule::OpenGrid | ClickRule::OpenSolar => {
                can_open && state.at_exterior()
            }
            ClickRule::OpenEv => !popup_open && state.at_garage(),
        }
    }

    /// Transition fired by this rule for the given hits, if any.
    pub fn evaluate(
        self,
        state: &InteractionState,
        hits: &HitSet,
        popup_open: bool,
        layout: &RoomLayout,
    ) -> Option<Transition> {
        if !hits.contains(&self.trigger()) || !self.enabled(state, popup_open) {
            return None;
        }
        let mut next = state.clone();
        let effects = match self {
            ClickRule::EnterKitchen => {
                next.room = Room::Kitchen;
                next.oven_armed = true;
                vec![
                    Effect::HidePrefixes(layout.kitchen_hidden_prefixes.clone()),
                    Effect::SwitchCamera(CameraId::Kitchen),
                ]
            }
            ClickRule::EnterGarage => {
                next.room = Room::Garage;
                vec![
                    Effect::HidePrefixes(layout.garage_hidden_prefixes.clone()),
                    Effect::Reveal(layout.garage_revealed_object.clone()),
                    Effect::SwitchCamera(CameraId::Garage),
                ]
            }
            ClickRule::OpenOven => {
                next.oven_armed = false;
                vec![Effect::OpenPopup(PopupKey::Oven)]
            }
            ClickRule::OpenWaterHeater => vec![Effect::OpenPopup(PopupKey::WaterHeater)],
            ClickRule::OpenHeatPump => vec![Effect::OpenPopup(PopupKey::HeatPump)],
            ClickRule::OpenGrid => vec![Effect::OpenPopup(PopupKey::Grid)],
            ClickRule::OpenSolar => vec![Effect::OpenPopup(PopupKey::Solar)],
            ClickRule::OpenEv => vec![Effect::OpenPopup(PopupKey::Ev)],
        };
        Some(Transition {
            state: next,
            effects,
        })
    }

    /// Whether the transition opens a popup, which gates the rules after it.
    pub fn opens_popup(self) -> bool {
        !matches!(self, ClickRule::EnterKitchen | ClickRule::EnterGarage)
    }
}

/// The "return" action: back outside with everything visible.
pub fn return_to_exterior(state: &InteractionState) -> Transition {
    let mut next = state.clone();
    next.room = Room::Exterior;
    next.oven_armed = false;
    Transition {
        state: next,
        effects: vec![
            Effect::SwitchCamera(CameraId::Exterior),
            Effect::ShowAll,
            Effect::ClosePopup,
        ],
    }
}

/// The intro menu's "turn on" / "turn off" buttons.
///
/// Lands outside with every room shown again, so a room entered before the
/// menu was dismissed cannot leave the exterior hot objects hidden.
pub fn start_menu(
    state: &InteractionState,
    mode: PowerMode,
    hidden_object: &str,
) -> Transition {
    let mut next = state.clone();
    next.room = Room::Exterior;
    next.oven_armed = false;
    next.menu_started = true;
    next.power = Some(mode);
    Transition {
        state: next,
        effects: vec![
            Effect::DismissIntro,
            Effect::SwitchCamera(CameraId::Exterior),
            Effect::ClosePopup,
            Effect::ShowAll,
            Effect::Hide(hidden_object.to_string()),
        ],
    }
}

/// State after a popup is dismissed; the oven re-arms while in the kitchen.
pub fn popup_closed(state: &InteractionState) -> InteractionState {
    let mut next = state.clone();
    if next.at_kitchen() && !next.oven_armed {
        next.oven_armed = true;
    }
    next
}

/// Records the hot objects under the pointer. Nothing else changes.
pub fn hover(state: &InteractionState, hits: HitSet) -> InteractionState {
    InteractionState {
        hovered: hits,
        ..state.clone()
    }
}
