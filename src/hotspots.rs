use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::scene_index::{NamePattern, NodeId, SceneIndex};

/// Semantic name of a clickable object in the house.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    Window,
    Oven,
    GarageDoor,
    WaterHeater,
    HeatPump,
    ElectricPole,
    SolarPanels,
    CarParts,
}

impl Trigger {
    pub const ALL: [Trigger; 8] = [
        Trigger::Window,
        Trigger::Oven,
        Trigger::GarageDoor,
        Trigger::WaterHeater,
        Trigger::HeatPump,
        Trigger::ElectricPole,
        Trigger::SolarPanels,
        Trigger::CarParts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Window => "window",
            Trigger::Oven => "oven",
            Trigger::GarageDoor => "garageDoor",
            Trigger::WaterHeater => "waterHeater",
            Trigger::HeatPump => "heatPump",
            Trigger::ElectricPole => "electricPole",
            Trigger::SolarPanels => "solarPanels",
            Trigger::CarParts => "carParts",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static mapping from trigger to the scene object(s) it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotObjectSet {
    entries: Vec<HotObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotObject {
    pub trigger: Trigger,
    pub target: NamePattern,
}

impl Default for HotObjectSet {
    fn default() -> Self {
        Self::new(vec![
            (Trigger::Window, NamePattern::name("EXLV_mainWinStainedGlass")),
            (Trigger::Oven, NamePattern::name("K_Oven")),
            (Trigger::GarageDoor, NamePattern::name("EXG_bigDoor")),
            (Trigger::WaterHeater, NamePattern::name("G_waterHeater")),
            (Trigger::HeatPump, NamePattern::name("EX_heatPump")),
            (Trigger::ElectricPole, NamePattern::name("EX_electricPole")),
            (Trigger::SolarPanels, NamePattern::name("EX_solarPanels")),
            (Trigger::CarParts, NamePattern::prefix("G_car")),
        ])
    }
}

impl HotObjectSet {
    pub fn new(entries: Vec<(Trigger, NamePattern)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(trigger, target)| HotObject { trigger, target })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[HotObject] {
        &self.entries
    }

    pub fn target(&self, trigger: Trigger) -> Option<&NamePattern> {
        self.entries
            .iter()
            .find(|entry| entry.trigger == trigger)
            .map(|entry| &entry.target)
    }

    /// Resolves every entry against the loaded scene once, so hit tests
    /// do not walk the graph by name.
    pub fn resolve(&self, index: &SceneIndex) -> ResolvedHotObjects {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let roots = index.resolve(&entry.target);
                if roots.is_empty() {
                    warn!(
                        "hot object {} ({:?}) not found in scene",
                        entry.trigger, entry.target
                    );
                }
                (entry.trigger, roots)
            })
            .collect();
        ResolvedHotObjects { entries }
    }
}

/// Hot objects resolved to scene nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedHotObjects {
    entries: Vec<(Trigger, Vec<NodeId>)>,
}

impl ResolvedHotObjects {
    pub fn iter(&self) -> impl Iterator<Item = (Trigger, &[NodeId])> {
        self.entries
            .iter()
            .map(|(trigger, roots)| (*trigger, roots.as_slice()))
    }

    pub fn roots(&self, trigger: Trigger) -> &[NodeId] {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == trigger)
            .map(|(_, roots)| roots.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, roots)| roots.is_empty())
    }
}
