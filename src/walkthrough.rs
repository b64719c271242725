//! The walkthrough controller.
//!
//! [`Walkthrough`] owns the scene index, the resolved cameras and hot
//! objects, the interaction state and the popup sequencer. UI events come in
//! through the action methods; every failure is logged and turned into an
//! outcome value instead of an error, so the shell never has to handle one.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use log::{debug, error, info, warn};

use crate::camera::{CameraId, CameraSet, CameraView};
use crate::config::{ViewportSize, WalkthroughConfig};
use crate::error::WalkthroughError;
use crate::hotspots::ResolvedHotObjects;
use crate::input::{CursorStyle, ScriptedEvent};
use crate::interaction::{self, ClickRule, Effect, InteractionState, PowerMode, Transition};
use crate::picking::{hit_test, HitSet, PointerQuery};
use crate::popup::{PopupCatalog, PopupKey, PopupSequencer, PopupView};
use crate::render::CameraParams;
use crate::render_order;
use crate::scene::Scene;
use crate::scene_index::SceneIndex;
use crate::visibility;

/// What a click did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickOutcome {
    pub hits: HitSet,
    pub fired: Vec<ClickRule>,
    /// Rules whose camera switch was refused.
    pub rejected: Vec<(ClickRule, WalkthroughError)>,
    /// Popup opened with content. The "no content" placeholder is not reported.
    pub popup: Option<PopupKey>,
}

/// Result of an explicit UI action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Applied,
    Ignored,
    Rejected(WalkthroughError),
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied)
    }
}

/// Outcome of one dispatched [`ScriptedEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Click(ClickOutcome),
    Hover(HitSet),
    Action(ActionOutcome),
    Popup(bool),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Click(click) => {
                write!(f, "hits [{}]", join(click.hits.iter()))?;
                let fired = click.fired.iter().map(|rule| format!("{rule:?}"));
                write!(f, " fired [{}]", join(fired))?;
                for (rule, err) in &click.rejected {
                    write!(f, " rejected {rule:?} ({err})")?;
                }
                Ok(())
            }
            Outcome::Hover(hits) => write!(f, "hover [{}]", join(hits.iter())),
            Outcome::Action(ActionOutcome::Applied) => f.write_str("applied"),
            Outcome::Action(ActionOutcome::Ignored) => f.write_str("ignored"),
            Outcome::Action(ActionOutcome::Rejected(err)) => write!(f, "rejected ({err})"),
            Outcome::Popup(changed) => f.write_str(if *changed { "applied" } else { "ignored" }),
        }
    }
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

pub struct Walkthrough {
    config: WalkthroughConfig,
    index: SceneIndex,
    scene_loaded: bool,
    hot: ResolvedHotObjects,
    cameras: CameraSet,
    state: InteractionState,
    active_camera: CameraId,
    popup: PopupSequencer,
    viewport: ViewportSize,
    intro_visible: bool,
    return_visible: bool,
    cursor: CursorStyle,
}

impl Walkthrough {
    pub fn new(config: WalkthroughConfig) -> Self {
        let viewport = config.viewport;
        Self {
            config,
            index: SceneIndex::empty(),
            scene_loaded: false,
            hot: ResolvedHotObjects::default(),
            cameras: CameraSet::unresolved(),
            state: InteractionState::default(),
            active_camera: CameraId::Exterior,
            popup: PopupSequencer::default(),
            viewport,
            intro_visible: true,
            return_visible: false,
            cursor: CursorStyle::Default,
        }
    }

    /// Installs the house model, or logs why it is unavailable.
    pub fn on_scene_loaded(&mut self, result: Result<Scene, WalkthroughError>) {
        let scene = match result {
            Ok(scene) => scene,
            Err(err) => {
                error!("{err}; the walkthrough stays empty");
                return;
            }
        };
        let mut index = SceneIndex::build(&scene);
        let cameras = CameraSet::resolve(&index, &self.config.cameras);
        let eye = cameras
            .get(CameraId::Exterior)
            .map(CameraView::position)
            .unwrap_or(Vec3::ZERO);
        render_order::apply(&mut index, &self.config.render_order, eye);
        self.hot = self.config.hot_objects.resolve(&index);
        info!(
            "scene ready: {} nodes, {} camera(s)",
            index.len(),
            cameras.len()
        );
        self.index = index;
        self.cameras = cameras;
        self.scene_loaded = true;
    }

    pub fn on_popup_text_loaded(&mut self, result: Result<PopupCatalog, WalkthroughError>) {
        match result {
            Ok(catalog) => {
                info!("popup text ready: {} entries", catalog.len());
                self.popup.set_catalog(Arc::new(catalog));
            }
            Err(err) => error!("{err}; popups will show no content"),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = ViewportSize { width, height };
    }

    /// Hot objects under `position` as seen through the active camera.
    pub fn hit_test(&self, position: Vec2) -> HitSet {
        let query = PointerQuery::new(position, self.viewport.width, self.viewport.height);
        hit_test(&self.index, &self.hot, &self.camera_view(), query).triggers()
    }

    /// Runs every click rule, in priority order, against the hits under
    /// `position`. Each rule sees the state left by the rules before it.
    pub fn pointer_click(&mut self, position: Vec2) -> ClickOutcome {
        let hits = self.hit_test(position);
        debug!("click at {position} hit [{}]", join(hits.iter()));
        let mut outcome = ClickOutcome {
            hits,
            ..ClickOutcome::default()
        };
        for rule in ClickRule::PRIORITY {
            let popup_open = self.popup_visible();
            let Some(transition) =
                rule.evaluate(&self.state, &outcome.hits, popup_open, &self.config.rooms)
            else {
                continue;
            };
            if let Err(err) = self.check_camera(&transition) {
                error!("{rule:?} aborted: {err}");
                outcome.rejected.push((rule, err));
                continue;
            }
            info!("{rule:?}");
            if let Some(key) = self.commit(transition) {
                outcome.popup = Some(key);
            }
            outcome.fired.push(rule);
        }
        outcome
    }

    /// Updates hover flags and the cursor. Nothing else changes.
    pub fn pointer_move(&mut self, position: Vec2) -> HitSet {
        let hits = self.hit_test(position);
        self.cursor = if hits.is_empty() {
            CursorStyle::Default
        } else {
            CursorStyle::Pointer
        };
        self.state = interaction::hover(&self.state, hits.clone());
        hits
    }

    pub fn return_to_exterior(&mut self) -> ActionOutcome {
        let transition = interaction::return_to_exterior(&self.state);
        if let Err(err) = self.check_camera(&transition) {
            error!("return aborted: {err}");
            return ActionOutcome::Rejected(err);
        }
        info!("returning to exterior");
        self.commit(transition);
        ActionOutcome::Applied
    }

    /// The intro menu's power buttons. Only the first press counts.
    pub fn start_menu(&mut self, mode: PowerMode) -> ActionOutcome {
        if self.state.menu_started {
            warn!("intro menu already dismissed");
            return ActionOutcome::Ignored;
        }
        let transition =
            interaction::start_menu(&self.state, mode, &self.config.menu.hidden_object);
        if let Err(err) = self.check_camera(&transition) {
            error!("menu start aborted: {err}");
            return ActionOutcome::Rejected(err);
        }
        info!("walkthrough started with power {mode:?}");
        self.commit(transition);
        ActionOutcome::Applied
    }

    pub fn popup_next(&mut self) -> bool {
        self.popup.next()
    }

    pub fn popup_prev(&mut self) -> bool {
        self.popup.prev()
    }

    pub fn popup_close(&mut self) -> bool {
        let was_shown = self.popup.close();
        if was_shown {
            self.state = interaction::popup_closed(&self.state);
        }
        was_shown
    }

    pub fn dispatch(&mut self, event: ScriptedEvent) -> Outcome {
        match event {
            ScriptedEvent::Click(position) => Outcome::Click(self.pointer_click(position)),
            ScriptedEvent::Move(position) => Outcome::Hover(self.pointer_move(position)),
            ScriptedEvent::TurnOn => Outcome::Action(self.start_menu(PowerMode::On)),
            ScriptedEvent::TurnOff => Outcome::Action(self.start_menu(PowerMode::Off)),
            ScriptedEvent::Return => Outcome::Action(self.return_to_exterior()),
            ScriptedEvent::Next => Outcome::Popup(self.popup_next()),
            ScriptedEvent::Prev => Outcome::Popup(self.popup_prev()),
            ScriptedEvent::Close => Outcome::Popup(self.popup_close()),
        }
    }

    fn check_camera(&self, transition: &Transition) -> Result<(), WalkthroughError> {
        match transition.camera() {
            Some(id) => self.cameras.get(id).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Applies a transition's effects and adopts its state. Returns the
    /// popup it opened, if any.
    fn commit(&mut self, transition: Transition) -> Option<PopupKey> {
        let mut opened = None;
        for effect in transition.effects {
            match effect {
                Effect::HidePrefixes(prefixes) => {
                    let changed = visibility::hide_prefixes(&mut self.index, &prefixes);
                    debug!("hid {changed} mesh(es) under [{}]", prefixes.join(", "));
                }
                Effect::Hide(name) => {
                    visibility::set_visibility(&mut self.index, &BTreeSet::from([name]), false);
                }
                Effect::Reveal(name) => {
                    visibility::set_visibility(&mut self.index, &BTreeSet::from([name]), true);
                }
                Effect::ShowAll => {
                    visibility::show_all(&mut self.index);
                }
                Effect::SwitchCamera(id) => self.active_camera = id,
                Effect::OpenPopup(key) => match self.popup.open_key(key) {
                    Ok(()) => opened = Some(key),
                    Err(err) => warn!("{err}"),
                },
                Effect::ClosePopup => {
                    self.popup.close();
                }
                Effect::DismissIntro => self.intro_visible = false,
            }
        }
        self.state = transition.state;
        self.return_visible = self.active_camera != CameraId::Exterior;
        opened
    }

    pub fn config(&self) -> &WalkthroughConfig {
        &self.config
    }

    pub fn scene_loaded(&self) -> bool {
        self.scene_loaded
    }

    pub fn index(&self) -> &SceneIndex {
        &self.index
    }

    pub fn cameras(&self) -> &CameraSet {
        &self.cameras
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn active_camera(&self) -> CameraId {
        self.active_camera
    }

    /// The active camera, or the free fallback camera before it resolves.
    pub fn camera_view(&self) -> CameraView {
        self.cameras
            .get(self.active_camera)
            .cloned()
            .unwrap_or_else(|_| CameraView::fallback())
    }

    pub fn camera_params(&self) -> CameraParams {
        let aspect =
            PointerQuery::new(Vec2::ZERO, self.viewport.width, self.viewport.height).aspect();
        self.camera_view().params(aspect)
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn popup(&self) -> &PopupSequencer {
        &self.popup
    }

    pub fn popup_view(&self) -> PopupView {
        self.popup.view()
    }

    /// Whether the popup panel is on screen, placeholder included.
    pub fn popup_visible(&self) -> bool {
        self.popup.view() != PopupView::Hidden
    }

    pub fn intro_visible(&self) -> bool {
        self.intro_visible
    }

    pub fn return_visible(&self) -> bool {
        self.return_visible
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn visible_mesh_count(&self) -> usize {
        self.index
            .iter()
            .filter(|(_, node)| node.is_mesh() && node.visible)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::hotspots::Trigger;
    use crate::interaction::Room;
    use crate::scene::{Aabb, NodeKind, SceneNode};

    fn mesh(name: &str, position: Vec3) -> SceneNode {
        SceneNode {
            name: name.to_string(),
            kind: NodeKind::Mesh,
            position,
            bounds: Some(Aabb::unit()),
            ..SceneNode::default()
        }
    }

    fn camera(name: &str) -> SceneNode {
        SceneNode {
            name: name.to_string(),
            kind: NodeKind::Camera,
            position: Vec3::new(0.0, 0.0, 10.0),
            fov: 60.0,
            ..SceneNode::default()
        }
    }

    /// Every hot object sits at the origin, so a centre click hits them all.
    fn stacked_scene(cameras: &[&str]) -> Scene {
        let mut nodes: Vec<SceneNode> = cameras.iter().map(|name| camera(name)).collect();
        nodes.push(mesh("EXLV_mainWinStainedGlass", Vec3::ZERO));
        nodes.push(mesh("EX_roof", Vec3::new(0.0, 5.0, 0.0)));
        nodes.push(mesh("G_floor", Vec3::new(0.0, -5.0, 0.0)));
        Scene { nodes }
    }

    fn walkthrough(scene: Scene) -> Walkthrough {
        let mut walkthrough = Walkthrough::new(WalkthroughConfig {
            viewport: ViewportSize {
                width: 100,
                height: 100,
            },
            ..WalkthroughConfig::default()
        });
        walkthrough.on_scene_loaded(Ok(scene));
        walkthrough
    }

    const CENTRE: Vec2 = Vec2::new(50.0, 50.0);

    #[test]
    fn nothing_loaded_means_no_hits() {
        let mut walkthrough = Walkthrough::new(WalkthroughConfig::default());
        let outcome = walkthrough.pointer_click(CENTRE);
        assert!(outcome.hits.is_empty());
        assert!(outcome.fired.is_empty());
        assert_eq!(walkthrough.state().room, Room::Exterior);
        assert_eq!(walkthrough.camera_view(), CameraView::fallback());
    }

    #[test]
    fn window_click_enters_kitchen() {
        let mut walkthrough =
            walkthrough(stacked_scene(&["EX_camera", "KLV_camera", "G_camera"]));
        let outcome = walkthrough.pointer_click(CENTRE);
        assert_eq!(outcome.fired, vec![ClickRule::EnterKitchen]);
        assert_eq!(walkthrough.active_camera(), CameraId::Kitchen);
        assert!(walkthrough.state().oven_armed);
        assert!(walkthrough.return_visible());
        let roof = walkthrough.index().find_by_name("EX_roof")[0];
        assert!(!walkthrough.index().node(roof).visible);
    }

    #[test]
    fn unresolved_camera_leaves_flags_untouched() {
        let mut walkthrough = walkthrough(stacked_scene(&["EX_camera"]));
        let before = walkthrough.state().clone();
        let visible = walkthrough.visible_mesh_count();
        let outcome = walkthrough.pointer_click(CENTRE);
        assert!(outcome.fired.is_empty());
        assert_eq!(
            outcome.rejected,
            vec![(
                ClickRule::EnterKitchen,
                WalkthroughError::InvalidCameraTarget(CameraId::Kitchen)
            )]
        );
        assert_eq!(walkthrough.state(), &before);
        assert_eq!(walkthrough.active_camera(), CameraId::Exterior);
        assert_eq!(walkthrough.visible_mesh_count(), visible);
        assert!(!walkthrough.return_visible());
    }

    #[test]
    fn return_without_exterior_camera_is_rejected() {
        let mut walkthrough = walkthrough(stacked_scene(&[]));
        assert_eq!(
            walkthrough.return_to_exterior(),
            ActionOutcome::Rejected(WalkthroughError::InvalidCameraTarget(CameraId::Exterior))
        );
        assert_eq!(
            walkthrough.start_menu(PowerMode::On),
            ActionOutcome::Rejected(WalkthroughError::InvalidCameraTarget(CameraId::Exterior))
        );
        assert!(!walkthrough.state().menu_started);
        assert!(walkthrough.intro_visible());
    }

    #[test]
    fn menu_start_dismisses_intro_once() {
        let mut walkthrough = walkthrough(Scene {
            nodes: vec![camera("EX_camera"), mesh("EX_menuSign", Vec3::ZERO)],
        });
        assert!(walkthrough.start_menu(PowerMode::On).is_applied());
        assert!(!walkthrough.intro_visible());
        assert_eq!(walkthrough.state().power, Some(PowerMode::On));
        let sign = walkthrough.index().find_by_name("EX_menuSign")[0];
        assert!(!walkthrough.index().node(sign).visible);
        assert_eq!(walkthrough.start_menu(PowerMode::Off), ActionOutcome::Ignored);
        assert_eq!(walkthrough.state().power, Some(PowerMode::On));
    }

    #[test]
    fn hover_sets_cursor_without_changing_rooms() {
        let mut walkthrough =
            walkthrough(stacked_scene(&["EX_camera", "KLV_camera", "G_camera"]));
        let hits = walkthrough.pointer_move(CENTRE);
        assert_eq!(hits, HitSet::from([Trigger::Window]));
        assert_eq!(walkthrough.cursor(), CursorStyle::Pointer);
        assert_eq!(walkthrough.state().room, Room::Exterior);
        assert!(walkthrough.state().hovered.contains(&Trigger::Window));

        walkthrough.pointer_move(Vec2::new(1.0, 1.0));
        assert_eq!(walkthrough.cursor(), CursorStyle::Default);
        assert!(walkthrough.state().hovered.is_empty());
    }

    #[test]
    fn failed_assets_degrade_to_no_ops() {
        let mut walkthrough = Walkthrough::new(WalkthroughConfig::default());
        walkthrough.on_scene_loaded(Err(WalkthroughError::AssetLoadFailure {
            asset: crate::error::AssetKind::Model,
            reason: "404".to_string(),
        }));
        assert!(!walkthrough.scene_loaded());
        assert_eq!(
            walkthrough.return_to_exterior(),
            ActionOutcome::Rejected(WalkthroughError::InvalidCameraTarget(CameraId::Exterior))
        );
        let params = walkthrough.camera_params();
        assert_ne!(params.view_proj, Mat4::IDENTITY);
    }

    #[test]
    fn outcome_display_is_readable() {
        let outcome = Outcome::Click(ClickOutcome {
            hits: HitSet::from([Trigger::Window, Trigger::Oven]),
            fired: vec![ClickRule::EnterKitchen],
            ..ClickOutcome::default()
        });
        assert_eq!(outcome.to_string(), "hits [window, oven] fired [EnterKitchen]");
        assert_eq!(Outcome::Popup(false).to_string(), "ignored");
    }
}
