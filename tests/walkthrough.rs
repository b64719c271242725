use glam::Vec2;
use once_cell::sync::Lazy;

use house_walkthrough::{
    ActionOutcome, CameraId, ClickRule, CursorStyle, PopupCatalog, PopupKey, PopupView, PowerMode,
    Room, Scene, Trigger, Walkthrough, WalkthroughConfig, WalkthroughError,
};

mod common;

static SCENE: Lazy<Scene> =
    Lazy::new(|| Scene::from_xml(common::SCENE_XML).expect("fixture scene"));
static CATALOG: Lazy<PopupCatalog> =
    Lazy::new(|| PopupCatalog::from_json_str(common::POPUP_JSON).expect("fixture popups"));

const CENTER: Vec2 = Vec2::new(50.0, 50.0);
const RIGHT: Vec2 = Vec2::new(85.0, 50.0);
const LEFT: Vec2 = Vec2::new(15.0, 50.0);
const TOP: Vec2 = Vec2::new(50.0, 15.0);
const BOTTOM: Vec2 = Vec2::new(50.0, 85.0);

fn loaded() -> Walkthrough {
    let mut config = WalkthroughConfig::default();
    config.viewport.width = common::WIDTH;
    config.viewport.height = common::HEIGHT;
    let mut walkthrough = Walkthrough::new(config);
    walkthrough.on_scene_loaded(Ok(SCENE.clone()));
    walkthrough.on_popup_text_loaded(Ok(CATALOG.clone()));
    walkthrough
}

fn started(mode: PowerMode) -> Walkthrough {
    let mut walkthrough = loaded();
    assert_eq!(walkthrough.start_menu(mode), ActionOutcome::Applied);
    walkthrough
}

fn page(walkthrough: &Walkthrough) -> (String, usize, usize) {
    match walkthrough.popup_view() {
        PopupView::Page {
            title, page, total, ..
        } => (title, page, total),
        other => panic!("expected a popup page, got {other:?}"),
    }
}

#[test]
fn fixture_resolves_cameras_and_hot_objects() {
    let walkthrough = loaded();
    assert_eq!(walkthrough.index().len(), common::NODE_COUNT);
    assert_eq!(walkthrough.cameras().len(), 3);
    assert_eq!(walkthrough.visible_mesh_count(), common::MESH_COUNT);
    let center: Vec<_> = walkthrough.hit_test(CENTER).into_iter().collect();
    assert_eq!(center, vec![Trigger::Window]);
    assert!(walkthrough.hit_test(RIGHT).contains(&Trigger::GarageDoor));
    assert!(walkthrough.hit_test(LEFT).contains(&Trigger::HeatPump));
    assert!(walkthrough.hit_test(TOP).contains(&Trigger::ElectricPole));
    assert!(walkthrough.hit_test(BOTTOM).contains(&Trigger::SolarPanels));
}

#[test]
fn window_click_enters_kitchen_and_hides_other_rooms() {
    let mut walkthrough = started(PowerMode::On);
    let outcome = walkthrough.pointer_click(CENTER);
    assert_eq!(outcome.fired, vec![ClickRule::EnterKitchen]);
    assert_eq!(walkthrough.state().room, Room::Kitchen);
    assert_eq!(walkthrough.active_camera(), CameraId::Kitchen);
    assert!(walkthrough.state().oven_armed);
    assert!(walkthrough.return_visible());

    let index = walkthrough.index();
    for (_, node) in index.iter().filter(|(_, node)| node.is_mesh()) {
        let hidden = node.name.starts_with('G') || node.name.starts_with("EX");
        assert_eq!(node.visible, !hidden, "{}", node.name);
    }
}

#[test]
fn window_click_enters_kitchen_even_before_the_menu() {
    let mut walkthrough = loaded();
    let outcome = walkthrough.pointer_click(CENTER);
    assert_eq!(outcome.fired, vec![ClickRule::EnterKitchen]);
    assert_eq!(walkthrough.state().room, Room::Kitchen);
    // The oven stays closed until the menu has been dismissed.
    let outcome = walkthrough.pointer_click(CENTER);
    assert!(outcome.hits.contains(&Trigger::Oven));
    assert!(outcome.fired.is_empty());
    assert_eq!(walkthrough.popup_view(), PopupView::Hidden);
}

#[test]
fn menu_start_after_entering_kitchen_restores_the_exterior() {
    let mut walkthrough = loaded();
    walkthrough.pointer_click(CENTER);
    assert_eq!(walkthrough.state().room, Room::Kitchen);

    assert_eq!(walkthrough.start_menu(PowerMode::On), ActionOutcome::Applied);
    assert_eq!(walkthrough.state().room, Room::Exterior);
    assert_eq!(walkthrough.active_camera(), CameraId::Exterior);
    assert_eq!(walkthrough.visible_mesh_count(), common::MESH_COUNT - 1);
    assert!(walkthrough.hit_test(CENTER).contains(&Trigger::Window));
    assert!(walkthrough.hit_test(RIGHT).contains(&Trigger::GarageDoor));
    assert!(walkthrough.hit_test(LEFT).contains(&Trigger::HeatPump));

    let outcome = walkthrough.pointer_click(LEFT);
    assert_eq!(outcome.fired, vec![ClickRule::OpenHeatPump]);
}

#[test]
fn oven_popup_pages_forward_and_back() {
    let mut walkthrough = started(PowerMode::On);
    walkthrough.pointer_click(CENTER);
    let outcome = walkthrough.pointer_click(CENTER);
    assert_eq!(outcome.fired, vec![ClickRule::OpenOven]);
    assert_eq!(outcome.popup, Some(PopupKey::Oven));
    assert!(!walkthrough.state().oven_armed);
    assert_eq!(page(&walkthrough), ("Induction Cooking".to_string(), 0, 3));
    assert!(!walkthrough.popup_view().nav().prev);

    assert!(walkthrough.popup_next());
    assert!(walkthrough.popup_next());
    assert!(!walkthrough.popup_next());
    assert_eq!(page(&walkthrough).1, 2);
    assert!(!walkthrough.popup_view().nav().next);

    assert!(walkthrough.popup_prev());
    assert_eq!(page(&walkthrough).1, 1);
}

#[test]
fn closing_the_oven_popup_rearms_it_with_fresh_content() {
    let mut walkthrough = started(PowerMode::On);
    walkthrough.pointer_click(CENTER);
    walkthrough.pointer_click(CENTER);
    walkthrough.popup_next();
    assert!(walkthrough.popup_close());
    assert!(walkthrough.state().oven_armed);
    assert!(!walkthrough.popup_visible());

    let outcome = walkthrough.pointer_click(CENTER);
    assert_eq!(outcome.fired, vec![ClickRule::OpenOven]);
    assert_eq!(page(&walkthrough), ("Induction Cooking".to_string(), 0, 3));
}

#[test]
fn clicks_are_ignored_by_popup_rules_while_a_popup_is_shown() {
    let mut walkthrough = started(PowerMode::Off);
    let outcome = walkthrough.pointer_click(LEFT);
    assert_eq!(outcome.fired, vec![ClickRule::OpenHeatPump]);
    assert_eq!(page(&walkthrough).0, "Air Source Heat Pump");

    let outcome = walkthrough.pointer_click(BOTTOM);
    assert!(outcome.hits.contains(&Trigger::SolarPanels));
    assert!(outcome.fired.is_empty());
    assert_eq!(page(&walkthrough).0, "Air Source Heat Pump");

    walkthrough.popup_close();
    let outcome = walkthrough.pointer_click(BOTTOM);
    assert_eq!(outcome.fired, vec![ClickRule::OpenSolar]);
    assert_eq!(page(&walkthrough).0, "Popup");
}

#[test]
fn garage_visit_shows_ev_popup_and_return_restores_everything() {
    let mut walkthrough = started(PowerMode::On);
    let outcome = walkthrough.pointer_click(RIGHT);
    assert_eq!(outcome.fired, vec![ClickRule::EnterGarage]);
    assert_eq!(walkthrough.active_camera(), CameraId::Garage);
    let index = walkthrough.index();
    let walls = index.find_by_name("EXG_stoneWall1");
    assert_eq!(walls.len(), 1);
    assert!(index.node(walls[0]).visible);
    assert_eq!(walkthrough.visible_mesh_count(), 4);

    let outcome = walkthrough.pointer_click(LEFT);
    assert_eq!(outcome.fired, vec![ClickRule::OpenEv]);
    assert_eq!(page(&walkthrough), ("Electric Vehicle".to_string(), 0, 2));

    assert_eq!(walkthrough.return_to_exterior(), ActionOutcome::Applied);
    assert_eq!(walkthrough.state().room, Room::Exterior);
    assert_eq!(walkthrough.active_camera(), CameraId::Exterior);
    assert!(!walkthrough.return_visible());
    assert!(!walkthrough.popup_visible());
    assert_eq!(walkthrough.visible_mesh_count(), common::MESH_COUNT);
}

#[test]
fn water_heater_popup_opens_in_the_garage() {
    let mut walkthrough = started(PowerMode::On);
    walkthrough.pointer_click(RIGHT);
    let outcome = walkthrough.pointer_click(CENTER);
    assert_eq!(outcome.fired, vec![ClickRule::OpenWaterHeater]);
    assert_eq!(outcome.popup, Some(PopupKey::WaterHeater));
    assert_eq!(page(&walkthrough).2, 1);
}

#[test]
fn empty_popup_shows_placeholder_and_blocks_other_popups() {
    let mut walkthrough = started(PowerMode::On);
    let outcome = walkthrough.pointer_click(TOP);
    assert_eq!(outcome.fired, vec![ClickRule::OpenGrid]);
    assert_eq!(outcome.popup, None);
    assert_eq!(
        walkthrough.popup_view(),
        PopupView::NoContent {
            title: "The Grid".to_string()
        }
    );
    assert!(walkthrough.popup_visible());
    assert!(!walkthrough.popup_next());
    assert!(walkthrough.pointer_click(LEFT).fired.is_empty());
    assert!(walkthrough.popup_close());
    assert_eq!(walkthrough.popup_view(), PopupView::Hidden);
}

#[test]
fn menu_start_hides_sign_and_only_counts_once() {
    let mut walkthrough = loaded();
    assert!(walkthrough.intro_visible());
    assert_eq!(walkthrough.start_menu(PowerMode::Off), ActionOutcome::Applied);
    assert!(!walkthrough.intro_visible());
    assert_eq!(walkthrough.state().power, Some(PowerMode::Off));
    assert_eq!(walkthrough.visible_mesh_count(), common::MESH_COUNT - 1);

    assert_eq!(walkthrough.start_menu(PowerMode::On), ActionOutcome::Ignored);
    assert_eq!(walkthrough.state().power, Some(PowerMode::Off));
}

#[test]
fn hover_changes_cursor_but_nothing_else() {
    let mut walkthrough = started(PowerMode::On);
    let before = walkthrough.visible_mesh_count();
    let hits = walkthrough.pointer_move(RIGHT);
    assert!(hits.contains(&Trigger::GarageDoor));
    assert_eq!(walkthrough.cursor(), CursorStyle::Pointer);
    assert_eq!(walkthrough.state().room, Room::Exterior);
    assert_eq!(walkthrough.visible_mesh_count(), before);

    assert!(walkthrough.pointer_move(Vec2::new(99.0, 99.0)).is_empty());
    assert_eq!(walkthrough.cursor(), CursorStyle::Default);
}

#[test]
fn missing_kitchen_camera_rejects_the_transition() {
    let mut config = WalkthroughConfig::default();
    config.viewport.width = common::WIDTH;
    config.viewport.height = common::HEIGHT;
    config.cameras.kitchen = "NO_such_camera".to_string();
    let mut walkthrough = Walkthrough::new(config);
    walkthrough.on_scene_loaded(Ok(SCENE.clone()));
    walkthrough.start_menu(PowerMode::On);

    let outcome = walkthrough.pointer_click(CENTER);
    assert!(outcome.fired.is_empty());
    assert_eq!(
        outcome.rejected,
        vec![(
            ClickRule::EnterKitchen,
            WalkthroughError::InvalidCameraTarget(CameraId::Kitchen)
        )]
    );
    assert_eq!(walkthrough.state().room, Room::Exterior);
    assert!(!walkthrough.state().oven_armed);
    assert_eq!(walkthrough.visible_mesh_count(), common::MESH_COUNT - 1);
}
