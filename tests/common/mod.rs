#![allow(dead_code)]

//! A miniature house laid out so that, in a 100x100 viewport, each hot
//! object sits under a known pixel of the camera that sees it:
//!
//! * exterior camera: window (50,50), garage door (85,50), heat pump (15,50),
//!   electric pole (50,15), solar panels (50,85)
//! * kitchen camera: oven (50,50)
//! * garage camera: water heater (50,50), car (15,50)

use std::io::Write;

use tempfile::NamedTempFile;

pub const WIDTH: u32 = 100;
pub const HEIGHT: u32 = 100;

pub const SCENE_XML: &str = r#"<scene>
  <node><name>EX_camera</name><type>camera</type><position>0 0 10</position><fov>60</fov></node>
  <node><name>KLV_camera</name><type>camera</type><position>20 0 -90</position><fov>60</fov></node>
  <node><name>G_camera</name><type>camera</type><position>-20 0 -90</position><fov>60</fov></node>
  <node><name>sun</name><type>light</type><position>0 50 0</position><intensity>1</intensity></node>
  <node>
    <name>EX_house</name>
    <type>group</type>
    <children>
      <node><name>EXLV_mainWinStainedGlass</name><transparent>true</transparent><opacity>0.5</opacity></node>
      <node><name>EXG_bigDoor</name><position>4 0 0</position><color>120 90 60</color></node>
      <node><name>EX_heatPump</name><position>-4 0 0</position></node>
      <node><name>EX_electricPole</name><position>0 4 0</position></node>
      <node><name>EX_solarPanels</name><position>0 -4 0</position></node>
      <node><name>EX_menuSign</name><position>0 8 0</position></node>
      <node><name>EXG_stoneWall1</name><position>-20 -10 -100</position></node>
    </children>
  </node>
  <node><name>K_Oven</name><type>mesh</type><position>20 0 -100</position><bounds>-0.5 -0.5 -0.5 0.5 0.5 0.5</bounds></node>
  <node><name>K_counterTop</name><position>20 -3 -100</position></node>
  <node><name>LR_sofa</name><position>26 0 -100</position></node>
  <node><name>G_waterHeater</name><position>-20 0 -100</position></node>
  <node>
    <name>G_car</name>
    <type>group</type>
    <position>-24 0 -100</position>
    <children>
      <node><name>G_car_body</name></node>
      <node><name>G_car_wheel</name><position>0 -0.5 0.5</position></node>
    </children>
  </node>
</scene>
"#;

pub const NODE_COUNT: usize = 18;
pub const MESH_COUNT: usize = 13;

pub const POPUP_JSON: &str = r#"{
  "oven": {
    "title": "Induction Cooking",
    "sequence": [
      "Induction heats the pan directly.",
      "It is faster than gas.",
      "It keeps the kitchen air clean."
    ]
  },
  "water": ["A heat pump water heater moves heat instead of making it."],
  "airSourceHP": { "title": "Air Source Heat Pump", "sequence": ["Heats and cools the whole house."] },
  "grid": { "title": "The Grid", "sequence": [] },
  "sPanels": ["Solar panels cover the roof."],
  "ev": { "title": "Electric Vehicle", "sequence": ["Charge overnight.", "Drive on sunshine."] }
}"#;

pub fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    file.write_all(contents.as_bytes()).expect("write fixture");
    file
}
