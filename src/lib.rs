//! rackview
//!
//! An interactive 3D machine room visualization. A glTF scene of server
//! cabinets is rendered with unlit materials, the camera orbits the room
//! under mouse control, and cabinets light up with a highlight texture when
//! the cursor passes over them, firing observer callbacks a host application
//! can use to drive tooltips or detail panels.
//!
//! High-level modules
//! - `camera`: orbit camera, mouse controller and the view-projection uniform
//! - `context`: window-bound GPU context owning device, queue and pipeline
//! - `data_structures`: meshes, per-object transforms, textures and materials
//! - `picking`: cursor-to-ray unprojection and bounding-box intersection
//! - `pipelines`: the unlit render pipeline and its bind group layouts
//! - `resources`: glTF loading and the shared texture cache
//! - `room`: the application itself, event loop and pick dispatch
//! - `scene`: loaded objects and the single-highlight hover state
//!
//! ```no_run
//! use rackview::room::MachineRoom;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut room = MachineRoom::new("./models/");
//!     room.load_scene("machine-room.gltf");
//!     room.on_enter(|cabinet| println!("hovering {}", cabinet.name));
//!     room.run()
//! }
//! ```

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod picking;
pub mod pipelines;
pub mod resources;
pub mod room;
pub mod scene;

pub use room::MachineRoom;
pub use scene::SceneObject;
