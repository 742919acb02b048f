pub mod color;
mod component;
pub mod config;
pub mod forces;
pub mod interaction;
pub mod label_collide;
mod render;
pub mod scene;
pub mod simulation;
mod state;
mod types;
pub mod viewport;

pub use component::BacklinkGraph;
pub use config::{BorderStyle, ColorConfig, GraphConfig, LabelStyle, PanButton, PathColor};
pub use simulation::{ForceSimulation, SimulationState};
pub use state::{ForceGraphState, MeasureText};
pub use types::{DocumentNode, GraphData, LabelBox, LinkEdge, NodeId, Rect};
