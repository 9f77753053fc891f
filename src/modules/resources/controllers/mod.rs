pub mod record_proxy_controller;
pub mod resource_controller;

pub use resource_controller::{
    ControllerEvent, ControllerOptions, ControllerSnapshot, FetchKind, ResourceController,
};
