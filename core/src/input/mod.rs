//! Controller bindings
//!
//! - [`BindingRegistry`] - (port, action) → physical source table, evaluated every poll
//! - [`CaptureSession`] - learns a binding from the next intentional input
//! - [`ControllerHost`] - host seam for controller enumeration and state
//! - `GilrsHost` - gamepad host (feature `gamepad`)

pub mod action;
pub mod binding;
pub mod capture;
pub mod controller;
#[cfg(feature = "gamepad")]
pub mod gamepad;
pub mod registry;
pub mod templates;

pub use action::{BindAction, PORT_COUNT};
pub use binding::{BallAxis, BindingSource, FULL_SCALE, PhysicalInput, Sign};
pub use capture::{CaptureSession, CaptureStep};
pub use controller::{
    ControllerHost, ControllerId, ControllerState, HatDirection, InputKind, PhysicalController,
};
#[cfg(feature = "gamepad")]
pub use gamepad::GilrsHost;
pub use registry::{BindingDescription, BindingRegistry};
