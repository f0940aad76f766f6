//! Grid vocabulary shared by every module: positions and handles, tuning
//! constants, the command messages and the input buffer.

mod components;
mod constants;
mod events;
mod resources;

pub use components::*;
pub use constants::*;
pub use events::*;
pub use resources::*;
