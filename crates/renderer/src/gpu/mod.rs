//! wgpu side of the field.
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `pipeline` builds the simulation and display pipelines over one shared
//!   layout: uniforms in group 0, the sampled field in group 1.
//! - `targets` allocates the two half-float field textures.
//! - `uniforms` packs scheduler inputs into std140 blocks.
//! - `state` implements `FieldKernel` on top of all of the above.

mod context;
mod pipeline;
mod state;
mod targets;
mod uniforms;

pub use state::GpuState;
pub use targets::FieldTexture;
