// Backend module - Vulkan abstraction layer
//
// Design: thin scoped wrappers over a `Driver`, one file per resource kind.
// Children hold their parent alive, so drop order always matches Vulkan's
// destruction order.

pub mod ash_driver;
pub mod barrier;
pub mod buffer;
pub mod command;
pub mod device;
pub mod driver;
pub mod error;
pub mod image;
pub mod instance;
pub mod memory;
pub mod physical_device;
pub mod surface;
pub mod swapchain;
pub mod sync;

#[cfg(test)]
pub(crate) mod mock;

pub use ash_driver::AshDriver;
pub use barrier::{BufferBarrier, ImageBarrier};
pub use buffer::{Buffer, BufferView};
pub use command::{CommandBuffer, CommandPool, SubmitBatch};
pub use device::{select_queue_family, Device, DeviceDesc};
pub use driver::Driver;
pub use error::{Error, Result};
pub use image::{Image, ImageDesc, ImageView, Sampler, SamplerDesc};
pub use instance::{DebugMessenger, Entry, Instance, InstanceDesc};
pub use memory::find_memory_type;
pub use physical_device::PhysicalDevice;
pub use surface::{Surface, SurfaceProvider};
pub use swapchain::{Swapchain, SwapchainDesc};
pub use sync::{Fence, Semaphore};
