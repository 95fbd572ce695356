// Vulkan walkthrough - device resource manager
//
// Walks the driver through instance creation, device selection, swapchain
// setup, command recording and memory-backed resources, in the order Vulkan
// requires. Every object is a scoped wrapper that releases itself on drop.

#[macro_use]
pub mod logging;

pub mod backend;
pub mod config;

pub use logging::{ConsoleSink, FileSink, LogSink, Logger};
