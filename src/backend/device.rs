// Vulkan Device - logical device and its queues
//
// Responsibilities:
// - Queue family selection (first match wins, no scoring)
// - Logical device creation, refusing unsupported extensions up front
// - Queue retrieval
// - Owning everything created against it (children keep it alive)

use ash::vk;
use std::ffi::{c_char, CString};
use std::rc::Rc;

use super::error::{check, non_null, unsupported, Error, Result};
use super::instance::{has_extension, InstanceShared};
use super::physical_device::PhysicalDevice;
use super::Driver;
use crate::Logger;

/// Lowest index with at least one queue, every bit of `flags`, and
/// `supports_present(index)` true. `supports_present` only runs for families
/// that already match the flags.
pub fn select_queue_family(
    families: &[vk::QueueFamilyProperties],
    flags: vk::QueueFlags,
    mut supports_present: impl FnMut(u32) -> bool,
) -> Option<u32> {
    families
        .iter()
        .enumerate()
        .filter(|(_, props)| props.queue_count > 0 && props.queue_flags.contains(flags))
        .map(|(index, _)| index as u32)
        .find(|&index| supports_present(index))
}

/// Logical device parameters
#[derive(Debug, Clone)]
pub struct DeviceDesc {
    pub queue_family_index: u32,
    /// One queue is retrieved per priority
    pub queue_priorities: Vec<f32>,
    pub extensions: Vec<CString>,
    /// Defaults to every feature the physical device reports
    pub features: Option<vk::PhysicalDeviceFeatures>,
}

impl DeviceDesc {
    pub fn new(queue_family_index: u32) -> Self {
        Self {
            queue_family_index,
            queue_priorities: vec![1.0],
            extensions: vec![ash::extensions::khr::Swapchain::name().to_owned()],
            features: None,
        }
    }
}

pub(crate) struct DeviceShared {
    instance: Rc<InstanceShared>,
    handle: vk::Device,
    physical_device: vk::PhysicalDevice,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    queue_family_index: u32,
    queues: Vec<vk::Queue>,
    extensions: Vec<CString>,
}

impl DeviceShared {
    pub(crate) fn driver(&self) -> &dyn Driver {
        self.instance.driver()
    }

    pub(crate) fn logger(&self) -> &Logger {
        self.instance.logger()
    }

    pub(crate) fn handle(&self) -> vk::Device {
        self.handle
    }

    pub(crate) fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub(crate) fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    pub(crate) fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    pub(crate) fn queue(&self, index: usize) -> Result<vk::Queue> {
        self.queues
            .get(index)
            .copied()
            .ok_or_else(|| unsupported(self.logger(), "Queue", index.to_string()))
    }

    pub(crate) fn is_extension_enabled(&self, name: &std::ffi::CStr) -> bool {
        self.extensions.iter().any(|e| e.as_c_str() == name)
    }
}

impl Drop for DeviceShared {
    fn drop(&mut self) {
        if self.handle != vk::Device::null() {
            log_info!(self.logger(), "Destroying Vulkan device");
            self.instance.driver().destroy_device(self.handle);
            self.handle = vk::Device::null();
        }
    }
}

/// Scoped logical device
pub struct Device {
    shared: Rc<DeviceShared>,
}

impl Device {
    pub(crate) fn new(physical: &PhysicalDevice, desc: &DeviceDesc) -> Result<Self> {
        let instance = physical.instance();
        let logger = instance.logger();

        let supported = physical.extensions()?;
        for extension in &desc.extensions {
            if !has_extension(supported, extension) {
                return Err(unsupported(
                    logger,
                    "Device extension",
                    extension.to_string_lossy(),
                ));
            }
        }

        let family = physical
            .queue_families()?
            .get(desc.queue_family_index as usize)
            .copied()
            .ok_or_else(|| unsupported(logger, "Queue family", desc.queue_family_index.to_string()))?;

        if desc.queue_priorities.is_empty() || desc.queue_priorities.len() > family.queue_count as usize {
            return Err(unsupported(
                logger,
                "Queue count",
                format!(
                    "{} (family {} has {})",
                    desc.queue_priorities.len(),
                    desc.queue_family_index,
                    family.queue_count
                ),
            ));
        }

        let queue_create_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(desc.queue_family_index)
            .queue_priorities(&desc.queue_priorities)
            .build();

        let extensions: Vec<*const c_char> = desc.extensions.iter().map(|e| e.as_ptr()).collect();
        let features = desc.features.unwrap_or(*physical.features());

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let handle = check(
            logger,
            "vkCreateDevice",
            instance
                .driver()
                .create_device(instance.handle(), physical.handle(), &create_info),
        )?;
        let handle = non_null(logger, "vkCreateDevice", handle)?;

        // From here on, dropping `shared` destroys the device
        let mut shared = DeviceShared {
            instance: instance.clone(),
            handle,
            physical_device: physical.handle(),
            memory_properties: *physical.memory_properties(),
            queue_family_index: desc.queue_family_index,
            queues: Vec::with_capacity(desc.queue_priorities.len()),
            extensions: desc.extensions.clone(),
        };

        for index in 0..desc.queue_priorities.len() as u32 {
            let queue = instance
                .driver()
                .get_device_queue(handle, desc.queue_family_index, index);
            if queue == vk::Queue::null() {
                log_error!(logger, "Unable to get queue[{}]", index);
                return Err(Error::Backend {
                    op: "vkGetDeviceQueue",
                    result: vk::Result::ERROR_INITIALIZATION_FAILED,
                });
            }
            shared.queues.push(queue);
        }

        log_info!(
            logger,
            "Created device on {} (family {}, {} queues)",
            physical.name(),
            desc.queue_family_index,
            shared.queues.len()
        );

        Ok(Self {
            shared: Rc::new(shared),
        })
    }

    pub(crate) fn shared(&self) -> &Rc<DeviceShared> {
        &self.shared
    }

    pub fn handle(&self) -> vk::Device {
        self.shared.handle
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.shared.physical_device
    }

    pub fn queue_family_index(&self) -> u32 {
        self.shared.queue_family_index
    }

    pub fn queue_count(&self) -> usize {
        self.shared.queues.len()
    }

    pub fn queue(&self, index: usize) -> Result<vk::Queue> {
        self.shared.queue(index)
    }

    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.shared.memory_properties
    }

    /// Wait for device to be idle (e.g., before cleanup)
    pub fn wait_idle(&self) -> Result<()> {
        check(
            self.shared.logger(),
            "vkDeviceWaitIdle",
            self.shared.driver().device_wait_idle(self.shared.handle),
        )
    }
}
