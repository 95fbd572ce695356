// Physical device - what a GPU reports about itself
//
// Features, properties and memory properties are read when the device is
// enumerated. Device extensions and queue families are read on first use
// and cached.

use ash::vk;
use std::cell::OnceCell;
use std::ffi::CStr;
use std::rc::Rc;

use super::device::{select_queue_family, Device, DeviceDesc};
use super::error::{check, unsupported, Result};
use super::instance::{extension_name, has_extension, InstanceShared};
use super::surface::Surface;

pub struct PhysicalDevice {
    instance: Rc<InstanceShared>,
    handle: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    extensions: OnceCell<Vec<vk::ExtensionProperties>>,
    queue_families: OnceCell<Vec<vk::QueueFamilyProperties>>,
}

impl PhysicalDevice {
    pub(crate) fn new(instance: Rc<InstanceShared>, handle: vk::PhysicalDevice) -> Self {
        let driver = instance.driver();
        let properties = driver.physical_device_properties(instance.handle(), handle);
        let features = driver.physical_device_features(instance.handle(), handle);
        let memory_properties = driver.physical_device_memory_properties(instance.handle(), handle);

        Self {
            instance,
            handle,
            properties,
            features,
            memory_properties,
            extensions: OnceCell::new(),
            queue_families: OnceCell::new(),
        }
    }

    pub fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    pub fn features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.features
    }

    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    pub(crate) fn instance(&self) -> &Rc<InstanceShared> {
        &self.instance
    }

    pub fn name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    pub fn log_properties(&self) {
        let logger = self.instance.logger();
        log_info!(logger, "Physical device name: {}", self.name());
        log_info!(
            logger,
            "Type: {:?}, API Version: {}.{}.{}",
            self.properties.device_type,
            vk::api_version_major(self.properties.api_version),
            vk::api_version_minor(self.properties.api_version),
            vk::api_version_patch(self.properties.api_version)
        );
        log_info!(
            logger,
            "Memory types: {}, heaps: {}",
            self.memory_properties.memory_type_count,
            self.memory_properties.memory_heap_count
        );
    }

    /// Supported device extensions, enumerated on first use
    pub fn extensions(&self) -> Result<&[vk::ExtensionProperties]> {
        if let Some(extensions) = self.extensions.get() {
            return Ok(extensions);
        }

        let logger = self.instance.logger();
        let extensions = check(
            logger,
            "vkEnumerateDeviceExtensionProperties",
            self.instance
                .driver()
                .enumerate_device_extensions(self.instance.handle(), self.handle),
        )?;
        if extensions.is_empty() {
            return Err(unsupported(logger, "Device extension", "(none reported)"));
        }

        Ok(self.extensions.get_or_init(|| extensions))
    }

    pub fn is_extension_supported(&self, name: &CStr) -> Result<bool> {
        Ok(has_extension(self.extensions()?, name))
    }

    pub fn log_extensions(&self) {
        let Ok(extensions) = self.extensions() else {
            return;
        };

        let logger = self.instance.logger();
        log_info!(logger, "Device Extension Properties:");
        for props in extensions {
            log_info!(
                logger,
                "Name: {}, Version: {}",
                extension_name(props).to_string_lossy(),
                props.spec_version
            );
        }
    }

    /// Queue families, read on first use. An empty list is a failure.
    pub fn queue_families(&self) -> Result<&[vk::QueueFamilyProperties]> {
        if let Some(families) = self.queue_families.get() {
            return Ok(families);
        }

        let families = self
            .instance
            .driver()
            .queue_family_properties(self.instance.handle(), self.handle);
        if families.is_empty() {
            return Err(unsupported(
                self.instance.logger(),
                "Queue family",
                "(none reported)",
            ));
        }

        Ok(self.queue_families.get_or_init(|| families))
    }

    /// Lowest-indexed family with `flags`, able to present to `surface` if given
    pub fn select_queue_family(&self, flags: vk::QueueFlags, surface: Option<&Surface>) -> Result<u32> {
        let families = self.queue_families()?;

        let selected = select_queue_family(families, flags, |index| match surface {
            Some(surface) => surface.supports_queue_family(self, index),
            None => true,
        });

        selected.ok_or_else(|| {
            unsupported(
                self.instance.logger(),
                "Queue family",
                format!("{:?} (presentation: {})", flags, surface.is_some()),
            )
        })
    }

    pub fn create_device(&self, desc: &DeviceDesc) -> Result<Device> {
        Device::new(self, desc)
    }
}
