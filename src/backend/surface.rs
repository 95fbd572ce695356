// Presentation surface
//
// Connects a window to the instance and answers the questions the swapchain
// needs: can this queue family present, which modes and formats exist, and
// what extent and image count to ask for.

use ash::extensions::khr;
use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle};
use std::rc::Rc;

use super::error::{check, non_null, unsupported, Result};
use super::instance::{Instance, InstanceShared};
use super::physical_device::PhysicalDevice;

/// The window side of presentation: native handles and current pixel size
pub trait SurfaceProvider {
    fn display_handle(&self) -> RawDisplayHandle;
    fn window_handle(&self) -> RawWindowHandle;
    fn pixel_size(&self) -> (u32, u32);
}

impl SurfaceProvider for winit::window::Window {
    fn display_handle(&self) -> RawDisplayHandle {
        self.raw_display_handle()
    }

    fn window_handle(&self) -> RawWindowHandle {
        self.raw_window_handle()
    }

    fn pixel_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}

/// Swapchain extent for the given capabilities.
///
/// A current extent of `u32::MAX` means the surface takes its size from the
/// swapchain; the window size is then clamped per axis to the reported range.
pub fn resolve_extent(caps: &vk::SurfaceCapabilitiesKHR, window_size: (u32, u32)) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }

    let (width, height) = window_size;
    vk::Extent2D {
        width: width
            .max(caps.min_image_extent.width)
            .min(caps.max_image_extent.width),
        height: height
            .max(caps.min_image_extent.height)
            .min(caps.max_image_extent.height),
    }
}

/// One more than the minimum, capped at the maximum (0 = no maximum)
pub fn resolve_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count > 0 && count > caps.max_image_count {
        caps.max_image_count
    } else {
        count
    }
}

pub fn choose_present_mode(
    available: &[vk::PresentModeKHR],
    desired: vk::PresentModeKHR,
) -> Option<vk::PresentModeKHR> {
    available.iter().copied().find(|&mode| mode == desired)
}

/// A lone UNDEFINED entry means the surface accepts any format
pub fn choose_surface_format(
    available: &[vk::SurfaceFormatKHR],
    desired: vk::SurfaceFormatKHR,
) -> Option<vk::SurfaceFormatKHR> {
    if let [only] = available {
        if only.format == vk::Format::UNDEFINED {
            return Some(desired);
        }
    }

    available
        .iter()
        .find(|f| f.format == desired.format && f.color_space == desired.color_space)
        .copied()
}

pub(crate) struct SurfaceShared {
    instance: Rc<InstanceShared>,
    handle: vk::SurfaceKHR,
}

impl SurfaceShared {
    pub(crate) fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    pub(crate) fn capabilities(&self, physical_device: vk::PhysicalDevice) -> Result<vk::SurfaceCapabilitiesKHR> {
        check(
            self.instance.logger(),
            "vkGetPhysicalDeviceSurfaceCapabilitiesKHR",
            self.instance
                .driver()
                .surface_capabilities(self.instance.handle(), physical_device, self.handle),
        )
    }
}

impl Drop for SurfaceShared {
    fn drop(&mut self) {
        if self.handle != vk::SurfaceKHR::null() {
            self.instance
                .driver()
                .destroy_surface(self.instance.handle(), self.handle);
            self.handle = vk::SurfaceKHR::null();
        }
    }
}

pub struct Surface {
    shared: Rc<SurfaceShared>,
}

impl Instance {
    /// Create a presentation surface for `window`. Needs VK_KHR_surface.
    pub fn create_surface(&self, window: &dyn SurfaceProvider) -> Result<Surface> {
        let instance = self.shared();
        let logger = instance.logger();

        if !instance.is_extension_enabled(khr::Surface::name()) {
            return Err(unsupported(
                logger,
                "Instance extension",
                khr::Surface::name().to_string_lossy(),
            ));
        }

        let handle = check(
            logger,
            "vkCreateSurfaceKHR",
            instance.driver().create_surface(
                instance.handle(),
                window.display_handle(),
                window.window_handle(),
            ),
        )?;
        let handle = non_null(logger, "vkCreateSurfaceKHR", handle)?;

        Ok(Surface {
            shared: Rc::new(SurfaceShared {
                instance: instance.clone(),
                handle,
            }),
        })
    }
}

impl Surface {
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.shared.handle
    }

    pub(crate) fn shared(&self) -> &Rc<SurfaceShared> {
        &self.shared
    }

    /// A failed query counts as "cannot present"
    pub fn supports_queue_family(&self, physical_device: &PhysicalDevice, index: u32) -> bool {
        let instance = &self.shared.instance;
        match instance
            .driver()
            .surface_support(instance.handle(), physical_device.handle(), index, self.shared.handle)
        {
            Ok(supported) => supported,
            Err(result) => {
                log_warn!(
                    instance.logger(),
                    "vkGetPhysicalDeviceSurfaceSupportKHR failed for family {}: {:?}",
                    index,
                    result
                );
                false
            }
        }
    }

    pub fn capabilities(&self, physical_device: &PhysicalDevice) -> Result<vk::SurfaceCapabilitiesKHR> {
        self.shared.capabilities(physical_device.handle())
    }

    pub fn present_modes(&self, physical_device: &PhysicalDevice) -> Result<Vec<vk::PresentModeKHR>> {
        let instance = &self.shared.instance;
        let modes = check(
            instance.logger(),
            "vkGetPhysicalDeviceSurfacePresentModesKHR",
            instance.driver().surface_present_modes(
                instance.handle(),
                physical_device.handle(),
                self.shared.handle,
            ),
        )?;
        if modes.is_empty() {
            return Err(unsupported(instance.logger(), "Present mode", "(none reported)"));
        }
        Ok(modes)
    }

    pub fn formats(&self, physical_device: &PhysicalDevice) -> Result<Vec<vk::SurfaceFormatKHR>> {
        let instance = &self.shared.instance;
        let formats = check(
            instance.logger(),
            "vkGetPhysicalDeviceSurfaceFormatsKHR",
            instance.driver().surface_formats(
                instance.handle(),
                physical_device.handle(),
                self.shared.handle,
            ),
        )?;
        if formats.is_empty() {
            return Err(unsupported(instance.logger(), "Surface format", "(none reported)"));
        }
        Ok(formats)
    }

    /// `desired` if the surface lists it; no fallback to another mode
    pub fn select_present_mode(
        &self,
        physical_device: &PhysicalDevice,
        desired: vk::PresentModeKHR,
    ) -> Result<vk::PresentModeKHR> {
        let modes = self.present_modes(physical_device)?;
        choose_present_mode(&modes, desired)
            .ok_or_else(|| unsupported(self.shared.instance.logger(), "Present mode", format!("{:?}", desired)))
    }

    pub fn select_format(
        &self,
        physical_device: &PhysicalDevice,
        desired: vk::SurfaceFormatKHR,
    ) -> Result<vk::SurfaceFormatKHR> {
        let formats = self.formats(physical_device)?;
        choose_surface_format(&formats, desired).ok_or_else(|| {
            unsupported(
                self.shared.instance.logger(),
                "Surface format",
                format!("{:?} / {:?}", desired.format, desired.color_space),
            )
        })
    }
}
