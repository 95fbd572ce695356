// Swapchain - Window presentation
//
// Manages the chain of images we render to and present to the screen.
// Sized from the surface capabilities each time it is (re)created; the
// previous chain is handed to the driver as `old_swapchain` and destroyed
// only once its replacement exists.

use ash::extensions::khr;
use ash::vk;
use std::rc::Rc;

use super::device::{Device, DeviceShared};
use super::error::{check, non_null, unsupported, Result};
use super::surface::{resolve_extent, resolve_image_count, Surface, SurfaceProvider, SurfaceShared};
use super::sync::{Fence, Semaphore};

/// What the caller negotiated with the surface beforehand
#[derive(Debug, Clone, Copy)]
pub struct SwapchainDesc {
    pub present_mode: vk::PresentModeKHR,
    pub surface_format: vk::SurfaceFormatKHR,
    pub image_usage: vk::ImageUsageFlags,
}

impl SwapchainDesc {
    pub fn new(present_mode: vk::PresentModeKHR, surface_format: vk::SurfaceFormatKHR) -> Self {
        Self {
            present_mode,
            surface_format,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
        }
    }
}

pub struct Swapchain {
    device: Rc<DeviceShared>,
    surface: Rc<SurfaceShared>,
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    extent: vk::Extent2D,
    desc: SwapchainDesc,
}

impl Device {
    /// Create a swapchain presenting to `surface`. Needs VK_KHR_swapchain.
    pub fn create_swapchain(
        &self,
        surface: &Surface,
        window: &dyn SurfaceProvider,
        desc: &SwapchainDesc,
    ) -> Result<Swapchain> {
        let device = self.shared();
        if !device.is_extension_enabled(khr::Swapchain::name()) {
            return Err(unsupported(
                device.logger(),
                "Device extension",
                khr::Swapchain::name().to_string_lossy(),
            ));
        }

        let mut swapchain = Swapchain {
            device: device.clone(),
            surface: surface.shared().clone(),
            handle: vk::SwapchainKHR::null(),
            images: Vec::new(),
            extent: vk::Extent2D::default(),
            desc: *desc,
        };
        swapchain.recreate(window)?;

        Ok(swapchain)
    }
}

impl Swapchain {
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// Owned by the swapchain; never destroy these individually
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn format(&self) -> vk::Format {
        self.desc.surface_format.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.desc.present_mode
    }

    /// Rebuild against the current surface capabilities and window size.
    ///
    /// On failure the current swapchain is left exactly as it was.
    pub fn recreate(&mut self, window: &dyn SurfaceProvider) -> Result<()> {
        let device = &self.device;
        let logger = device.logger();

        let caps = self.surface.capabilities(device.physical_device())?;
        let extent = resolve_extent(&caps, window.pixel_size());
        let image_count = resolve_image_count(&caps);

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(self.surface.handle())
            .min_image_count(image_count)
            .image_format(self.desc.surface_format.format)
            .image_color_space(self.desc.surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(self.desc.image_usage)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(self.desc.present_mode)
            .clipped(true)
            .old_swapchain(self.handle);

        let handle = check(
            logger,
            "vkCreateSwapchainKHR",
            device.driver().create_swapchain(device.handle(), &create_info),
        )?;
        let handle = non_null(logger, "vkCreateSwapchainKHR", handle)?;

        let images = match device.driver().get_swapchain_images(device.handle(), handle) {
            Ok(images) if !images.is_empty() => images,
            Ok(_) => {
                device.driver().destroy_swapchain(device.handle(), handle);
                return check(
                    logger,
                    "vkGetSwapchainImagesKHR",
                    Err(vk::Result::ERROR_INITIALIZATION_FAILED),
                );
            }
            Err(result) => {
                device.driver().destroy_swapchain(device.handle(), handle);
                return check(logger, "vkGetSwapchainImagesKHR", Err(result));
            }
        };

        if self.handle != vk::SwapchainKHR::null() {
            device.driver().destroy_swapchain(device.handle(), self.handle);
        }

        log_info!(
            logger,
            "Created swapchain {}x{} with {} images ({:?})",
            extent.width,
            extent.height,
            images.len(),
            self.desc.present_mode
        );

        self.handle = handle;
        self.images = images;
        self.extent = extent;
        Ok(())
    }

    /// Acquire next image for rendering. Returns (index, suboptimal).
    pub fn acquire_next_image(
        &self,
        timeout: u64,
        semaphore: Option<&Semaphore>,
        fence: Option<&Fence>,
    ) -> Result<(u32, bool)> {
        check(
            self.device.logger(),
            "vkAcquireNextImageKHR",
            self.device.driver().acquire_next_image(
                self.device.handle(),
                self.handle,
                timeout,
                semaphore.map_or(vk::Semaphore::null(), Semaphore::handle),
                fence.map_or(vk::Fence::null(), Fence::handle),
            ),
        )
    }

    /// Present rendered image to screen. `Ok(true)` means the swapchain
    /// should be recreated (suboptimal or out of date).
    pub fn present(&self, queue_index: usize, image_index: u32, wait_semaphores: &[&Semaphore]) -> Result<bool> {
        let queue = self.device.queue(queue_index)?;
        let wait: Vec<vk::Semaphore> = wait_semaphores.iter().map(|s| s.handle()).collect();
        let swapchains = [self.handle];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&wait)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match self
            .device
            .driver()
            .queue_present(self.device.handle(), queue, &present_info)
        {
            Ok(suboptimal) => Ok(suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(true),
            result => check(self.device.logger(), "vkQueuePresentKHR", result),
        }
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        if self.handle != vk::SwapchainKHR::null() {
            self.device
                .driver()
                .destroy_swapchain(self.device.handle(), self.handle);
            self.handle = vk::SwapchainKHR::null();
            self.images.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{self, MockDriver};

    fn desc() -> SwapchainDesc {
        SwapchainDesc::new(vk::PresentModeKHR::FIFO, mock::surface_format())
    }

    #[test]
    fn sized_from_capabilities() {
        let driver = Rc::new(MockDriver {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 4,
                current_extent: vk::Extent2D {
                    width: u32::MAX,
                    height: u32::MAX,
                },
                min_image_extent: vk::Extent2D { width: 64, height: 64 },
                max_image_extent: vk::Extent2D { width: 800, height: 600 },
                ..mock::capabilities()
            },
            ..Default::default()
        });
        let (_entry, instance) = mock::instance(&driver);
        let surface = instance.create_surface(&mock::Window::default()).unwrap();
        let device = mock::device(&instance);

        let swapchain = device
            .create_swapchain(&surface, &mock::Window::default(), &desc())
            .unwrap();

        assert_eq!(swapchain.extent(), vk::Extent2D { width: 800, height: 600 });
        assert_eq!(driver.swapchain_min_image_counts(), vec![3]);
        assert_eq!(swapchain.images().len(), driver.swapchain_image_count as usize);
    }

    #[test]
    fn old_swapchain_retired_after_replacement() {
        let driver = Rc::new(MockDriver::default());
        let (_entry, instance) = mock::instance(&driver);
        let surface = instance.create_surface(&mock::Window::default()).unwrap();
        let device = mock::device(&instance);
        let window = mock::Window::default();

        let mut swapchain = device.create_swapchain(&surface, &window, &desc()).unwrap();
        let old = vk::Handle::as_raw(swapchain.handle());

        swapchain.recreate(&window).unwrap();

        assert_ne!(vk::Handle::as_raw(swapchain.handle()), old);
        assert_eq!(driver.old_swapchains(), vec![0, old]);
        assert_eq!(driver.destroyed("destroy_swapchain"), vec![old]);
        assert!(driver.last_position("create_swapchain") < driver.position("destroy_swapchain"));
    }

    #[test]
    fn failed_recreate_keeps_current_swapchain() {
        let driver = Rc::new(MockDriver::default());
        let (_entry, instance) = mock::instance(&driver);
        let surface = instance.create_surface(&mock::Window::default()).unwrap();
        let device = mock::device(&instance);
        let window = mock::Window::default();

        let mut swapchain = device.create_swapchain(&surface, &window, &desc()).unwrap();
        let current = swapchain.handle();
        let images = swapchain.images().to_vec();

        driver.fail("create_swapchain", vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR);
        assert!(swapchain.recreate(&window).is_err());

        assert_eq!(swapchain.handle(), current);
        assert_eq!(swapchain.images(), images.as_slice());
        assert_eq!(driver.count("destroy_swapchain"), 0);
    }

    #[test]
    fn failed_image_query_discards_new_swapchain_only() {
        let driver = Rc::new(MockDriver::default());
        let (_entry, instance) = mock::instance(&driver);
        let surface = instance.create_surface(&mock::Window::default()).unwrap();
        let device = mock::device(&instance);
        let window = mock::Window::default();

        let mut swapchain = device.create_swapchain(&surface, &window, &desc()).unwrap();
        let current = vk::Handle::as_raw(swapchain.handle());

        driver.fail("get_swapchain_images", vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        assert!(swapchain.recreate(&window).is_err());

        assert_eq!(vk::Handle::as_raw(swapchain.handle()), current);
        let destroyed = driver.destroyed("destroy_swapchain");
        assert_eq!(destroyed.len(), 1);
        assert_ne!(destroyed[0], current);
    }

    #[test]
    fn needs_swapchain_extension() {
        let driver = Rc::new(MockDriver::default());
        let (_entry, instance) = mock::instance(&driver);
        let surface = instance.create_surface(&mock::Window::default()).unwrap();
        let physical = instance.physical_devices().unwrap().remove(0);

        let mut device_desc = crate::backend::DeviceDesc::new(0);
        device_desc.extensions.clear();
        let device = physical.create_device(&device_desc).unwrap();

        assert!(device
            .create_swapchain(&surface, &mock::Window::default(), &desc())
            .is_err());
        assert_eq!(driver.count("create_swapchain"), 0);
    }

    #[test]
    fn out_of_date_present_asks_for_recreate() {
        let driver = Rc::new(MockDriver::default());
        let (_entry, instance) = mock::instance(&driver);
        let surface = instance.create_surface(&mock::Window::default()).unwrap();
        let device = mock::device(&instance);
        let swapchain = device
            .create_swapchain(&surface, &mock::Window::default(), &desc())
            .unwrap();
        let semaphore = device.create_semaphore().unwrap();

        let (index, suboptimal) = swapchain.acquire_next_image(u64::MAX, Some(&semaphore), None).unwrap();
        assert!(!suboptimal);
        assert!(!swapchain.present(0, index, &[&semaphore]).unwrap());

        driver.fail("queue_present", vk::Result::ERROR_OUT_OF_DATE_KHR);
        assert!(swapchain.present(0, index, &[]).unwrap());

        driver.fail("acquire_next_image", vk::Result::ERROR_OUT_OF_DATE_KHR);
        let err = swapchain.acquire_next_image(0, None, None).err().unwrap();
        assert!(err.is_out_of_date());
    }

    #[test]
    fn swapchain_destroyed_before_surface() {
        let driver = Rc::new(MockDriver::default());
        let (_entry, instance) = mock::instance(&driver);
        let surface = instance.create_surface(&mock::Window::default()).unwrap();
        let device = mock::device(&instance);
        let swapchain = device
            .create_swapchain(&surface, &mock::Window::default(), &desc())
            .unwrap();

        drop(surface);
        drop(device);
        assert_eq!(driver.count("destroy_surface"), 0);

        drop(swapchain);
        assert!(driver.position("destroy_swapchain") < driver.position("destroy_surface"));
        assert!(driver.position("destroy_swapchain") < driver.position("destroy_device"));
    }
}
