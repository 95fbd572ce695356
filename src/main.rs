// =============================================================================
// VULKAN WALKTHROUGH - device resource manager, start to finish
// =============================================================================
//
// Opens a window and walks the driver through every step in the order Vulkan
// requires:
//
// 1. Enumerate instance extensions, create the instance
// 2. Pick the physical device, dump its properties and extensions
// 3. Create the presentation surface, select a queue family
// 4. Select present mode and surface format
// 5. Create the logical device and retrieve its queues
// 6. Create the swapchain
// 7. Command pool, one command buffer, record, submit, wait
// 8. A sampled image with a view, a uniform buffer, a sampler
//
// Resizing the window recreates the swapchain. Closing it drops everything,
// children first.
//
// =============================================================================

use anyhow::{Context, Result};
use ash::vk;
use std::rc::Rc;
use vk_walkthrough::backend::{
    AshDriver, Buffer, BufferBarrier, CommandBuffer, CommandPool, DebugMessenger, Device, DeviceDesc,
    Driver, Entry, Image, ImageBarrier, ImageDesc, ImageView, Instance, InstanceDesc, Sampler,
    SamplerDesc, SubmitBatch, Surface, Swapchain, SwapchainDesc,
};
use vk_walkthrough::config::{Config, LoggingConfig};
use vk_walkthrough::{FileSink, Logger};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    // Load configuration from config.toml
    let config = Config::load();

    init_logging();
    log::info!("Starting Vulkan walkthrough");
    log::info!(
        "Window: {}x{}, present mode: {}",
        config.window.width,
        config.window.height,
        config.swapchain.present_mode
    );

    let logger = create_logger(&config.logging)?;

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, logger);
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    builder.init();
}

/// The logger every Vulkan object reports through
fn create_logger(config: &LoggingConfig) -> Result<Logger> {
    let logger = if config.to_file() {
        let sink = FileSink::open(&config.file)
            .with_context(|| format!("Failed to open log file {:?}", config.file))?;
        log::info!("Writing Vulkan log to {:?}", config.file);
        Logger::new(sink)
    } else {
        Logger::console()
    };

    Ok(logger.with_max_level(config.level_filter()))
}

// =============================================================================
// VULKAN OBJECTS
// =============================================================================

/// Everything the walkthrough creates. Fields drop top to bottom; each object
/// also keeps its parent alive, so the order is only for readability.
#[allow(dead_code)] // most fields are only held for their Drop
struct Walkthrough {
    sampler: Sampler,
    uniforms: Buffer,
    image_view: ImageView,
    image: Image,
    command_buffer: CommandBuffer,
    command_pool: CommandPool,
    swapchain: Swapchain,
    device: Device,
    surface: Surface,
    messenger: Option<DebugMessenger>,
    instance: Instance,
    entry: Entry,
}

impl Walkthrough {
    fn new(config: &Config, logger: Logger, window: &Window) -> Result<Self> {
        log::info!("Initializing Vulkan...");

        let driver: Rc<dyn Driver> = Rc::new(AshDriver::load().context("Failed to load the Vulkan library")?);
        let entry = Entry::new(driver, logger);

        // ─────────────────────────────────────────────────────────────────────
        // STEP 1: Instance
        // ─────────────────────────────────────────────────────────────────────
        entry.log_instance_extensions();

        let mut extensions = entry.required_surface_extensions(window)?;
        extensions.extend(config.instance.extension_names());
        let mut layers = config.instance.layer_names();
        if config.application.validation {
            extensions.push(ash::extensions::ext::DebugUtils::name().to_owned());
            layers.push(VALIDATION_LAYER.to_owned());
        }
        extensions.sort();
        extensions.dedup();

        let instance = entry.create_instance(&InstanceDesc {
            application_name: std::ffi::CString::new(config.application.name.as_str())?,
            engine_name: std::ffi::CString::new(config.application.engine_name.as_str())?,
            extensions,
            layers,
            ..Default::default()
        })?;

        let messenger = if config.application.validation {
            Some(instance.create_debug_messenger(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )?)
        } else {
            None
        };

        // ─────────────────────────────────────────────────────────────────────
        // STEP 2: Physical device (first one reported)
        // ─────────────────────────────────────────────────────────────────────
        let physical_device = instance
            .physical_devices()?
            .into_iter()
            .next()
            .context("No physical device")?;
        physical_device.log_properties();
        physical_device.log_extensions();

        // ─────────────────────────────────────────────────────────────────────
        // STEP 3: Surface and queue family
        // ─────────────────────────────────────────────────────────────────────
        let surface = instance.create_surface(window)?;
        let queue_family = physical_device.select_queue_family(
            config.device.queue_flags(),
            config.device.presentation.then_some(&surface),
        )?;
        log::info!("Selected queue family {}", queue_family);

        // ─────────────────────────────────────────────────────────────────────
        // STEP 4: Present mode and surface format
        // ─────────────────────────────────────────────────────────────────────
        let present_mode = surface.select_present_mode(&physical_device, config.swapchain.present_mode())?;
        let surface_format = surface.select_format(&physical_device, config.swapchain.surface_format())?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 5: Logical device and queues
        // ─────────────────────────────────────────────────────────────────────
        let device = physical_device.create_device(&DeviceDesc {
            queue_family_index: queue_family,
            queue_priorities: config.device.queue_priorities.clone(),
            extensions: config.device.extension_names(),
            features: None,
        })?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 6: Swapchain
        // ─────────────────────────────────────────────────────────────────────
        let swapchain = device.create_swapchain(&surface, window, &SwapchainDesc::new(present_mode, surface_format))?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 7: Resources the first command buffer touches
        // ─────────────────────────────────────────────────────────────────────
        let image = device.create_image(&ImageDesc::texture_2d(
            vk::Format::B8G8R8A8_UNORM,
            512,
            512,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        ))?;
        let image_view = image.create_view(
            vk::ImageViewType::TYPE_2D,
            vk::Format::B8G8R8A8_UNORM,
            vk::ImageAspectFlags::COLOR,
        )?;

        let tint: [f32; 4] = [0.1, 0.2, 0.8, 1.0];
        let uniforms = device.create_buffer_with_data(vk::BufferUsageFlags::UNIFORM_BUFFER, &tint)?;

        let sampler = device.create_sampler(&SamplerDesc::default())?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 8: Record, submit, wait
        // ─────────────────────────────────────────────────────────────────────
        let command_pool = device.create_command_pool(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)?;
        let command_buffer = command_pool
            .allocate(1, vk::CommandBufferLevel::PRIMARY)?
            .into_iter()
            .next()
            .context("No command buffer allocated")?;

        command_buffer.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, None)?;
        command_buffer.buffer_barriers(
            vk::PipelineStageFlags::HOST,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            &[BufferBarrier {
                buffer: uniforms.handle(),
                src_access: vk::AccessFlags::HOST_WRITE,
                dst_access: vk::AccessFlags::UNIFORM_READ,
            }],
        );
        command_buffer.image_barriers(
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            &[ImageBarrier {
                image: image.handle(),
                src_access: vk::AccessFlags::empty(),
                dst_access: vk::AccessFlags::SHADER_READ,
                old_layout: vk::ImageLayout::UNDEFINED,
                new_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                aspect: vk::ImageAspectFlags::COLOR,
            }],
        );
        command_buffer.end()?;

        let fence = device.create_fence(false)?;
        device.submit(0, &SubmitBatch::new(&[&command_buffer]), Some(&fence))?;
        if !fence.wait(u64::MAX)? {
            log::warn!("First submission did not finish");
        }

        log::info!("Vulkan initialized successfully!");

        Ok(Self {
            sampler,
            uniforms,
            image_view,
            image,
            command_buffer,
            command_pool,
            swapchain,
            device,
            surface,
            messenger,
            instance,
            entry,
        })
    }

    /// Recreate swapchain after window resize
    fn resize(&mut self, window: &Window) -> Result<()> {
        self.device.wait_idle()?;
        self.swapchain.recreate(window)?;
        Ok(())
    }
}

impl Drop for Walkthrough {
    fn drop(&mut self) {
        log::info!("Cleaning up Vulkan resources...");
        // Errors were already logged by the device
        let _ = self.device.wait_idle();
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

struct App {
    config: Config,
    logger: Logger,
    /// Dropped before the window it presents to
    vulkan: Option<Walkthrough>,
    window: Option<Window>,
}

impl App {
    fn new(config: Config, logger: Logger) -> Self {
        Self {
            config,
            logger,
            vulkan: None,
            window: None,
        }
    }
}

impl ApplicationHandler for App {
    /// Called when the application is ready to create windows.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(w) => w,
            Err(e) => {
                log::error!("Failed to create window: {:?}", e);
                event_loop.exit();
                return;
            }
        };

        match Walkthrough::new(&self.config, self.logger.clone(), &window) {
            Ok(vulkan) => self.vulkan = Some(vulkan),
            Err(e) => {
                log::error!("Failed to initialize Vulkan: {:?}", e);
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down...");
                self.vulkan = None;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                log::debug!("Window resized to {}x{}", size.width, size.height);

                // Minimized: keep the old swapchain until there is something to show
                if size.width == 0 || size.height == 0 {
                    return;
                }

                if let (Some(vulkan), Some(window)) = (self.vulkan.as_mut(), self.window.as_ref()) {
                    if let Err(e) = vulkan.resize(window) {
                        log::error!("Failed to recreate swapchain: {:?}", e);
                    }
                }
            }

            _ => {}
        }
    }
}
