// Images, image views and samplers
//
// Images follow the same create -> allocate -> bind sequence as buffers.
// Views can also wrap images the crate does not own (swapchain images).

use ash::vk;
use std::rc::Rc;

use super::device::{Device, DeviceShared};
use super::error::{check, non_null, Result};
use super::memory;

#[derive(Debug, Clone, Copy)]
pub struct ImageDesc {
    pub image_type: vk::ImageType,
    /// Six faces per layer; needs a square 2D image
    pub cubemap: bool,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: vk::SampleCountFlags,
    pub tiling: vk::ImageTiling,
    pub usage: vk::ImageUsageFlags,
    pub memory_flags: vk::MemoryPropertyFlags,
}

impl ImageDesc {
    /// Single-level, single-layer, device-local 2D image
    pub fn texture_2d(format: vk::Format, width: u32, height: u32, usage: vk::ImageUsageFlags) -> Self {
        Self {
            image_type: vk::ImageType::TYPE_2D,
            cubemap: false,
            format,
            extent: vk::Extent3D {
                width,
                height,
                depth: 1,
            },
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            usage,
            memory_flags: vk::MemoryPropertyFlags::DEVICE_LOCAL,
        }
    }

    fn layer_count(&self) -> u32 {
        if self.cubemap {
            self.array_layers * 6
        } else {
            self.array_layers
        }
    }
}

pub(crate) struct ImageShared {
    device: Rc<DeviceShared>,
    handle: vk::Image,
    memory: vk::DeviceMemory,
}

impl Drop for ImageShared {
    fn drop(&mut self) {
        let driver = self.device.driver();
        if self.handle != vk::Image::null() {
            driver.destroy_image(self.device.handle(), self.handle);
            self.handle = vk::Image::null();
        }
        if self.memory != vk::DeviceMemory::null() {
            driver.free_memory(self.device.handle(), self.memory);
            self.memory = vk::DeviceMemory::null();
        }
    }
}

pub struct Image {
    shared: Rc<ImageShared>,
    desc: ImageDesc,
}

impl Device {
    pub fn create_image(&self, desc: &ImageDesc) -> Result<Image> {
        let device = self.shared();
        let logger = device.logger();

        let flags = if desc.cubemap {
            vk::ImageCreateFlags::CUBE_COMPATIBLE
        } else {
            vk::ImageCreateFlags::empty()
        };

        let image_info = vk::ImageCreateInfo::builder()
            .flags(flags)
            .image_type(desc.image_type)
            .format(desc.format)
            .extent(desc.extent)
            .mip_levels(desc.mip_levels)
            .array_layers(desc.layer_count())
            .samples(desc.samples)
            .tiling(desc.tiling)
            .usage(desc.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let handle = check(
            logger,
            "vkCreateImage",
            device.driver().create_image(device.handle(), &image_info),
        )?;
        let handle = non_null(logger, "vkCreateImage", handle)?;

        let mut shared = ImageShared {
            device: device.clone(),
            handle,
            memory: vk::DeviceMemory::null(),
        };

        let requirements = device.driver().image_memory_requirements(device.handle(), handle);
        let (memory, _) = memory::allocate(device, &requirements, desc.memory_flags)?;
        shared.memory = memory;

        check(
            logger,
            "vkBindImageMemory",
            device
                .driver()
                .bind_image_memory(device.handle(), handle, memory, 0),
        )?;

        Ok(Image {
            shared: Rc::new(shared),
            desc: *desc,
        })
    }

    /// View over an image this crate does not own, e.g. a swapchain image.
    /// Drop the view before the image goes away.
    pub fn create_image_view(
        &self,
        image: vk::Image,
        view_type: vk::ImageViewType,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> Result<ImageView> {
        create_view(self.shared(), None, image, view_type, format, aspect)
    }

    pub fn create_sampler(&self, desc: &SamplerDesc) -> Result<Sampler> {
        let device = self.shared();
        let sampler_info = vk::SamplerCreateInfo::builder()
            .mag_filter(desc.mag_filter)
            .min_filter(desc.min_filter)
            .mipmap_mode(desc.mipmap_mode)
            .address_mode_u(desc.address_mode)
            .address_mode_v(desc.address_mode)
            .address_mode_w(desc.address_mode)
            .mip_lod_bias(desc.mip_lod_bias)
            .anisotropy_enable(desc.max_anisotropy.is_some())
            .max_anisotropy(desc.max_anisotropy.unwrap_or(1.0))
            .compare_enable(desc.compare_op.is_some())
            .compare_op(desc.compare_op.unwrap_or(vk::CompareOp::ALWAYS))
            .min_lod(desc.min_lod)
            .max_lod(desc.max_lod)
            .border_color(desc.border_color)
            .unnormalized_coordinates(desc.unnormalized_coordinates);

        let handle = check(
            device.logger(),
            "vkCreateSampler",
            device.driver().create_sampler(device.handle(), &sampler_info),
        )?;
        let handle = non_null(device.logger(), "vkCreateSampler", handle)?;

        Ok(Sampler {
            device: device.clone(),
            handle,
        })
    }
}

fn create_view(
    device: &Rc<DeviceShared>,
    owner: Option<Rc<ImageShared>>,
    image: vk::Image,
    view_type: vk::ImageViewType,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
) -> Result<ImageView> {
    let view_info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(view_type)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        });

    let handle = check(
        device.logger(),
        "vkCreateImageView",
        device.driver().create_image_view(device.handle(), &view_info),
    )?;
    let handle = non_null(device.logger(), "vkCreateImageView", handle)?;

    Ok(ImageView {
        device: device.clone(),
        _image: owner,
        handle,
    })
}

impl Image {
    pub fn handle(&self) -> vk::Image {
        self.shared.handle
    }

    pub fn memory(&self) -> vk::DeviceMemory {
        self.shared.memory
    }

    pub fn desc(&self) -> &ImageDesc {
        &self.desc
    }

    /// View over every level and layer; `format` may differ from the image's
    /// if the formats are compatible
    pub fn create_view(
        &self,
        view_type: vk::ImageViewType,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> Result<ImageView> {
        create_view(
            &self.shared.device,
            Some(self.shared.clone()),
            self.shared.handle,
            view_type,
            format,
            aspect,
        )
    }
}

pub struct ImageView {
    device: Rc<DeviceShared>,
    _image: Option<Rc<ImageShared>>,
    handle: vk::ImageView,
}

impl ImageView {
    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        if self.handle != vk::ImageView::null() {
            self.device
                .driver()
                .destroy_image_view(self.device.handle(), self.handle);
            self.handle = vk::ImageView::null();
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SamplerDesc {
    pub mag_filter: vk::Filter,
    pub min_filter: vk::Filter,
    pub mipmap_mode: vk::SamplerMipmapMode,
    /// Same mode on u, v and w
    pub address_mode: vk::SamplerAddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: Option<f32>,
    pub compare_op: Option<vk::CompareOp>,
    pub min_lod: f32,
    pub max_lod: f32,
    pub border_color: vk::BorderColor,
    pub unnormalized_coordinates: bool,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            mipmap_mode: vk::SamplerMipmapMode::LINEAR,
            address_mode: vk::SamplerAddressMode::REPEAT,
            mip_lod_bias: 0.0,
            max_anisotropy: None,
            compare_op: None,
            min_lod: 0.0,
            max_lod: vk::LOD_CLAMP_NONE,
            border_color: vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
            unnormalized_coordinates: false,
        }
    }
}

pub struct Sampler {
    device: Rc<DeviceShared>,
    handle: vk::Sampler,
}

impl Sampler {
    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        if self.handle != vk::Sampler::null() {
            self.device
                .driver()
                .destroy_sampler(self.device.handle(), self.handle);
            self.handle = vk::Sampler::null();
        }
    }
}
