// Synchronization primitives
//
// Semaphores for GPU-GPU ordering, fences for GPU-CPU.
// Fence timeouts are passed to the driver untouched.

use ash::vk;
use std::rc::Rc;

use super::device::{Device, DeviceShared};
use super::error::{check, non_null, Error, Result};

pub struct Semaphore {
    device: Rc<DeviceShared>,
    handle: vk::Semaphore,
}

impl Semaphore {
    pub fn handle(&self) -> vk::Semaphore {
        self.handle
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        if self.handle != vk::Semaphore::null() {
            self.device
                .driver()
                .destroy_semaphore(self.device.handle(), self.handle);
            self.handle = vk::Semaphore::null();
        }
    }
}

pub struct Fence {
    device: Rc<DeviceShared>,
    handle: vk::Fence,
}

impl Fence {
    pub fn handle(&self) -> vk::Fence {
        self.handle
    }

    /// `Ok(false)` if `timeout` (nanoseconds) ran out first
    pub fn wait(&self, timeout: u64) -> Result<bool> {
        wait_for_fences(&self.device, &[self.handle], true, timeout)
    }

    pub fn reset(&self) -> Result<()> {
        reset_fences(&self.device, &[self.handle])
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        if self.handle != vk::Fence::null() {
            self.device
                .driver()
                .destroy_fence(self.device.handle(), self.handle);
            self.handle = vk::Fence::null();
        }
    }
}

fn reset_fences(device: &DeviceShared, fences: &[vk::Fence]) -> Result<()> {
    check(
        device.logger(),
        "vkResetFences",
        device.driver().reset_fences(device.handle(), fences),
    )
}

fn wait_for_fences(device: &DeviceShared, fences: &[vk::Fence], wait_all: bool, timeout: u64) -> Result<bool> {
    match device
        .driver()
        .wait_for_fences(device.handle(), fences, wait_all, timeout)
    {
        Ok(()) => Ok(true),
        Err(vk::Result::TIMEOUT) => {
            log_warn!(
                device.logger(),
                "Timed out after {}ns waiting for {} fence(s)",
                timeout,
                fences.len()
            );
            Ok(false)
        }
        Err(result) => {
            log_error!(device.logger(), "vkWaitForFences failed: {:?}", result);
            Err(Error::Backend {
                op: "vkWaitForFences",
                result,
            })
        }
    }
}

impl Device {
    pub fn create_semaphore(&self) -> Result<Semaphore> {
        let device = self.shared();
        let create_info = vk::SemaphoreCreateInfo::builder();

        let handle = check(
            device.logger(),
            "vkCreateSemaphore",
            device.driver().create_semaphore(device.handle(), &create_info),
        )?;
        let handle = non_null(device.logger(), "vkCreateSemaphore", handle)?;

        Ok(Semaphore {
            device: device.clone(),
            handle,
        })
    }

    pub fn create_fence(&self, signaled: bool) -> Result<Fence> {
        let device = self.shared();
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);

        let handle = check(
            device.logger(),
            "vkCreateFence",
            device.driver().create_fence(device.handle(), &create_info),
        )?;
        let handle = non_null(device.logger(), "vkCreateFence", handle)?;

        Ok(Fence {
            device: device.clone(),
            handle,
        })
    }

    pub fn reset_fences(&self, fences: &[&Fence]) -> Result<()> {
        let handles: Vec<vk::Fence> = fences.iter().map(|f| f.handle).collect();
        reset_fences(self.shared(), &handles)
    }

    /// Wait for all (or any) of `fences`. `Ok(false)` on timeout.
    pub fn wait_for_fences(&self, fences: &[&Fence], wait_all: bool, timeout: u64) -> Result<bool> {
        let handles: Vec<vk::Fence> = fences.iter().map(|f| f.handle).collect();
        wait_for_fences(self.shared(), &handles, wait_all, timeout)
    }
}
