//! Контекст, очередь команд и события OpenCL
//!
//! Каждый объект освобождает свой дескриптор в `Drop`, поэтому ресурсы
//! возвращаются драйверу на любом пути выхода, включая ошибки.

use super::bindings::api;
use super::device::Device;
use super::types::*;
use super::utils::check;
use crate::error::Result;
use std::ptr;

/// Контекст OpenCL для одного устройства
pub struct Context {
    raw: cl_context,
}

impl Context {
    pub fn new(device: &Device) -> Result<Self> {
        let api = api()?;
        let device_id = device.id();
        let mut err = CL_SUCCESS;
        let raw = unsafe {
            (api.create_context)(ptr::null(), 1, &device_id, None, ptr::null_mut(), &mut err)
        };
        check(err, "clCreateContext")?;
        Ok(Self { raw })
    }

    pub(crate) fn raw(&self) -> cl_context {
        self.raw
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if let Ok(api) = api() {
            unsafe {
                (api.release_context)(self.raw);
            }
        }
    }
}

/// Упорядоченная очередь команд
pub struct CommandQueue {
    raw: cl_command_queue,
}

impl CommandQueue {
    pub fn new(context: &Context, device: &Device) -> Result<Self> {
        let api = api()?;
        let mut err = CL_SUCCESS;
        let raw = unsafe { (api.create_command_queue)(context.raw(), device.id(), 0, &mut err) };
        check(err, "clCreateCommandQueue")?;
        Ok(Self { raw })
    }

    pub(crate) fn raw(&self) -> cl_command_queue {
        self.raw
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        if let Ok(api) = api() {
            unsafe {
                (api.release_command_queue)(self.raw);
            }
        }
    }
}

/// Событие завершения команды
pub struct Event {
    raw: cl_event,
}

impl Event {
    /// Принимает владение событием, которое вернул вызов `clEnqueue*`
    pub(crate) fn from_raw(raw: cl_event) -> Self {
        Self { raw }
    }

    /// Блокирует до завершения команды
    pub fn wait(&self) -> Result<()> {
        let api = api()?;
        check(unsafe { (api.wait_for_events)(1, &self.raw) }, "clWaitForEvents")
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        if self.raw.is_null() {
            return;
        }
        if let Ok(api) = api() {
            unsafe {
                (api.release_event)(self.raw);
            }
        }
    }
}
