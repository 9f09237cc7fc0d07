//! Буферы памяти устройства

use super::bindings::api;
use super::context::{CommandQueue, Context, Event};
use super::types::*;
use super::utils::check;
use crate::error::{Error, Result};
use std::ffi::c_void;
use std::ptr;

/// Байтовый буфер в памяти устройства
pub struct Buffer {
    raw: cl_mem,
    len: usize,
}

impl Buffer {
    /// Выделяет буфер из `len` байт без инициализации
    pub fn new(context: &Context, flags: cl_mem_flags, len: usize) -> Result<Self> {
        let api = api()?;
        let mut err = CL_SUCCESS;
        let raw = unsafe { (api.create_buffer)(context.raw(), flags, len, ptr::null_mut(), &mut err) };
        check(err, "clCreateBuffer")?;
        Ok(Self { raw, len })
    }

    /// Создаёт буфер с копией `data`
    pub fn from_bytes(context: &Context, flags: cl_mem_flags, data: &[u8]) -> Result<Self> {
        let api = api()?;
        let mut err = CL_SUCCESS;
        // С CL_MEM_COPY_HOST_PTR драйвер только читает из указателя
        let raw = unsafe {
            (api.create_buffer)(
                context.raw(),
                flags | CL_MEM_COPY_HOST_PTR,
                data.len(),
                data.as_ptr() as *mut c_void,
                &mut err,
            )
        };
        check(err, "clCreateBuffer")?;
        Ok(Self { raw, len: data.len() })
    }

    pub(crate) fn raw(&self) -> cl_mem {
        self.raw
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Читает содержимое буфера в `out` и ждёт завершения чтения
    pub fn read_into(&self, queue: &CommandQueue, out: &mut [u8]) -> Result<()> {
        if out.len() != self.len {
            return Err(Error::InvalidInput(format!(
                "read-back target holds {} bytes, buffer holds {}",
                out.len(),
                self.len
            )));
        }
        let api = api()?;
        let mut event: cl_event = ptr::null_mut();
        check(
            unsafe {
                (api.enqueue_read_buffer)(
                    queue.raw(),
                    self.raw,
                    CL_TRUE,
                    0,
                    self.len,
                    out.as_mut_ptr() as *mut c_void,
                    0,
                    ptr::null(),
                    &mut event,
                )
            },
            "clEnqueueReadBuffer",
        )?;
        Event::from_raw(event).wait()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Ok(api) = api() {
            unsafe {
                (api.release_mem_object)(self.raw);
            }
        }
    }
}
