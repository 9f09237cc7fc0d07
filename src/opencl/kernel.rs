//! Программы и ядра OpenCL

use super::bindings::api;
use super::buffer::Buffer;
use super::context::{CommandQueue, Context, Event};
use super::device::{query_string, Device};
use super::types::*;
use super::utils::{c_string, check};
use crate::error::Result;
use std::ffi::c_void;
use std::ptr;

/// Скомпилированная программа OpenCL
pub struct Program {
    raw: cl_program,
}

impl Program {
    /// Создаёт программу из исходного кода и собирает её для `device`.
    ///
    /// При ошибке сборки лог компилятора пишется в журнал на уровне `error`.
    pub fn build(context: &Context, device: &Device, source: &str, options: &str) -> Result<Self> {
        let api = api()?;

        let source_ptr = source.as_ptr() as *const std::ffi::c_char;
        let source_len = source.len();
        let mut err = CL_SUCCESS;
        let raw = unsafe {
            (api.create_program_with_source)(context.raw(), 1, &source_ptr, &source_len, &mut err)
        };
        check(err, "clCreateProgramWithSource")?;
        let program = Self { raw };

        let options = c_string(options)?;
        let device_id = device.id();
        let status = unsafe {
            (api.build_program)(program.raw, 1, &device_id, options.as_ptr(), None, ptr::null_mut())
        };
        if status != CL_SUCCESS {
            match program.build_log(device) {
                Ok(log) => log::error!("OpenCL program build failed ({}):\n{}", status, log),
                Err(e) => log::error!("OpenCL program build failed ({}), no build log: {}", status, e),
            }
        }
        check(status, "clBuildProgram")?;

        log::debug!("built OpenCL program with options {:?}", options);
        Ok(program)
    }

    /// Лог компиляции программы для устройства
    pub fn build_log(&self, device: &Device) -> Result<String> {
        let api = api()?;
        query_string(
            |size, value, size_ret| unsafe {
                (api.get_program_build_info)(
                    self.raw,
                    device.id(),
                    CL_PROGRAM_BUILD_LOG,
                    size,
                    value,
                    size_ret,
                )
            },
            "clGetProgramBuildInfo",
        )
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if let Ok(api) = api() {
            unsafe {
                (api.release_program)(self.raw);
            }
        }
    }
}

/// Точка входа программы с привязанными аргументами
pub struct Kernel {
    raw: cl_kernel,
}

impl Kernel {
    pub fn new(program: &Program, name: &str) -> Result<Self> {
        let api = api()?;
        let name = c_string(name)?;
        let mut err = CL_SUCCESS;
        let raw = unsafe { (api.create_kernel)(program.raw, name.as_ptr(), &mut err) };
        check(err, "clCreateKernel")?;
        Ok(Self { raw })
    }

    /// Привязывает буфер к аргументу `index`
    pub fn set_buffer_arg(&self, index: u32, buffer: &Buffer) -> Result<()> {
        let api = api()?;
        let mem = buffer.raw();
        check(
            unsafe {
                (api.set_kernel_arg)(
                    self.raw,
                    index,
                    std::mem::size_of::<cl_mem>(),
                    &mem as *const cl_mem as *const c_void,
                )
            },
            "clSetKernelArg",
        )
    }

    /// Привязывает скалярный `uint` к аргументу `index`
    pub fn set_u32_arg(&self, index: u32, value: u32) -> Result<()> {
        let api = api()?;
        check(
            unsafe {
                (api.set_kernel_arg)(
                    self.raw,
                    index,
                    std::mem::size_of::<u32>(),
                    &value as *const u32 as *const c_void,
                )
            },
            "clSetKernelArg",
        )
    }

    /// Ставит в очередь двумерный запуск с фиксированной рабочей группой
    pub fn enqueue_2d(&self, queue: &CommandQueue, global: [usize; 2], local: [usize; 2]) -> Result<Event> {
        let api = api()?;
        let mut event: cl_event = ptr::null_mut();
        check(
            unsafe {
                (api.enqueue_nd_range_kernel)(
                    queue.raw(),
                    self.raw,
                    2,
                    ptr::null(),
                    global.as_ptr(),
                    local.as_ptr(),
                    0,
                    ptr::null(),
                    &mut event,
                )
            },
            "clEnqueueNDRangeKernel",
        )?;
        Ok(Event::from_raw(event))
    }
}

impl Drop for Kernel {
    fn drop(&mut self) {
        if let Ok(api) = api() {
            unsafe {
                (api.release_kernel)(self.raw);
            }
        }
    }
}
