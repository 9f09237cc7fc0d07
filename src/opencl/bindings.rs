//! Низкоуровневые привязки к OpenCL API
//!
//! Библиотека OpenCL загружается во время выполнения: машина без
//! загрузчика OpenCL получает `Error::BackendInit`, а не ошибку компоновки.

use super::types::*;
use crate::error::{Error, Result};
use libloading::Library;
use std::ffi::{c_char, c_void};
use std::sync::OnceLock;

/// Тип callback-функции для контекста OpenCL
pub type ContextNotify = Option<
    unsafe extern "system" fn(
        errinfo: *const c_char,
        private_info: *const c_void,
        cb: usize,
        user_data: *mut c_void,
    ),
>;

/// Тип callback-функции для сборки программы
pub type BuildNotify = Option<unsafe extern "system" fn(program: cl_program, user_data: *mut c_void)>;

type GetPlatformIds = unsafe extern "system" fn(
    num_entries: cl_uint,
    platforms: *mut cl_platform_id,
    num_platforms: *mut cl_uint,
) -> cl_int;

type GetPlatformInfo = unsafe extern "system" fn(
    platform: cl_platform_id,
    param_name: cl_platform_info,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> cl_int;

type GetDeviceIds = unsafe extern "system" fn(
    platform: cl_platform_id,
    device_type: cl_device_type,
    num_entries: cl_uint,
    devices: *mut cl_device_id,
    num_devices: *mut cl_uint,
) -> cl_int;

type GetDeviceInfo = unsafe extern "system" fn(
    device: cl_device_id,
    param_name: cl_device_info,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> cl_int;

type CreateContext = unsafe extern "system" fn(
    properties: *const cl_context_properties,
    num_devices: cl_uint,
    devices: *const cl_device_id,
    pfn_notify: ContextNotify,
    user_data: *mut c_void,
    errcode_ret: *mut cl_int,
) -> cl_context;

type CreateCommandQueue = unsafe extern "system" fn(
    context: cl_context,
    device: cl_device_id,
    properties: cl_command_queue_properties,
    errcode_ret: *mut cl_int,
) -> cl_command_queue;

type CreateProgramWithSource = unsafe extern "system" fn(
    context: cl_context,
    count: cl_uint,
    strings: *const *const c_char,
    lengths: *const usize,
    errcode_ret: *mut cl_int,
) -> cl_program;

type BuildProgram = unsafe extern "system" fn(
    program: cl_program,
    num_devices: cl_uint,
    device_list: *const cl_device_id,
    options: *const c_char,
    pfn_notify: BuildNotify,
    user_data: *mut c_void,
) -> cl_int;

type GetProgramBuildInfo = unsafe extern "system" fn(
    program: cl_program,
    device: cl_device_id,
    param_name: cl_program_build_info,
    param_value_size: usize,
    param_value: *mut c_void,
    param_value_size_ret: *mut usize,
) -> cl_int;

type CreateKernel = unsafe extern "system" fn(
    program: cl_program,
    kernel_name: *const c_char,
    errcode_ret: *mut cl_int,
) -> cl_kernel;

type SetKernelArg = unsafe extern "system" fn(
    kernel: cl_kernel,
    arg_index: cl_uint,
    arg_size: usize,
    arg_value: *const c_void,
) -> cl_int;

type CreateBuffer = unsafe extern "system" fn(
    context: cl_context,
    flags: cl_mem_flags,
    size: usize,
    host_ptr: *mut c_void,
    errcode_ret: *mut cl_int,
) -> cl_mem;

type EnqueueNdRangeKernel = unsafe extern "system" fn(
    command_queue: cl_command_queue,
    kernel: cl_kernel,
    work_dim: cl_uint,
    global_work_offset: *const usize,
    global_work_size: *const usize,
    local_work_size: *const usize,
    num_events_in_wait_list: cl_uint,
    event_wait_list: *const cl_event,
    event: *mut cl_event,
) -> cl_int;

type EnqueueReadBuffer = unsafe extern "system" fn(
    command_queue: cl_command_queue,
    buffer: cl_mem,
    blocking_read: cl_bool,
    offset: usize,
    size: usize,
    ptr: *mut c_void,
    num_events_in_wait_list: cl_uint,
    event_wait_list: *const cl_event,
    event: *mut cl_event,
) -> cl_int;

type WaitForEvents = unsafe extern "system" fn(num_events: cl_uint, event_list: *const cl_event) -> cl_int;

type ReleaseEvent = unsafe extern "system" fn(event: cl_event) -> cl_int;
type ReleaseMemObject = unsafe extern "system" fn(memobj: cl_mem) -> cl_int;
type ReleaseKernel = unsafe extern "system" fn(kernel: cl_kernel) -> cl_int;
type ReleaseProgram = unsafe extern "system" fn(program: cl_program) -> cl_int;
type ReleaseCommandQueue = unsafe extern "system" fn(command_queue: cl_command_queue) -> cl_int;
type ReleaseContext = unsafe extern "system" fn(context: cl_context) -> cl_int;

/// Таблица функций OpenCL, разрешённых из динамической библиотеки
pub struct OpenClApi {
    pub get_platform_ids: GetPlatformIds,
    pub get_platform_info: GetPlatformInfo,
    pub get_device_ids: GetDeviceIds,
    pub get_device_info: GetDeviceInfo,
    pub create_context: CreateContext,
    pub create_command_queue: CreateCommandQueue,
    pub create_program_with_source: CreateProgramWithSource,
    pub build_program: BuildProgram,
    pub get_program_build_info: GetProgramBuildInfo,
    pub create_kernel: CreateKernel,
    pub set_kernel_arg: SetKernelArg,
    pub create_buffer: CreateBuffer,
    pub enqueue_nd_range_kernel: EnqueueNdRangeKernel,
    pub enqueue_read_buffer: EnqueueReadBuffer,
    pub wait_for_events: WaitForEvents,
    pub release_event: ReleaseEvent,
    pub release_mem_object: ReleaseMemObject,
    pub release_kernel: ReleaseKernel,
    pub release_program: ReleaseProgram,
    pub release_command_queue: ReleaseCommandQueue,
    pub release_context: ReleaseContext,
    // Указатели выше валидны, пока библиотека загружена
    _lib: Library,
}

#[cfg(target_os = "windows")]
const LIBRARY_NAMES: &[&str] = &["OpenCL.dll"];
#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &["/System/Library/Frameworks/OpenCL.framework/OpenCL"];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LIBRARY_NAMES: &[&str] = &["libOpenCL.so.1", "libOpenCL.so"];

static OPENCL_API: OnceLock<std::result::Result<OpenClApi, String>> = OnceLock::new();

/// Возвращает таблицу функций, загружая библиотеку при первом обращении
pub fn api() -> Result<&'static OpenClApi> {
    OPENCL_API
        .get_or_init(OpenClApi::load)
        .as_ref()
        .map_err(|e| Error::BackendInit(e.clone()))
}

impl OpenClApi {
    fn load() -> std::result::Result<Self, String> {
        let lib = LIBRARY_NAMES
            .iter()
            .find_map(|name| unsafe { Library::new(name) }.ok())
            .ok_or_else(|| format!("OpenCL library not found (tried {})", LIBRARY_NAMES.join(", ")))?;

        log::debug!("loaded OpenCL library");

        unsafe {
            Ok(Self {
                get_platform_ids: symbol(&lib, b"clGetPlatformIDs\0")?,
                get_platform_info: symbol(&lib, b"clGetPlatformInfo\0")?,
                get_device_ids: symbol(&lib, b"clGetDeviceIDs\0")?,
                get_device_info: symbol(&lib, b"clGetDeviceInfo\0")?,
                create_context: symbol(&lib, b"clCreateContext\0")?,
                create_command_queue: symbol(&lib, b"clCreateCommandQueue\0")?,
                create_program_with_source: symbol(&lib, b"clCreateProgramWithSource\0")?,
                build_program: symbol(&lib, b"clBuildProgram\0")?,
                get_program_build_info: symbol(&lib, b"clGetProgramBuildInfo\0")?,
                create_kernel: symbol(&lib, b"clCreateKernel\0")?,
                set_kernel_arg: symbol(&lib, b"clSetKernelArg\0")?,
                create_buffer: symbol(&lib, b"clCreateBuffer\0")?,
                enqueue_nd_range_kernel: symbol(&lib, b"clEnqueueNDRangeKernel\0")?,
                enqueue_read_buffer: symbol(&lib, b"clEnqueueReadBuffer\0")?,
                wait_for_events: symbol(&lib, b"clWaitForEvents\0")?,
                release_event: symbol(&lib, b"clReleaseEvent\0")?,
                release_mem_object: symbol(&lib, b"clReleaseMemObject\0")?,
                release_kernel: symbol(&lib, b"clReleaseKernel\0")?,
                release_program: symbol(&lib, b"clReleaseProgram\0")?,
                release_command_queue: symbol(&lib, b"clReleaseCommandQueue\0")?,
                release_context: symbol(&lib, b"clReleaseContext\0")?,
                _lib: lib,
            })
        }
    }
}

/// Разрешает символ `name` (с завершающим нулём) как указатель на функцию
unsafe fn symbol<T: Copy>(lib: &Library, name: &[u8]) -> std::result::Result<T, String> {
    lib.get::<T>(name).map(|sym| *sym).map_err(|e| {
        let printable = String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name));
        format!("missing OpenCL symbol {}: {}", printable, e)
    })
}
