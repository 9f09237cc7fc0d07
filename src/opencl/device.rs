//! Выбор OpenCL-устройства
//!
//! Политика по умолчанию: первая платформа, первое устройство любого типа.

use super::bindings::{api, OpenClApi};
use super::types::*;
use super::utils::check;
use crate::error::{Error, Result};
use crate::matrix::TILE_SIDE;
use std::ffi::c_void;
use std::ptr;

/// Выбранное устройство вместе с его платформой
#[derive(Debug, Clone, Copy)]
pub struct Device {
    platform: cl_platform_id,
    id: cl_device_id,
}

// Идентификаторы платформ и устройств OpenCL потокобезопасны
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

impl Device {
    /// Выбирает устройство `device_index` на платформе `platform_index`
    pub fn choose(platform_index: usize, device_index: usize) -> Result<Self> {
        let api = api()?;

        let platforms = list_platforms(api)?;
        let platform = *platforms.get(platform_index).ok_or_else(|| {
            Error::BackendInit(format!(
                "platform #{} not found ({} available)",
                platform_index,
                platforms.len()
            ))
        })?;

        let devices = list_devices(api, platform)?;
        let id = *devices.get(device_index).ok_or_else(|| {
            Error::BackendInit(format!(
                "device #{} not found on platform #{} ({} available)",
                device_index,
                platform_index,
                devices.len()
            ))
        })?;

        let device = Self { platform, id };

        let limit = device.max_work_group_size().map_err(into_init)?;
        if limit < TILE_SIDE * TILE_SIDE {
            return Err(Error::BackendInit(format!(
                "device work-group limit {} is below the {}x{} tile",
                limit, TILE_SIDE, TILE_SIDE
            )));
        }

        log::debug!(
            "selected OpenCL device {:?} on platform {:?} (max work-group size {})",
            device.name().unwrap_or_default(),
            device.platform_name().unwrap_or_default(),
            limit
        );

        Ok(device)
    }

    pub(crate) fn id(&self) -> cl_device_id {
        self.id
    }

    /// Имя устройства
    pub fn name(&self) -> Result<String> {
        let api = api()?;
        query_string(
            |size, value, size_ret| unsafe {
                (api.get_device_info)(self.id, CL_DEVICE_NAME, size, value, size_ret)
            },
            "clGetDeviceInfo",
        )
    }

    /// Имя платформы устройства
    pub fn platform_name(&self) -> Result<String> {
        let api = api()?;
        query_string(
            |size, value, size_ret| unsafe {
                (api.get_platform_info)(self.platform, CL_PLATFORM_NAME, size, value, size_ret)
            },
            "clGetPlatformInfo",
        )
    }

    /// Максимальный размер рабочей группы
    pub fn max_work_group_size(&self) -> Result<usize> {
        let api = api()?;
        let mut value = 0usize;
        check(
            unsafe {
                (api.get_device_info)(
                    self.id,
                    CL_DEVICE_MAX_WORK_GROUP_SIZE,
                    std::mem::size_of::<usize>(),
                    &mut value as *mut usize as *mut c_void,
                    ptr::null_mut(),
                )
            },
            "clGetDeviceInfo",
        )?;
        Ok(value)
    }
}

fn list_platforms(api: &OpenClApi) -> Result<Vec<cl_platform_id>> {
    let mut count: cl_uint = 0;
    let code = unsafe { (api.get_platform_ids)(0, ptr::null_mut(), &mut count) };
    if code == CL_PLATFORM_NOT_FOUND_KHR || (code == CL_SUCCESS && count == 0) {
        return Err(Error::BackendInit("no OpenCL platform available".into()));
    }
    check(code, "clGetPlatformIDs").map_err(into_init)?;

    let mut platforms = vec![ptr::null_mut(); count as usize];
    check(
        unsafe { (api.get_platform_ids)(count, platforms.as_mut_ptr(), ptr::null_mut()) },
        "clGetPlatformIDs",
    )
    .map_err(into_init)?;
    Ok(platforms)
}

fn list_devices(api: &OpenClApi, platform: cl_platform_id) -> Result<Vec<cl_device_id>> {
    let mut count: cl_uint = 0;
    let code = unsafe {
        (api.get_device_ids)(platform, CL_DEVICE_TYPE_ALL, 0, ptr::null_mut(), &mut count)
    };
    if code == CL_DEVICE_NOT_FOUND || (code == CL_SUCCESS && count == 0) {
        return Err(Error::BackendInit("no OpenCL device on the platform".into()));
    }
    check(code, "clGetDeviceIDs").map_err(into_init)?;

    let mut devices = vec![ptr::null_mut(); count as usize];
    check(
        unsafe {
            (api.get_device_ids)(
                platform,
                CL_DEVICE_TYPE_ALL,
                count,
                devices.as_mut_ptr(),
                ptr::null_mut(),
            )
        },
        "clGetDeviceIDs",
    )
    .map_err(into_init)?;
    Ok(devices)
}

/// Двухшаговый запрос строкового параметра: сначала размер, затем значение
pub(crate) fn query_string<F>(query: F, call: &'static str) -> Result<String>
where
    F: Fn(usize, *mut c_void, *mut usize) -> cl_int,
{
    let mut size = 0usize;
    check(query(0, ptr::null_mut(), &mut size), call)?;

    let mut bytes = vec![0u8; size];
    check(query(size, bytes.as_mut_ptr() as *mut c_void, ptr::null_mut()), call)?;

    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// Ошибки перечисления означают, что бэкенд непригоден
fn into_init(err: Error) -> Error {
    match err {
        Error::BackendInit(_) => err,
        other => Error::BackendInit(other.to_string()),
    }
}
