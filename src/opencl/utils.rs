//! Вспомогательные функции для OpenCL

use super::types::{cl_int, CL_SUCCESS};
use crate::error::{Error, Result};
use std::ffi::CString;
use std::panic::Location;

/// Проверяет код возврата вызова OpenCL.
///
/// Любой код, кроме `CL_SUCCESS`, превращается в `Error::BackendCall`
/// с именем вызова и местом в исходниках, откуда была вызвана проверка.
#[track_caller]
pub fn check(code: cl_int, call: &'static str) -> Result<()> {
    if code == CL_SUCCESS {
        return Ok(());
    }
    let caller = Location::caller();
    Err(Error::BackendCall {
        call,
        code,
        location: format!("{}:{}", caller.file(), caller.line()),
    })
}

/// Преобразует строку в null-terminated строку для C
pub fn c_string(s: &str) -> Result<CString> {
    CString::new(s).map_err(|_| Error::InvalidInput(format!("interior NUL byte in {:?}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes_through() {
        assert!(check(CL_SUCCESS, "clFinish").is_ok());
    }

    #[test]
    fn failure_carries_code_and_call_site() {
        let line = line!() + 1;
        let err = check(-5, "clEnqueueReadBuffer").unwrap_err();
        match err {
            Error::BackendCall { call, code, location } => {
                assert_eq!(call, "clEnqueueReadBuffer");
                assert_eq!(code, -5);
                assert!(location.ends_with(&format!("utils.rs:{}", line)), "{}", location);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn c_string_rejects_interior_nul() {
        assert_eq!(c_string("with_tiles").unwrap().as_bytes(), b"with_tiles");
        assert!(matches!(c_string("a\0b"), Err(Error::InvalidInput(_))));
    }
}
