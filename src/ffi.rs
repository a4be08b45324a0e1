//! DLL exports and the cross-module allocation contract.
//!
//! The launcher marshals the out-parameter as `LPWStr`, so the buffer must come from the COM
//! task allocator: the caller frees it with `CoTaskMemFree` (or `FreeWUToken`).

use std::ptr;

use tracing::error;

use crate::encoding::to_wide_nul;
use crate::error::{PlatformError, TokenError, E_OUTOFMEMORY, E_POINTER};
use crate::secret::SecretString;

/// Allocator for buffers whose ownership passes to the caller.
pub trait OutAllocator {
    /// Allocate room for `len` UTF-16 units. Returns null when out of memory.
    fn alloc(&self, len: usize) -> *mut u16;

    /// Release a buffer returned by `alloc`.
    ///
    /// # Safety
    ///
    /// `buf` must be null or come from `alloc` on the same allocator, and must not be used
    /// afterwards.
    unsafe fn free(&self, buf: *mut u16, len: usize);
}

/// Copy `token` plus a null terminator into a fresh buffer and store it in `out`.
///
/// On error nothing is allocated and `out` is left untouched.
///
/// # Safety
///
/// `out` must be null or valid for a single pointer write.
pub unsafe fn write_token_out<A: OutAllocator>(
    allocator: &A,
    token: &SecretString,
    out: *mut *mut u16,
) -> Result<(), TokenError> {
    if out.is_null() {
        return Err(PlatformError::new(E_POINTER, "Output pointer is null").into());
    }

    let wide = to_wide_nul(token.as_str());
    let buf = allocator.alloc(wide.len());
    if buf.is_null() {
        return Err(PlatformError::new(E_OUTOFMEMORY, "Failed to allocate token buffer").into());
    }

    // SAFETY: `buf` holds `wide.len()` units and does not overlap `wide`.
    unsafe {
        ptr::copy_nonoverlapping(wide.as_ptr(), buf, wide.len());
        *out = buf;
    }
    Ok(())
}

#[cfg(windows)]
#[allow(non_snake_case)]
mod exports {
    use std::ffi::c_void;
    use std::panic::{self, AssertUnwindSafe};

    use tracing::error;
    use windows::Win32::System::Com::{CoTaskMemAlloc, CoTaskMemFree};

    use super::{write_token_out, OutAllocator};
    use crate::config::Config;
    use crate::error::{TokenError, E_UNEXPECTED, S_OK};
    use crate::{fetch_windows_update_token, logging};

    /// The COM task allocator, shared by every module in the process.
    pub struct CoTaskMem;

    impl OutAllocator for CoTaskMem {
        fn alloc(&self, len: usize) -> *mut u16 {
            let Some(bytes) = len.checked_mul(std::mem::size_of::<u16>()) else {
                return std::ptr::null_mut();
            };
            // SAFETY: plain allocation, no preconditions.
            unsafe { CoTaskMemAlloc(bytes) as *mut u16 }
        }

        unsafe fn free(&self, buf: *mut u16, _len: usize) {
            // SAFETY: caller guarantees `buf` came from `CoTaskMemAlloc`.
            unsafe { CoTaskMemFree(Some(buf as *const c_void)) }
        }
    }

    fn get_token_into(ret_token: *mut *mut u16) -> Result<(), TokenError> {
        let config =
            Config::embedded_validated().map_err(|e| TokenError::Config(format!("{:#}", e)))?;
        logging::init(&config.logging.level);

        let token = fetch_windows_update_token(&config)?;

        // SAFETY: pointer validity is the caller's contract on `GetWUToken`.
        unsafe { write_token_out(&CoTaskMem, &token, ret_token) }
    }

    /// Fetch the Windows Update token for the first signed-in Microsoft account.
    ///
    /// Returns `S_OK` and stores a `CoTaskMemAlloc`-ed, null-terminated UTF-16 string in
    /// `ret_token`, or returns an error status and leaves `ret_token` untouched.
    ///
    /// # Safety
    ///
    /// `ret_token` must be null or valid for a single pointer write.
    #[no_mangle]
    pub unsafe extern "system" fn GetWUToken(ret_token: *mut *mut u16) -> i32 {
        match panic::catch_unwind(AssertUnwindSafe(|| get_token_into(ret_token))) {
            Ok(Ok(())) => S_OK,
            Ok(Err(e)) => super::report(&e),
            Err(_) => {
                error!("Panic while fetching token");
                E_UNEXPECTED
            }
        }
    }

    /// Release a string returned by `GetWUToken`. Null is ignored.
    ///
    /// # Safety
    ///
    /// `token` must be null or a pointer returned by `GetWUToken` that has not been freed.
    #[no_mangle]
    pub unsafe extern "system" fn FreeWUToken(token: *mut u16) {
        if !token.is_null() {
            // SAFETY: forwarded from the caller's contract.
            unsafe { CoTaskMem.free(token, 0) }
        }
    }
}

#[cfg(windows)]
pub use exports::{CoTaskMem, FreeWUToken, GetWUToken};

/// Log a failure and return its boundary status code.
#[cfg_attr(not(windows), allow(dead_code))]
fn report(err: &TokenError) -> i32 {
    let code = err.status_code();
    error!("GetWUToken failed: {} (0x{:08X})", err, code);
    code
}
