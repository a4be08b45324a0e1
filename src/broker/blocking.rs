//! Blocking adapter over WinRT asynchronous operations.
//!
//! Every broker call goes through [`wait`], so a non-blocking host only has to swap this out.

use windows::core::RuntimeType;
use windows::Foundation::IAsyncOperation;

use crate::error::PlatformError;

/// Start an operation and block the calling thread until it completes.
///
/// No timeout or cancellation is applied here; both are left to the broker.
pub fn wait<T>(operation: windows::core::Result<IAsyncOperation<T>>) -> Result<T, PlatformError>
where
    T: RuntimeType + 'static,
{
    Ok(operation?.get()?)
}
