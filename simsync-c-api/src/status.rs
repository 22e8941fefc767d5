use std::panic::UnwindSafe;
use std::cell::RefCell;
use std::os::raw::c_char;
use std::ffi::CString;

use simsync::Error;

// Save the last error message in thread local storage.
//
// This is marginally better than a standard global static value because it
// allow multiple threads to each have separate errors conditions.
thread_local! {
    pub static LAST_ERROR_MESSAGE: RefCell<CString> = RefCell::new(CString::new("").expect("invalid C string"));
}

/// Status type returned by all functions in the C API.
///
/// The value 0 (`SIMSYNC_SUCCESS`) is used to indicate successful operations.
/// Positive non-zero values are reserved for internal use in simsync.
#[repr(transparent)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct simsync_status_t(i32);

impl simsync_status_t {
    pub fn is_success(self) -> bool {
        self.0 == SIMSYNC_SUCCESS
    }

    pub fn as_i32(self) -> i32 {
        self.0
    }
}

/// Status code used when a function succeeded
pub const SIMSYNC_SUCCESS: i32 = 0;
/// Status code used when a function got an invalid parameter
pub const SIMSYNC_INVALID_PARAMETER_ERROR: i32 = 1;
/// Status code used when there was an error reading or writing JSON
pub const SIMSYNC_JSON_ERROR: i32 = 2;
/// Status code used when a string contains non-utf8 data
pub const SIMSYNC_UTF8_ERROR: i32 = 3;
/// Status code used when the simulation engine could not be started
pub const SIMSYNC_ENGINE_INIT_ERROR: i32 = 4;
/// Status code used for errors coming from the simulation engine, or from
/// reading input files
pub const SIMSYNC_ENGINE_ERROR: i32 = 5;
/// Status code used when a memory buffer is too small to fit the requested data
pub const SIMSYNC_BUFFER_SIZE_ERROR: i32 = 254;
/// Status code used when there was an internal error, i.e. there is a bug
/// inside simsync
pub const SIMSYNC_INTERNAL_ERROR: i32 = 255;

impl From<Error> for simsync_status_t {
    #[allow(clippy::match_same_arms)]
    fn from(error: Error) -> simsync_status_t {
        LAST_ERROR_MESSAGE.with(|message| {
            *message.borrow_mut() = CString::new(format!("{}", error)).expect("error message contains a null byte");
        });
        match error {
            Error::InvalidParameter(_) => simsync_status_t(SIMSYNC_INVALID_PARAMETER_ERROR),
            Error::Json(_) => simsync_status_t(SIMSYNC_JSON_ERROR),
            Error::Utf8(_) => simsync_status_t(SIMSYNC_UTF8_ERROR),
            Error::EngineInit(_) => simsync_status_t(SIMSYNC_ENGINE_INIT_ERROR),
            Error::Engine(_) | Error::Io(_) => simsync_status_t(SIMSYNC_ENGINE_ERROR),
            Error::BufferSize(_) => simsync_status_t(SIMSYNC_BUFFER_SIZE_ERROR),
            Error::Internal(_) => simsync_status_t(SIMSYNC_INTERNAL_ERROR),
            _ => simsync_status_t(SIMSYNC_INTERNAL_ERROR),
        }
    }
}

/// An alternative to `std::panic::catch_unwind` that automatically transform
/// the error into `simsync_status_t`.
pub fn catch_unwind<F>(function: F) -> simsync_status_t where F: FnOnce() -> Result<(), Error> + UnwindSafe {
    match std::panic::catch_unwind(function) {
        Ok(Ok(())) => simsync_status_t(SIMSYNC_SUCCESS),
        Ok(Err(error)) => error.into(),
        Err(error) => Error::from(error).into()
    }
}

/// Check that pointers (used as C API function parameters) are not null.
#[macro_export]
macro_rules! check_pointers {
    ($pointer: ident) => {
        if $pointer.is_null() {
            return Err(simsync::Error::InvalidParameter(
                format!("got invalid NULL pointer for {}", stringify!($pointer))
            ));
        }
    };
    ($($pointer: ident),* $(,)?) => {
        $(check_pointers!($pointer);)*
    }
}

/// Get the last error message that was created on the current thread.
///
/// @returns the last error message, as a NULL-terminated string
#[no_mangle]
pub extern fn simsync_last_error() -> *const c_char {
    let mut result = std::ptr::null();
    let wrapper = std::panic::AssertUnwindSafe(&mut result);
    let status = catch_unwind(move || {
        let _ = &wrapper;
        LAST_ERROR_MESSAGE.with(|message| {
            *wrapper.0 = message.borrow().as_ptr();
        });
        Ok(())
    });

    if !status.is_success() {
        eprintln!("ERROR: unable to get last error message!");
        return std::ptr::null();
    }

    return result;
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use super::*;

    #[test]
    fn error_codes() {
        let status = simsync_status_t::from(Error::Engine("unknown command 'foo'".into()));
        assert_eq!(status.as_i32(), SIMSYNC_ENGINE_ERROR);

        let message = unsafe { CStr::from_ptr(simsync_last_error()) };
        assert_eq!(message.to_str().unwrap(), "simulation engine error: unknown command 'foo'");

        let status = simsync_status_t::from(Error::EngineInit("nope".into()));
        assert_eq!(status.as_i32(), SIMSYNC_ENGINE_INIT_ERROR);
        let status = simsync_status_t::from(Error::BufferSize("too small".into()));
        assert_eq!(status.as_i32(), SIMSYNC_BUFFER_SIZE_ERROR);
    }

    #[test]
    fn panics() {
        let status = catch_unwind(|| panic!("this is a test"));
        assert_eq!(status.as_i32(), SIMSYNC_INTERNAL_ERROR);

        let message = unsafe { CStr::from_ptr(simsync_last_error()) };
        assert_eq!(message.to_str().unwrap(), "internal simsync error: this is a test");

        assert!(catch_unwind(|| Ok(())).is_success());
    }
}
