use std::ffi::CString;
use std::sync::Mutex;

use log::{Record, Metadata};
use once_cell::sync::Lazy;

use super::status::{simsync_status_t, catch_unwind};

/// The "error" level designates very serious errors
pub const SIMSYNC_LOG_LEVEL_ERROR: i32 = 1;

/// The "warn" level designates hazardous situations, such as an engine which
/// could not be started
pub const SIMSYNC_LOG_LEVEL_WARN: i32 = 2;

/// The "info" level designates useful information, such as engines being
/// opened and closed
pub const SIMSYNC_LOG_LEVEL_INFO: i32 = 3;

/// The "debug" level designates lower priority information
///
/// By default, log messages at this level are disabled in release mode, and
/// enabled in debug mode.
pub const SIMSYNC_LOG_LEVEL_DEBUG: i32 = 4;

/// The "trace" level designates very low priority, often extremely verbose,
/// information.
pub const SIMSYNC_LOG_LEVEL_TRACE: i32 = 5;

/// Callback function type for simsync logging system. Such functions are
/// called when a log event is emitted in the code.
///
/// The first argument is the log level, one of `SIMSYNC_LOG_LEVEL_ERROR`,
/// `SIMSYNC_LOG_LEVEL_WARN` `SIMSYNC_LOG_LEVEL_INFO`, `SIMSYNC_LOG_LEVEL_DEBUG`,
/// or `SIMSYNC_LOG_LEVEL_TRACE`. The second argument is a NULL-terminated string
/// containing the message associated with the log event.
#[allow(non_camel_case_types)]
pub type simsync_logging_callback_t = Option<unsafe extern fn(level: i32, message: *const std::os::raw::c_char)>;

static GLOBAL_CALLBACK: Lazy<Mutex<simsync_logging_callback_t>> = Lazy::new(|| Mutex::new(None));

/// Implementation of `log::Log` that forward all log messages to the global
/// `simsync_logging_callback_t`.
struct SimsyncLogger;

/// Set the given ``callback`` function as the global logging callback. This
/// function will be called on all log events. If a logging callback was already
/// set, it is replaced by the new one.
///
/// Passing `NULL` as the callback disables logging.
#[no_mangle]
pub unsafe extern fn simsync_set_logging_callback(callback: simsync_logging_callback_t) -> simsync_status_t {
    catch_unwind(|| {
        *GLOBAL_CALLBACK.lock().expect("mutex was poisoned") = callback;
        // we allow multiple sets of logger, therefore the result will be ignored
        let _ = log::set_boxed_logger(Box::new(SimsyncLogger));

        if callback.is_none() {
            log::set_max_level(log::LevelFilter::Off);
        } else if cfg!(debug_assertions) {
            log::set_max_level(log::LevelFilter::Debug);
        } else {
            log::set_max_level(log::LevelFilter::Info);
        }

        Ok(())
    })
}

impl log::Log for SimsyncLogger {
    fn enabled(&self, _: &Metadata) -> bool {
       return true;
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("{} -- {}", record.target(), record.args());
            // interior NULL bytes can not be sent to C
            let message = message.replace('\0', "\\0");
            let message_cstr = CString::new(message).expect("NULL bytes were removed");

            let callback = *GLOBAL_CALLBACK.lock().expect("mutex was poisoned");
            if let Some(callback) = callback {
                unsafe {
                    callback(record.level() as i32, message_cstr.as_ptr());
                }
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_levels() {
        assert_eq!(SIMSYNC_LOG_LEVEL_ERROR, log::Level::Error as i32);
        assert_eq!(SIMSYNC_LOG_LEVEL_WARN, log::Level::Warn as i32);
        assert_eq!(SIMSYNC_LOG_LEVEL_INFO, log::Level::Info as i32);
        assert_eq!(SIMSYNC_LOG_LEVEL_DEBUG, log::Level::Debug as i32);
        assert_eq!(SIMSYNC_LOG_LEVEL_TRACE, log::Level::Trace as i32);
    }
}
