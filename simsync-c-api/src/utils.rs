use std::os::raw::c_char;

use simsync::Error;

/// Copy the `string` to the C `buffer` of size `bufflen`, including a
/// terminating NULL byte.
pub unsafe fn copy_str_to_c(string: &str, buffer: *mut c_char, bufflen: usize) -> Result<(), Error> {
    check_pointers!(buffer);

    if string.len() >= bufflen {
        return Err(Error::BufferSize(format!(
            "string of length {} does not fit in a buffer of size {}", string.len(), bufflen
        )));
    }

    std::ptr::copy(string.as_ptr(), buffer.cast(), string.len());
    // NULL-terminate the string
    buffer.add(string.len()).write(0);

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;
    use super::*;

    #[test]
    fn copy_str() {
        let mut buffer = vec![1 as c_char; 8];
        unsafe {
            copy_str_to_c("hello", buffer.as_mut_ptr(), buffer.len()).unwrap();
            assert_eq!(CStr::from_ptr(buffer.as_ptr()).to_str().unwrap(), "hello");

            let error = copy_str_to_c("too long for this", buffer.as_mut_ptr(), buffer.len()).unwrap_err();
            assert!(matches!(error, Error::BufferSize(_)));

            let error = copy_str_to_c("hello", std::ptr::null_mut(), 8).unwrap_err();
            assert!(matches!(error, Error::InvalidParameter(_)));
        }
    }
}
