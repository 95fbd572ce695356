// Error kinds surfaced by the resource manager
//
// Backend: the driver returned a non-success code (or a null handle).
// Unsupported: a requested capability was not in the enumerated set.

use ash::prelude::VkResult;
use ash::vk;
use thiserror::Error;

use crate::Logger;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{op} failed: {result}")]
    Backend { op: &'static str, result: vk::Result },
    #[error("{what} `{name}` is not supported")]
    Unsupported { what: &'static str, name: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn unsupported(what: &'static str, name: impl Into<String>) -> Self {
        Error::Unsupported {
            what,
            name: name.into(),
        }
    }

    /// The backend result code, if this came from a driver call
    pub fn vk_result(&self) -> Option<vk::Result> {
        match self {
            Error::Backend { result, .. } => Some(*result),
            Error::Unsupported { .. } => None,
        }
    }

    pub fn is_out_of_date(&self) -> bool {
        self.vk_result() == Some(vk::Result::ERROR_OUT_OF_DATE_KHR)
    }
}

/// Log a driver failure once and turn it into an `Error::Backend`
pub(crate) fn check<T>(logger: &Logger, op: &'static str, result: VkResult<T>) -> Result<T> {
    result.map_err(|result| {
        log_error!(logger, "{} failed: {:?}", op, result);
        Error::Backend { op, result }
    })
}

/// Log and build an `Error::Unsupported`
pub(crate) fn unsupported(logger: &Logger, what: &'static str, name: impl Into<String>) -> Error {
    let name = name.into();
    log_error!(logger, "{} {} is not supported", what, name);
    Error::Unsupported { what, name }
}

/// A successful call that still produced a null handle counts as a failure
pub(crate) fn non_null<H: vk::Handle + Copy>(logger: &Logger, op: &'static str, handle: H) -> Result<H> {
    if handle.as_raw() == 0 {
        log_error!(logger, "{} returned a null handle", op);
        return Err(Error::Backend {
            op,
            result: vk::Result::ERROR_INITIALIZATION_FAILED,
        });
    }
    Ok(handle)
}
