//! Chromium backend for the orchestration core, speaking the DevTools
//! protocol through `chromiumoxide`. The core only sees this crate through
//! the `Driver`, `BrowserHandle` and `PageHandle` traits, so everything
//! protocol-shaped stays on this side of the boundary.

mod driver;
mod locator;
mod page;

pub use driver::CdpDriver;

use pagehand_core::CoreError;

pub(crate) fn cdp_err(err: chromiumoxide::error::CdpError) -> CoreError {
    CoreError::Driver(err.to_string())
}
