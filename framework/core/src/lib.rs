mod error;
mod shutdown;

pub mod prelude {
    pub use crate::error::HarnessError;
    pub use crate::shutdown::{DelegatedShutdownListener, ShutdownHandle, ShutdownSignalError};
}
