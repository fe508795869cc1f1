mod remote_error;
mod sdk_error;

pub use remote_error::{RemoteError, INVALID_CREDENTIALS};
pub use sdk_error::{SdkError, SdkErrorKind};
