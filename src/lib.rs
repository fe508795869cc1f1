//! Client SDK for the PeakInvestigator mass-spectrometry service.

pub mod actions;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod services;
pub mod utils;

pub use actions::Action;
pub use errors::{RemoteError, SdkError, SdkErrorKind};
pub use managers::saas::PeakInvestigatorSaaS;
