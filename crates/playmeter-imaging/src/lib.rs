//! Image-edit collaborator for playmeterd
//!
//! The service never inspects image bytes. It validates the request shape,
//! hands the image and the operator's instruction to an [`ImageEditor`], and
//! relays the returned image or a failure.

mod codec;
mod gemini;
mod mock;
mod traits;

pub use codec::*;
pub use gemini::*;
pub use mock::*;
pub use traits::*;
