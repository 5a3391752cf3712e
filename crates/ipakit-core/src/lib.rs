//! ipakit-core – ZIP → IPA conversion pipeline.
//!
//! The pipeline runs leaf first:
//!
//! 1. [`storage::Storage`] streams an upload into a request-scoped
//!    [`scratch::ScratchSpace`].
//! 2. [`validate::Validator`] checks the declared type and the ZIP signature.
//! 3. A [`transform::Transformer`] writes the `.ipa` next to the input.
//! 4. [`stream::ArtifactStream`] delivers the artifact and takes the scratch
//!    space with it, so every temp file is gone once the body is finished.
//!
//! [`inspect`] lists archive contents and flags Xcode project files.

pub mod error;
pub mod inspect;
pub mod job;
pub mod pipeline;
pub mod scratch;
pub mod storage;
pub mod stream;
pub mod transform;
pub mod upload;
pub mod validate;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::ConvertError;
pub use inspect::{Inspection, XcodeDetection};
pub use job::{ConversionJob, JobStatus};
pub use pipeline::{ConvertedArtifact, Pipeline};
pub use scratch::ScratchSpace;
pub use storage::Storage;
pub use stream::ArtifactStream;
pub use transform::{TransformKind, Transformer};
pub use upload::UploadRequest;
pub use validate::Validator;
