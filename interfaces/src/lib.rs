pub mod defs;
pub mod schema;

pub use defs::{
    Candidate, ClarificationRequest, ClarificationResult, Confidence, EncodedImage, IdentificationRequest,
    IdentificationResult, ImageMediaType,
};
pub use schema::{ContractError, decode_clarification, decode_identification};

// Object style note:
// Types here are plain data with checked constructors. Anything that talks to
// a model, touches the filesystem or needs a runtime lives in
// `landmark-identifier`. This crate stays synchronous.
