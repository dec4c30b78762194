//! Generation validation, corrective retry and render polling.
//!
//! The three first-party pieces of the system live here:
//! - [`validator`]: checks a raw generation payload against the structural
//!   contract and produces corrective descriptions on mismatch
//! - [`generate`]: wraps a generation backend with validation and a bounded
//!   corrective retry loop
//! - [`poll`]: drives render jobs to a terminal state, forwarding each
//!   observed transition to a persistence sink exactly once
//!
//! [`run`] wires them to the LLM, video and record-store clients.

pub mod error;
pub mod generate;
pub mod poll;
pub mod run;
pub mod validator;

pub use error::{GenerationError, PipelineError, PollError, ServiceError};
pub use generate::{
    generate_set_with_retry, generate_single_with_retry, generate_with_retry, GenerationBackend,
    DEFAULT_GENERATION_ATTEMPTS,
};
pub use poll::{poll_until_done, JobOutcome, JobUpdate, PollConfig, PollSummary, StatusSource, UpdateSink};
pub use run::{CreativePipeline, PipelineConfig, RegenerationRequest, SetRunReport};
pub use validator::{
    validate, validate_set, validate_single, ValidatedPayload, ValidatedSet, ValidationError,
    ValidationErrorKind, ValidationMode,
};
