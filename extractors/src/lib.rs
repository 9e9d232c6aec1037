//! Extractors Crate
//!
//! This crate provides the extraction implementations that turn free-form
//! message text into structured records.
//!
//! # Architecture
//!
//! - **Types**: Result types and the `Extractor` trait live in the `shared-types` crate
//! - **Implementations**: Concrete extractors are implemented in this crate
//!
//! # Available Extractors
//!
//! - `EmailInfoExtractor`: Pulls sender, subject, event details, attendees and priority
//!   out of email, OCR or transcript text
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::EmailInfoExtractor;
//! use shared_types::{Extractor, InputRecord};
//!
//! let extractor = EmailInfoExtractor::new();
//! let result = extractor.extract(&InputRecord::text("Meeting tomorrow at 3pm"));
//! ```

pub mod email_info;

// Re-export commonly used types
pub use email_info::{
    validate_pattern_spec, EmailInfoExtractor, ExtractorConfig, KeywordSets, PatternOverrides,
    PatternSpec,
};

// Re-export the Extractor trait from shared-types for convenience
pub use shared_types::Extractor;
