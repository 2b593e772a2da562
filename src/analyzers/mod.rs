//! Survey scoring and aggregation.
//!
//! This module turns raw response codes into pass/fail competency flags,
//! rolls them up by gender, age, grade and school, and assembles the
//! per-view summaries the dashboard renders. Results can be published as
//! JSON to S3.

pub mod aggregate;
pub mod analyzer;
pub mod numeracy;
pub mod overview;
pub mod publish;
pub mod reading;
pub mod responses;
pub mod types;
pub mod utility;
