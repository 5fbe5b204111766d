//! Object storage upload

mod s3;
mod sigv4;

pub use s3::{public_url, S3Client};
