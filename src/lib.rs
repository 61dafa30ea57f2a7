//! Operational tooling around Amazon S3.
//!
//! Two tools live in this crate, sharing little more than their plumbing:
//!
//! * `s3-fetch`, a CLI to locate a file in a bucket by prefix and save it
//!   into the working directory.
//! * `s3-acl-reconciler`, a Lambda handler which repairs the ACL of objects
//!   uploaded from another account, so that this account can use them.
//!
//! Credentials must be provided via guidelines in the [AWS Documentation]
//! (https://docs.aws.amazon.com/cli/latest/userguide/cli-environment.html).
#[macro_use]
extern crate log as logger;

pub mod cli;
pub mod client;
pub mod log;
pub mod types;

pub mod fetch;
pub mod reconcile;
