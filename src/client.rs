//! Construction of the AWS clients used across the crate.
//!
//! Credentials must be provided via guidelines in the [AWS Documentation]
//! (https://docs.aws.amazon.com/cli/latest/userguide/cli-environment.html);
//! inside Lambda they're picked up from the execution role.
use rusoto_core::{credential::ChainProvider, region::Region, HttpClient};
use rusoto_s3::S3Client;
use rusoto_ssm::SsmClient;
use rusoto_sts::StsClient;

use std::time::Duration;

use crate::types::UtilResult;

/// Creates a credential chain with a short timeout.
fn chain() -> ChainProvider {
    let mut chain = ChainProvider::new();
    chain.set_timeout(Duration::from_millis(500));
    chain
}

/// Creates a new S3 client for `region`.
pub fn s3(region: Region) -> UtilResult<S3Client> {
    Ok(S3Client::new_with(HttpClient::new()?, chain(), region))
}

/// Creates a new STS client for `region`.
pub fn sts(region: Region) -> UtilResult<StsClient> {
    Ok(StsClient::new_with(HttpClient::new()?, chain(), region))
}

/// Creates a new SSM client for `region`.
pub fn ssm(region: Region) -> UtilResult<SsmClient> {
    Ok(SsmClient::new_with(HttpClient::new()?, chain(), region))
}
