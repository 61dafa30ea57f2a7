//! Object ACL inspection and repair against S3.
use rusoto_core::RusotoError;
use rusoto_s3::*;

use crate::types::{self, UtilError, UtilResult};

/// Canned ACL granting the bucket owner full control of an object.
pub const BUCKET_OWNER_FULL_CONTROL: &str = "bucket-owner-full-control";

/// Outcome of inspecting the ACL of an object.
#[derive(Clone, Debug, PartialEq)]
pub enum AccessDecision {
    /// This account owns, or is granted access to, the object.
    Authorized,
    /// This account cannot read the ACL, so it needs updating.
    Denied,
    /// The object was removed before it could be inspected.
    ObjectGone,
    /// Anything else; the detail is passed on to the alert.
    Unexpected(String),
}

/// Outcome of granting the bucket owner full control.
#[derive(Clone, Debug, PartialEq)]
pub enum GrantResult {
    Granted,
    ObjectGone,
    Failed(String),
}

/// Resolves the canonical identifier of the account owning `s3`.
pub async fn canonical_id(s3: &S3Client) -> UtilResult<String> {
    s3.list_buckets()
        .await?
        .owner
        .and_then(|owner| owner.id)
        .ok_or_else(|| "Unable to resolve the canonical id of this account".into())
}

/// Inspects the ACL of an object and decides whether access is in place.
pub async fn inspect(
    s3: &S3Client,
    canonical_id: &str,
    bucket: &str,
    key: &str,
) -> AccessDecision {
    // create the request to read back the object ACL
    let request = GetObjectAclRequest {
        bucket: bucket.to_string(),
        key: key.to_string(),
        ..GetObjectAclRequest::default()
    };

    match s3.get_object_acl(request).await {
        Ok(acl) if is_authorized(&acl, canonical_id) => AccessDecision::Authorized,
        Ok(acl) => AccessDecision::Unexpected(format!(
            "Object ACL grants no access to canonical id {} (owner is {})",
            canonical_id,
            acl.owner
                .and_then(|owner| owner.id)
                .unwrap_or_else(|| "unknown".into())
        )),
        Err(RusotoError::Service(GetObjectAclError::NoSuchKey(_))) => AccessDecision::ObjectGone,
        Err(err) => classify(&err).unwrap_or_else(|| {
            AccessDecision::Unexpected(UtilError::from(err).to_string())
        }),
    }
}

/// Re-applies the object ACL to grant the bucket owner full control.
///
/// The provided client is expected to act as the object owner, as nobody
/// else is able to rewrite the ACL.
pub async fn grant_owner_full_control(s3: &S3Client, bucket: &str, key: &str) -> GrantResult {
    // create the request to overwrite the ACL with the canned policy
    let request = PutObjectAclRequest {
        bucket: bucket.to_string(),
        key: key.to_string(),
        acl: Some(BUCKET_OWNER_FULL_CONTROL.to_string()),
        ..PutObjectAclRequest::default()
    };

    match s3.put_object_acl(request).await {
        Ok(_) => GrantResult::Granted,
        Err(RusotoError::Service(PutObjectAclError::NoSuchKey(_))) => GrantResult::ObjectGone,
        Err(err) => match classify(&err) {
            Some(AccessDecision::ObjectGone) => GrantResult::ObjectGone,
            _ => GrantResult::Failed(UtilError::from(err).to_string()),
        },
    }
}

/// Determines whether an ACL names `canonical_id` as owner or any grantee.
pub fn is_authorized(acl: &GetObjectAclOutput, canonical_id: &str) -> bool {
    let owner = acl.owner.as_ref().and_then(|owner| owner.id.as_deref());

    if owner == Some(canonical_id) {
        return true;
    }

    acl.grants
        .iter()
        .flatten()
        .filter_map(|grant| grant.grantee.as_ref())
        .filter_map(|grantee| grantee.id.as_deref())
        .any(|id| id == canonical_id)
}

/// Maps the expected S3 failures of an ACL call to a decision.
///
/// S3 only models `NoSuchKey` for these calls, so `AccessDenied` has to
/// be read from the raw error body (or the status, for bodiless errors).
fn classify<E>(err: &RusotoError<E>) -> Option<AccessDecision> {
    let code = types::error_code(err);
    let status = types::error_status(err);

    match (code.as_deref(), status) {
        (Some("AccessDenied"), _) | (None, Some(403)) => Some(AccessDecision::Denied),
        (Some("NoSuchKey"), _) | (None, Some(404)) => Some(AccessDecision::ObjectGone),
        _ => None,
    }
}
