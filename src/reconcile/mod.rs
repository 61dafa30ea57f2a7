//! Repair the ACL of uploaded objects owned by another account.
//!
//! Objects uploaded from another account stay owned by that account, and
//! unless they're uploaded with `bucket-owner-full-control` this account
//! can't even read them. Each upload notification is checked here; when
//! the ACL can't be read, the uploading account's role is assumed and the
//! canned ACL is applied on its behalf.
//!
//! Failures along the way are alerted on, but an invocation never fails
//! back to the Lambda runtime as that would only trigger pointless retries.
use rusoto_core::Region;
use rusoto_s3::S3Client;

use std::time::SystemTime;

use crate::client;
use crate::types::UtilResult;

pub mod acl;
pub mod alert;
pub mod config;
pub mod credentials;
pub mod event;

#[cfg(test)]
mod testing;

pub use self::acl::AccessDecision;
pub use self::alert::{AlertMessage, Delivery, Notifier, SlackNotifier};
pub use self::config::Config;
pub use self::credentials::{AssumedCredentials, CredentialCache, RoleAssumer, StsRoleAssumer};
pub use self::event::{UploadEvent, UploadNotification};

use self::acl::GrantResult;

/// Terminal state of a single reconciliation.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// This account already had access; nothing was changed.
    Authorized,
    /// The ACL was rewritten to grant the bucket owner full control.
    Updated,
    /// The object was deleted before its ACL could be read.
    ObjectGone,
    /// The object was deleted before its ACL could be rewritten.
    ObjectGoneDuringUpdate,
    /// Something unexpected happened, and an alert was sent.
    Failed(String),
}

/// Source of the current time.
pub type Clock = Box<dyn Fn() -> SystemTime + Send + Sync>;

/// Process lifetime context used to reconcile upload notifications.
pub struct Reconciler<A, N> {
    s3: S3Client,
    canonical_id: String,
    credentials: CredentialCache<A>,
    notifier: N,
    clock: Clock,
}

impl Reconciler<StsRoleAssumer, SlackNotifier> {
    /// Wires up a `Reconciler` against AWS, as done on cold start.
    ///
    /// This resolves the webhook URL and the canonical id of the running
    /// account up front; the role itself is only assumed on first use.
    pub async fn from_config(config: &Config) -> UtilResult<Self> {
        let region: Region = config.region.parse()?;

        let s3 = client::s3(region.clone())?;
        let sts = client::sts(region.clone())?;
        let ssm = client::ssm(region)?;

        let hook_url = config::resolve_parameter(&ssm, &config.parameter_name).await?;
        let canonical_id = acl::canonical_id(&s3).await?;

        let assumer = StsRoleAssumer::new(
            sts,
            config.role_arn.clone(),
            config.session_name.clone(),
        );
        let notifier = SlackNotifier::new(
            hook_url,
            config.channel.clone(),
            config.function_name.clone(),
            config.region.clone(),
        );

        Ok(Self::new(
            s3,
            canonical_id,
            CredentialCache::new(assumer),
            notifier,
        ))
    }
}

impl<A, N> Reconciler<A, N>
where
    A: RoleAssumer,
    N: Notifier,
{
    /// Constructs a new `Reconciler` from its parts, using the system clock.
    pub fn new(
        s3: S3Client,
        canonical_id: String,
        credentials: CredentialCache<A>,
        notifier: N,
    ) -> Self {
        Self {
            s3,
            canonical_id,
            credentials,
            notifier,
            clock: Box::new(SystemTime::now),
        }
    }

    /// Replaces the clock used to check credential expiry.
    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Fn() -> SystemTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    /// Reconciles the ACL of an uploaded object.
    pub async fn reconcile(&self, event: &UploadEvent) -> Outcome {
        let (bucket, key) = (&event.bucket, &event.key);

        info!("New upload: {}/{}", bucket, key);

        match acl::inspect(&self.s3, &self.canonical_id, bucket, key).await {
            AccessDecision::Authorized => {
                info!(
                    "S3 object {}/{} has the correct ACL permissions, skipping.",
                    bucket, key
                );
                Outcome::Authorized
            }
            AccessDecision::ObjectGone => {
                info!("Cannot retrieve ACL permissions. Uploaded object no longer exists, exiting");
                Outcome::ObjectGone
            }
            AccessDecision::Denied => {
                info!(
                    "S3 object {}/{} does not have the correct ACL permissions, updating now...",
                    bucket, key
                );
                self.update(event).await
            }
            AccessDecision::Unexpected(detail) => self.fail(event, detail).await,
        }
    }

    /// Grants the bucket owner full control under the assumed role.
    async fn update(&self, event: &UploadEvent) -> Outcome {
        // inspection may have taken a while, so expiry is checked as of now
        let s3 = match self.credentials.client((self.clock)()).await {
            Ok(s3) => s3,
            Err(err) => return self.fail(event, err.to_string()).await,
        };

        match acl::grant_owner_full_control(&s3, &event.bucket, &event.key).await {
            GrantResult::Granted => {
                info!(
                    "S3 object {}/{} has been updated with correct permissions.",
                    event.bucket, event.key
                );
                Outcome::Updated
            }
            GrantResult::ObjectGone => {
                info!("Cannot update ACL. Uploaded object no longer exists, exiting");
                Outcome::ObjectGoneDuringUpdate
            }
            GrantResult::Failed(detail) => self.fail(event, detail).await,
        }
    }

    /// Logs and alerts on an unexpected failure.
    async fn fail(&self, event: &UploadEvent, detail: String) -> Outcome {
        error!("Unexpected error occurred: {}", detail);

        // delivery problems are logged by the notifier, nothing else to do
        self.notifier
            .notify(&event.bucket, &event.key, &detail)
            .await;

        Outcome::Failed(detail)
    }
}
