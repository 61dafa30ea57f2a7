//! Cross-account credentials, assumed through STS and cached per process.
//!
//! The Lambda runtime keeps a process alive across invocations, so the
//! assumed credentials outlive a single event. Every privileged call goes
//! through `CredentialCache`, which checks expiry on each access rather
//! than once at cold start.
use async_trait::async_trait;
use rusoto_core::credential::StaticProvider;
use rusoto_core::{HttpClient, Region};
use rusoto_s3::S3Client;
use rusoto_sts::{AssumeRoleRequest, Sts, StsClient};
use tokio::sync::Mutex;

use std::fmt::{self, Debug, Formatter};
use std::time::{Duration, SystemTime};

use crate::types::UtilResult;

/// Credentials closer than this to expiry are refreshed before use.
pub const REFRESH_THRESHOLD: Duration = Duration::from_secs(300);

/// Temporary credentials issued for an assumed role.
#[derive(Clone, PartialEq)]
pub struct AssumedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expires_at: SystemTime,
}

impl AssumedCredentials {
    /// Returns the time left before expiry, zero once expired.
    pub fn time_left(&self, now: SystemTime) -> Duration {
        self.expires_at.duration_since(now).unwrap_or_default()
    }
}

// Keeps secrets out of logs.
impl Debug for AssumedCredentials {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("AssumedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Capability to assume the cross-account role owning uploaded objects.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    /// Assumes the role, returning a fresh set of temporary credentials.
    async fn assume_role(&self) -> UtilResult<AssumedCredentials>;

    /// Builds an S3 client acting under the provided credentials.
    fn connect(&self, credentials: &AssumedCredentials) -> UtilResult<S3Client> {
        let provider = StaticProvider::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            None,
        );
        Ok(S3Client::new_with(HttpClient::new()?, provider, Region::default()))
    }
}

/// `RoleAssumer` backed by STS `AssumeRole`.
pub struct StsRoleAssumer {
    sts: StsClient,
    role_arn: String,
    session_name: String,
}

impl StsRoleAssumer {
    /// Constructs a new `StsRoleAssumer` for a role/session pair.
    pub fn new(sts: StsClient, role_arn: String, session_name: String) -> Self {
        Self {
            sts,
            role_arn,
            session_name,
        }
    }
}

#[async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(&self) -> UtilResult<AssumedCredentials> {
        let request = AssumeRoleRequest {
            role_arn: self.role_arn.clone(),
            role_session_name: self.session_name.clone(),
            ..AssumeRoleRequest::default()
        };

        let credentials = self
            .sts
            .assume_role(request)
            .await?
            .credentials
            .ok_or("AssumeRole returned no credentials")?;

        Ok(AssumedCredentials {
            expires_at: humantime::parse_rfc3339_weak(&credentials.expiration)?,
            access_key_id: credentials.access_key_id,
            secret_access_key: credentials.secret_access_key,
            session_token: credentials.session_token,
        })
    }
}

/// Assumed credentials alongside the client built from them.
struct Session {
    credentials: AssumedCredentials,
    client: S3Client,
}

/// Single slot cache of assumed credentials, refreshed close to expiry.
///
/// The slot stays locked for the duration of a refresh, so concurrent
/// callers see either the previous session or the new one in full.
pub struct CredentialCache<A> {
    assumer: A,
    threshold: Duration,
    slot: Mutex<Option<Session>>,
}

impl<A> CredentialCache<A>
where
    A: RoleAssumer,
{
    /// Constructs a new, empty `CredentialCache`.
    pub fn new(assumer: A) -> Self {
        Self::with_threshold(assumer, REFRESH_THRESHOLD)
    }

    /// Constructs a new, empty `CredentialCache` with a custom threshold.
    pub fn with_threshold(assumer: A, threshold: Duration) -> Self {
        Self {
            assumer,
            threshold,
            slot: Mutex::new(None),
        }
    }

    /// Retrieves valid credentials as of `now`, refreshing as needed.
    pub async fn get(&self, now: SystemTime) -> UtilResult<AssumedCredentials> {
        self.session(now).await.map(|(credentials, _)| credentials)
    }

    /// Retrieves a privileged client as of `now`, refreshing as needed.
    pub async fn client(&self, now: SystemTime) -> UtilResult<S3Client> {
        self.session(now).await.map(|(_, client)| client)
    }

    async fn session(&self, now: SystemTime) -> UtilResult<(AssumedCredentials, S3Client)> {
        let mut slot = self.slot.lock().await;

        // reuse the current session while it's comfortably valid
        if let Some(session) = slot.as_ref() {
            let time_left = session.credentials.time_left(now);

            info!("Assumed role time left: {}s", time_left.as_secs());

            if time_left >= self.threshold {
                return Ok((session.credentials.clone(), session.client.clone()));
            }
        }

        // otherwise assume the role again and swap the whole session
        let credentials = self.assumer.assume_role().await?;
        let client = self.assumer.connect(&credentials)?;

        info!(
            "Assumed role credentials renewed, new expiry: {}",
            humantime::format_rfc3339_seconds(credentials.expires_at)
        );

        *slot = Some(Session {
            credentials: credentials.clone(),
            client: client.clone(),
        });

        Ok((credentials, client))
    }
}
