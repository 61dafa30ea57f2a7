//! Test doubles for the reconciler capabilities.
use async_trait::async_trait;
use rusoto_core::signature::SignedRequest;
use rusoto_core::Region;
use rusoto_mock::{MockCredentialsProvider, MockRequestDispatcher};
use rusoto_s3::S3Client;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::alert::{Delivery, Notifier};
use super::credentials::{AssumedCredentials, RoleAssumer};
use crate::types::UtilResult;

/// Shared call counter.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Shared clock, in whole seconds since the epoch.
#[derive(Clone)]
pub struct FakeClock(Arc<AtomicU64>);

impl FakeClock {
    pub fn at(secs: u64) -> Self {
        Self(Arc::new(AtomicU64::new(secs)))
    }

    pub fn set(&self, secs: u64) {
        self.0.store(secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn now(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.0.load(Ordering::SeqCst))
    }
}

/// `RoleAssumer` issuing credentials which expire `lifetime * n` after
/// `epoch`, for the nth assumption. Privileged clients answer every call
/// with the configured status and body.
pub struct FakeAssumer {
    pub assumed: Counter,
    pub granted: Counter,
    epoch: SystemTime,
    lifetime: Duration,
    failing: bool,
    status: u16,
    body: String,
}

impl FakeAssumer {
    pub fn new(epoch: SystemTime, lifetime: Duration) -> Self {
        Self {
            assumed: Counter::default(),
            granted: Counter::default(),
            epoch,
            lifetime,
            failing: false,
            status: 200,
            body: String::new(),
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn granting(mut self, status: u16, body: &str) -> Self {
        self.status = status;
        self.body = body.to_string();
        self
    }
}

#[async_trait]
impl RoleAssumer for FakeAssumer {
    async fn assume_role(&self) -> UtilResult<AssumedCredentials> {
        if self.failing {
            return Err("User is not authorized to perform: sts:AssumeRole".into());
        }

        let issued = self.assumed.bump();

        Ok(AssumedCredentials {
            access_key_id: format!("ASIA{}", issued),
            secret_access_key: format!("secret-{}", issued),
            session_token: format!("token-{}", issued),
            expires_at: self.epoch + self.lifetime * issued as u32,
        })
    }

    fn connect(&self, credentials: &AssumedCredentials) -> UtilResult<S3Client> {
        let granted = self.granted.clone();
        let token = credentials.session_token.clone();

        let dispatcher = MockRequestDispatcher::with_status(self.status)
            .with_body(&self.body)
            .with_request_checker(move |req: &SignedRequest| {
                assert_eq!(req.method, "PUT");
                assert!(req.params.contains_key("acl"));
                assert_eq!(
                    req.headers.get("x-amz-acl"),
                    Some(&vec![b"bucket-owner-full-control".to_vec()])
                );
                assert!(!token.is_empty());
                granted.bump();
            });

        Ok(S3Client::new_with(dispatcher, MockCredentialsProvider, Region::UsEast1))
    }
}

/// `Notifier` keeping hold of every alert it's asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub alerts: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, bucket: &str, key: &str, detail: &str) -> Delivery {
        self.alerts
            .lock()
            .unwrap()
            .push((bucket.into(), key.into(), detail.into()));
        Delivery::Delivered
    }
}
