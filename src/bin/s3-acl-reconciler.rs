//! AWS Lambda bootstrap for the S3 ACL reconciler.
//!
//! Configuration is read once per cold start, and the resulting context
//! (including any assumed credentials) is shared by every invocation the
//! runtime routes to this process.
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use s3_ops::reconcile::{Config, Reconciler, UploadEvent, UploadNotification};

use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // initialize logging, everything goes to CloudWatch
    s3_ops::log::init(false)?;

    // resolve configuration and clients on cold start
    let config = Config::from_env()?;
    let reconciler = Arc::new(Reconciler::from_config(&config).await?);

    // reconcile each upload, never failing back to the runtime
    run(service_fn(move |event: LambdaEvent<UploadNotification>| {
        let reconciler = reconciler.clone();
        async move {
            let upload = UploadEvent::from(event.payload);
            reconciler.reconcile(&upload).await;
            Ok::<(), Error>(())
        }
    }))
    .await
}
