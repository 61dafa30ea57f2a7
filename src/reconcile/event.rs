//! Upload notifications delivered through EventBridge.
use serde::Deserialize;

/// EventBridge notification for an S3 `PutObject` call, as recorded by
/// CloudTrail. Only the fields used to locate the object are modelled.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct UploadNotification {
    pub detail: UploadDetail,
}

/// The `detail` section of an `UploadNotification`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadDetail {
    pub request_parameters: RequestParameters,
}

/// The parameters of the recorded `PutObject` call.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameters {
    pub bucket_name: String,
    pub key: String,
}

/// The object an upload notification refers to.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadEvent {
    pub bucket: String,
    pub key: String,
}

impl From<UploadNotification> for UploadEvent {
    fn from(notification: UploadNotification) -> Self {
        let parameters = notification.detail.request_parameters;

        UploadEvent {
            bucket: parameters.bucket_name,
            key: parameters.key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{UploadEvent, UploadNotification};

    #[test]
    fn parsing_cloudtrail_notifications() {
        let payload = r#"{
            "version": "0",
            "id": "36eb8523-97d0-4518-b33d-ee3579ff19f0",
            "detail-type": "AWS API Call via CloudTrail",
            "source": "aws.s3",
            "account": "123456789012",
            "time": "2019-12-11T23:32:47Z",
            "region": "us-west-2",
            "resources": [],
            "detail": {
                "eventSource": "s3.amazonaws.com",
                "eventName": "PutObject",
                "requestParameters": {
                    "bucketName": "media",
                    "Host": "media.s3.us-west-2.amazonaws.com",
                    "key": "img/1.png",
                    "x-amz-acl": "private"
                }
            }
        }"#;

        let notification: UploadNotification = serde_json::from_str(payload).unwrap();

        assert_eq!(
            UploadEvent::from(notification),
            UploadEvent {
                bucket: "media".into(),
                key: "img/1.png".into(),
            }
        );
    }

    #[test]
    fn rejecting_notifications_without_a_key() {
        let payload = r#"{"detail":{"requestParameters":{"bucketName":"media"}}}"#;

        assert!(serde_json::from_str::<UploadNotification>(payload).is_err());
    }
}
