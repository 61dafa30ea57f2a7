//! Cold start configuration for the reconciler.
use rusoto_ssm::{GetParameterRequest, Ssm, SsmClient};

use std::env;

use crate::types::UtilResult;

/// Session name used when `ROLE_SESSION_NAME` isn't provided.
pub const DEFAULT_SESSION_NAME: &str = "cross_acct_lambda";

/// Environment provided configuration, read once per process.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// SSM parameter holding the (encrypted) Slack webhook URL.
    pub parameter_name: String,

    /// Slack channel to post alerts to.
    pub channel: String,

    /// Name of the running function, for the console link.
    pub function_name: String,

    /// Region the function is running in.
    pub region: String,

    /// Role to assume in the account owning uploaded objects.
    pub role_arn: String,

    /// Session name to assume the role with.
    pub session_name: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> UtilResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> UtilResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| format!("{} must be provided", name))
        };

        Ok(Config {
            parameter_name: required("SSM_PARAMETER")?,
            channel: required("slackChannel")?,
            function_name: required("AWS_LAMBDA_FUNCTION_NAME")?,
            region: required("AWS_REGION")?,
            role_arn: required("ROLE_ARN")?,
            session_name: lookup("ROLE_SESSION_NAME")
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string()),
        })
    }
}

/// Retrieves a decrypted parameter value from SSM.
pub async fn resolve_parameter(ssm: &SsmClient, name: &str) -> UtilResult<String> {
    let request = GetParameterRequest {
        name: name.to_string(),
        with_decryption: Some(true),
        ..GetParameterRequest::default()
    };

    ssm.get_parameter(request)
        .await?
        .parameter
        .and_then(|parameter| parameter.value)
        .ok_or_else(|| format!("Parameter {} has no value", name).into())
}

#[cfg(test)]
mod tests {
    use super::Config;
    use rusoto_core::signature::SignedRequest;
    use rusoto_core::Region;
    use rusoto_mock::{MockCredentialsProvider, MockRequestDispatcher};
    use rusoto_ssm::SsmClient;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const COMPLETE: &[(&str, &str)] = &[
        ("SSM_PARAMETER", "/ops/slack/hook"),
        ("slackChannel", "#s3-alerts"),
        ("AWS_LAMBDA_FUNCTION_NAME", "s3-acl-reconciler"),
        ("AWS_REGION", "us-west-2"),
        ("ROLE_ARN", "arn:aws:iam::123456789012:role/uploader"),
    ];

    #[test]
    fn reading_a_complete_config() {
        let config = Config::from_lookup(lookup(COMPLETE)).unwrap();

        assert_eq!(config.parameter_name, "/ops/slack/hook");
        assert_eq!(config.channel, "#s3-alerts");
        assert_eq!(config.function_name, "s3-acl-reconciler");
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.role_arn, "arn:aws:iam::123456789012:role/uploader");
        assert_eq!(config.session_name, super::DEFAULT_SESSION_NAME);
    }

    #[test]
    fn overriding_the_session_name() {
        let mut pairs = COMPLETE.to_vec();
        pairs.push(("ROLE_SESSION_NAME", "acl_repair"));

        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.session_name, "acl_repair");
    }

    #[test]
    fn rejecting_missing_variables() {
        let pairs: Vec<_> = COMPLETE
            .iter()
            .cloned()
            .filter(|(name, _)| *name != "slackChannel")
            .collect();

        let result = Config::from_lookup(lookup(&pairs));

        assert_eq!(
            result.unwrap_err().to_string(),
            "slackChannel must be provided"
        );
    }

    #[tokio::test]
    async fn resolving_decrypted_parameters() {
        let dispatcher = MockRequestDispatcher::with_status(200)
            .with_body(
                r#"{"Parameter":{"Name":"/ops/slack/hook","Type":"SecureString","Value":"https://hooks.slack.com/services/T000/B000/XXXX","Version":3}}"#,
            )
            .with_request_checker(|req: &SignedRequest| {
                assert_eq!(
                    req.headers.get("x-amz-target"),
                    Some(&vec![b"AmazonSSM.GetParameter".to_vec()])
                );
            });
        let ssm = SsmClient::new_with(dispatcher, MockCredentialsProvider, Region::UsWest2);

        let value = super::resolve_parameter(&ssm, "/ops/slack/hook")
            .await
            .unwrap();

        assert_eq!(value, "https://hooks.slack.com/services/T000/B000/XXXX");
    }
}
