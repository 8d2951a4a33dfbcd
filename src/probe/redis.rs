use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::config::{RedisConfig, REDIS_CLI_PROGRAM};
use crate::error::ProbeError;

use super::command::{expect_output, run};
use super::Probe;

const PING_REPLY: &str = "PONG";

pub struct RedisProbe {
    config: RedisConfig,
    program: String,
    timeout: Duration,
}

impl RedisProbe {
    pub fn new(config: RedisConfig, timeout: Duration) -> Self {
        Self {
            config,
            program: REDIS_CLI_PROGRAM.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-h".to_string(),
            self.config.host.clone(),
            "-p".to_string(),
            self.config.port.to_string(),
        ];
        if !self.config.password.is_empty() {
            args.push("-a".to_string());
            args.push(self.config.password.clone());
        }
        args.push("PING".to_string());
        args
    }
}

#[async_trait]
impl Probe for RedisProbe {
    fn name(&self) -> &str {
        "redis"
    }

    fn kind(&self) -> &'static str {
        "redis"
    }

    fn endpoint(&self) -> &str {
        &self.config.host
    }

    #[instrument(name = "probe.redis", skip(self), fields(host = %self.config.host, port = self.config.port))]
    async fn check(&self) -> Result<(), ProbeError> {
        tracing::debug!("Checking redis host");
        let stdout = run(&self.program, &self.args(), self.timeout).await?;
        expect_output(&self.program, &stdout, PING_REPLY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(password: &str) -> RedisConfig {
        RedisConfig {
            host: "redis".to_string(),
            port: 6379,
            password: password.to_string(),
        }
    }

    #[test]
    fn test_args_without_password() {
        let probe = RedisProbe::new(config(""), Duration::from_secs(5));
        assert_eq!(probe.args(), vec!["-h", "redis", "-p", "6379", "PING"]);
    }

    #[test]
    fn test_args_with_password() {
        let probe = RedisProbe::new(config("pw"), Duration::from_secs(5));
        assert_eq!(
            probe.args(),
            vec!["-h", "redis", "-p", "6379", "-a", "pw", "PING"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_reply_without_pong_fails() {
        // echo prints the arguments back, ending in PING rather than PONG
        let probe = RedisProbe::new(config(""), Duration::from_secs(5)).with_program("echo");
        assert!(matches!(
            probe.check().await,
            Err(ProbeError::UnexpectedOutput { .. })
        ));
    }
}
