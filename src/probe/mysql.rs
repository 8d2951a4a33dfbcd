use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use crate::config::{MysqlConfig, MYSQL_ADMIN_PROGRAM};
use crate::error::ProbeError;

use super::command::{expect_output, run};
use super::Probe;

/// `mysqladmin status` prints "Uptime: ..." on a live server
const STATUS_MARKER: &str = "Uptime";

pub struct MysqlProbe {
    config: MysqlConfig,
    program: String,
    timeout: Duration,
}

impl MysqlProbe {
    pub fn new(config: MysqlConfig, timeout: Duration) -> Self {
        Self {
            config,
            program: MYSQL_ADMIN_PROGRAM.to_string(),
            timeout,
        }
    }

    /// Override the client binary
    #[cfg(test)]
    fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-h".to_string(),
            self.config.host.clone(),
            "-u".to_string(),
            self.config.user.clone(),
            format!("-p{}", self.config.password),
            "status".to_string(),
        ]
    }
}

#[async_trait]
impl Probe for MysqlProbe {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &'static str {
        "mysql"
    }

    fn endpoint(&self) -> &str {
        &self.config.host
    }

    #[instrument(name = "probe.mysql", skip(self), fields(service = %self.config.name, host = %self.config.host))]
    async fn check(&self) -> Result<(), ProbeError> {
        tracing::debug!("Checking mysql host");
        let stdout = run(&self.program, &self.args(), self.timeout).await?;
        expect_output(&self.program, &stdout, STATUS_MARKER)
    }
}
