//! Hate speech reports.
//!
//! There is no reporting backend: reports are only written to the log.

use log::info;
use mockall::automock;

use crate::services::ServiceError;

/// A report of hate speech posted in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub conversation_id: String,
    pub reporter_id: String,
}

#[automock]
pub trait Reporter {
    async fn report(&self, report: &Report) -> Result<(), ServiceError>;
}

/// Reporter writing reports to the log.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    async fn report(&self, report: &Report) -> Result<(), ServiceError> {
        info!(
            "got report from {} in {}",
            report.reporter_id, report.conversation_id
        );
        Ok(())
    }
}
