// ==========================================
// 库存管理看板 - 上传结果报告
// ==========================================
// 响应形态: { created_count, total_rows_processed, errors }
// 结果分类: Success / PartialSuccess（有行级错误）/ Failure（文件级错误）
// ==========================================

use crate::importer::error::{ImportResult, RowError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReport {
    pub created_count: usize,
    pub total_rows_processed: usize,
    pub errors: Vec<String>,
}

impl UploadReport {
    pub fn new(total_rows_processed: usize) -> Self {
        Self {
            total_rows_processed,
            ..Default::default()
        }
    }

    pub fn record_created(&mut self) {
        self.created_count += 1;
    }

    pub fn record_error(&mut self, err: &RowError, locale: &str) {
        self.errors.push(err.message(locale));
    }

    pub fn rejected_count(&self) -> usize {
        self.errors.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadOutcome {
    Success(UploadReport),
    PartialSuccess(UploadReport),
    Failure { reason: String },
}

impl UploadOutcome {
    /// 按报告内容分类；非空 errors 一律视为部分成功
    pub fn from_report(report: UploadReport) -> Self {
        if report.errors.is_empty() {
            UploadOutcome::Success(report)
        } else {
            UploadOutcome::PartialSuccess(report)
        }
    }

    pub fn from_result(result: ImportResult<UploadReport>) -> Self {
        match result {
            Ok(report) => Self::from_report(report),
            Err(e) => UploadOutcome::Failure {
                reason: e.to_string(),
            },
        }
    }

    pub fn report(&self) -> Option<&UploadReport> {
        match self {
            UploadOutcome::Success(r) | UploadOutcome::PartialSuccess(r) => Some(r),
            UploadOutcome::Failure { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success(_))
    }
}
