use super::FormatAdapter;
use crate::aiccl::{decode, render_report, AicclEncoder};
use crate::config::FormatConfig;
use crate::error::Result;
use crate::request::{ContextData, ContextRequest};

/// Human-readable report of an AICCL document
pub fn expand(text: &str) -> String {
    render_report(&decode(text))
}

/// Encodes to AICCL, then expands the result into a report
#[derive(Debug, Clone, Default)]
pub struct AicclExpandAdapter {
    encoder: AicclEncoder,
}

impl AicclExpandAdapter {
    pub fn new(config: &FormatConfig) -> Self {
        Self {
            encoder: AicclEncoder::new(config),
        }
    }
}

impl FormatAdapter for AicclExpandAdapter {
    fn name(&self) -> &'static str {
        "aiccl-expand"
    }

    fn description(&self) -> &'static str {
        "AICCL expanded back into a readable report"
    }

    fn render(&self, data: &ContextData, _request: &ContextRequest) -> Result<String> {
        Ok(expand(&self.encoder.encode(data)))
    }
}
