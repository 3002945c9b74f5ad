use super::FormatAdapter;
use crate::aiccl::AicclEncoder;
use crate::config::FormatConfig;
use crate::error::Result;
use crate::request::{ContextData, ContextRequest};

/// Compressed AICCL text
#[derive(Debug, Clone, Default)]
pub struct AicclAdapter {
    encoder: AicclEncoder,
}

impl AicclAdapter {
    pub fn new(config: &FormatConfig) -> Self {
        Self {
            encoder: AicclEncoder::new(config),
        }
    }
}

impl FormatAdapter for AicclAdapter {
    fn name(&self) -> &'static str {
        "aiccl"
    }

    fn description(&self) -> &'static str {
        "AICCL compressed context for prompts"
    }

    fn render(&self, data: &ContextData, _request: &ContextRequest) -> Result<String> {
        Ok(self.encoder.encode(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixtures::sample;

    #[test]
    fn renders_every_section_with_content() {
        let text = AicclAdapter::default()
            .render(&sample(), &ContextRequest::new("load"))
            .unwrap();
        let headers: Vec<&str> = text.lines().filter(|l| l.starts_with("# ")).collect();
        assert_eq!(
            headers,
            vec![
                "# FILE_PATHS",
                "# COMPRESSION_MAP",
                "# SYSTEMS",
                "# COMPRESSED_CODE",
                "# RELATIONSHIPS",
                "# RULES",
                "# FLOWS",
            ]
        );
        assert!(text.contains("F1:src/store.ts\n"), "{text}");
        assert!(text.contains("S1>S2:CALLS|80%\n"), "{text}");
        assert!(text.contains("R1:naming|90%|use verbs for functions\n"), "{text}");
        assert!(text.contains("persist: S1>S2\n"), "{text}");
    }
}
