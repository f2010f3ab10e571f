/// Cross-cutting logger for pipeline orchestration events.
///
/// Decouples the use case from specific output mechanisms so each caller
/// can observe pipeline behavior without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Record how long a named pipeline stage took for one request.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);
}

/// Silent logger that discards all events. Used by embedders with their
/// own observability and by tests where logger output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Routes pipeline events to the `log` facade.
pub struct LogPipelineLogger;

impl PipelineLogger for LogPipelineLogger {
    fn timing(&mut self, stage: &str, duration_ms: f64) {
        log::debug!("{stage}: {duration_ms:.1}ms");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.timing("face_detection", 5.0);
        logger.info("hello");
        // No panics = success
    }

    #[test]
    fn test_log_logger_all_methods_are_noop_without_subscriber() {
        let mut logger = LogPipelineLogger;
        logger.timing("model_prediction", 12.0);
        logger.info("processed request");
    }
}
