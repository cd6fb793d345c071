use crate::models::AppId;
use std::sync::Arc;
use std::time::Instant;

/// Answers "which app is in the foreground right now".
///
/// `None` means the answer is unknown this time (no display, permission
/// missing, stale report); the caller skips the tick and asks again later.
pub trait ForegroundSource: Send + Sync {
    fn resolve(&self, now: Instant) -> Option<AppId>;
}

/// Source for hosts without a native adapter. Never knows the answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoForeground;

impl ForegroundSource for NoForeground {
    fn resolve(&self, _now: Instant) -> Option<AppId> {
        None
    }
}

/// Asks each source in order and takes the first answer.
pub struct FallbackForeground {
    sources: Vec<Arc<dyn ForegroundSource>>,
}

impl FallbackForeground {
    pub fn new(sources: Vec<Arc<dyn ForegroundSource>>) -> Self {
        Self { sources }
    }
}

impl ForegroundSource for FallbackForeground {
    fn resolve(&self, now: Instant) -> Option<AppId> {
        self.sources.iter().find_map(|source| source.resolve(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ReportedForeground;

    #[test]
    fn test_fallback_prefers_first_answer() {
        let now = Instant::now();
        let reported = Arc::new(ReportedForeground::new());
        let backup = Arc::new(ReportedForeground::new());
        backup.report(AppId::from("native"), now);

        let (first, second) = (Arc::clone(&reported), Arc::clone(&backup));
        let sources: Vec<Arc<dyn ForegroundSource>> = vec![first, Arc::new(NoForeground), second];
        let source = FallbackForeground::new(sources);

        assert_eq!(source.resolve(now), Some(AppId::from("native")));
        reported.report(AppId::from("reported"), now);
        assert_eq!(source.resolve(now), Some(AppId::from("reported")));
    }
}
