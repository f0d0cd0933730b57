use std::fmt;

use tracing::error;

pub const FALLBACK: &str = "Something went wrong.";

/// Contains failures of one panel.
///
/// The first failure is logged and latched: the panel is never rendered
/// again and every later frame shows [`FALLBACK`] in its place.
#[derive(Debug)]
pub struct ErrorBoundary {
    name: &'static str,
    failed: bool,
}

impl ErrorBoundary {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            failed: false,
        }
    }

    #[cfg(test)]
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn render<E: fmt::Display>(&mut self, panel: impl FnOnce() -> Result<String, E>) -> String {
        if self.failed {
            return FALLBACK.to_string();
        }
        match panel() {
            Ok(out) => out,
            Err(err) => {
                error!("ErrorBoundary caught: {} panel failed: {err}", self.name);
                self.failed = true;
                FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorBoundary, FALLBACK};
    use std::cell::Cell;

    #[test]
    fn passes_output_through() {
        let mut b = ErrorBoundary::new("legend");
        assert_eq!(b.render(|| Ok::<_, String>("ok".to_string())), "ok");
        assert!(!b.has_failed());
    }

    #[test]
    fn latches_after_first_failure() {
        let calls = Cell::new(0);
        let mut b = ErrorBoundary::new("map");

        let out = b.render(|| {
            calls.set(calls.get() + 1);
            Err("bad marker")
        });
        assert_eq!(out, FALLBACK);
        assert!(b.has_failed());

        let out = b.render(|| {
            calls.set(calls.get() + 1);
            Ok::<_, &str>("recovered".to_string())
        });
        assert_eq!(out, FALLBACK);
        assert_eq!(calls.get(), 1);
    }
}
