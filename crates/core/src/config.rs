//! Core configuration record (§9: "global mutable state ... reified as a
//! configuration record threaded through the parse-context").
//!
//! Mirrors the teacher's `CompilerConfig` builder shape: a plain data record
//! built once and threaded through, rather than read from process-wide
//! mutable state. `CoreConfig` only covers what `semcore`/`semengine` read
//! directly; the wider CLI surface (`-O`, `--emit`, `--target`, …) is out of
//! scope (§1) and lives in whatever binary owns the full `ParseContext`.

use crate::diagnostics::Warning;
use std::collections::HashMap;

/// How a warning is treated once enabled: reported normally, or escalated
/// to an error (`-Werror=<name>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningAction {
    Report,
    Error,
}

/// Configuration threaded through `ParseContext` implementations (§9).
///
/// # Example
///
/// ```
/// use semcore::config::CoreConfig;
/// use semcore::diagnostics::Warning;
///
/// let config = CoreConfig::new()
///     .with_aggressive_consteval(true)
///     .with_warning(Warning::IntOverflow)
///     .with_werror(Warning::MathDomainError);
///
/// assert!(config.is_enabled(Warning::IntOverflow));
/// assert!(config.is_werror(Warning::MathDomainError));
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Per-warning enablement; a warning absent from this map is enabled by
    /// default (matching the original's "on unless silenced" default).
    warnings: HashMap<Warning, WarningAction>,
    /// Warnings disabled outright (`-Wno-<name>`), checked before `warnings`.
    disabled: Vec<Warning>,
    /// §5/§9: controls whether `is_comptime` and friends are allowed to
    /// drive the full interpreter rather than only guaranteed folding.
    aggressive_consteval: bool,
    /// `-F<opt>[=<value>]` compile-time options consulted by
    /// `__builtin_is_option_set` (§6); out-of-core CLI parsing populates
    /// this, the core only reads it.
    options: HashMap<String, String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            warnings: HashMap::new(),
            disabled: Vec::new(),
            aggressive_consteval: false,
            options: HashMap::new(),
        }
    }
}

impl CoreConfig {
    pub fn new() -> Self {
        CoreConfig::default()
    }

    pub fn with_aggressive_consteval(mut self, enabled: bool) -> Self {
        self.aggressive_consteval = enabled;
        self
    }

    pub fn with_warning(mut self, kind: Warning) -> Self {
        self.warnings.insert(kind, WarningAction::Report);
        self
    }

    pub fn with_werror(mut self, kind: Warning) -> Self {
        self.warnings.insert(kind, WarningAction::Error);
        self
    }

    pub fn with_disabled_warning(mut self, kind: Warning) -> Self {
        self.disabled.push(kind);
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn is_aggressive_consteval_enabled(&self) -> bool {
        self.aggressive_consteval
    }

    pub fn is_enabled(&self, kind: Warning) -> bool {
        !self.disabled.contains(&kind)
    }

    pub fn is_werror(&self, kind: Warning) -> bool {
        matches!(self.warnings.get(&kind), Some(WarningAction::Error))
    }

    pub fn is_option_set(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn option_value(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}
