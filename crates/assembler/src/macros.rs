//! Macro registry with positional parameter substitution.
//!
//! Templates are plain source text containing `$1`..`$n` placeholders.
//! Instantiation is purely textual; the parser re-parses the substituted
//! body in the enclosing symbol scope.

use std::collections::HashMap;

use thiserror::Error;

/// Instantiation failures, surfaced by the parser as Error nodes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacroError {
    #[error("Unknown macro: {0}")]
    Unknown(String),

    #[error("Macro {name} expects {expected} arguments, found {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone)]
struct Template {
    arity: usize,
    body: String,
}

/// Name → template store. Names are case-sensitive.
#[derive(Debug, Default)]
pub struct MacroRegistry {
    templates: HashMap<String, Template>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a template under `name`.
    pub fn register(&mut self, name: &str, arity: usize, body: &str) {
        self.templates.insert(
            name.to_string(),
            Template {
                arity,
                body: body.to_string(),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Substitutes `args` into the template registered under `name` and
    /// returns the resulting source fragment.
    ///
    /// Placeholders are replaced highest index first, so `$10` is never
    /// clobbered by `$1`.
    pub fn instantiate(&self, name: &str, args: &[String]) -> Result<String, MacroError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| MacroError::Unknown(name.to_string()))?;
        if args.len() != template.arity {
            return Err(MacroError::ArityMismatch {
                name: name.to_string(),
                expected: template.arity,
                found: args.len(),
            });
        }
        let mut body = template.body.clone();
        for (index, arg) in args.iter().enumerate().rev() {
            body = body.replace(&format!("${}", index + 1), arg);
        }
        Ok(body)
    }
}

/// Seeds the registry with the built-in system-call macros of the standard
/// runtime. The trap-index symbols they reference are pre-defined by
/// [`crate::symbol::add_os_symbols`].
pub fn add_os_macros(registry: &mut MacroRegistry) {
    registry.register("DECI", 2, "LDWA DECI,i\nSCALL $1,$2\n");
    registry.register("DECO", 2, "LDWA DECO,i\nSCALL $1,$2\n");
    registry.register("HEXO", 2, "LDWA HEXO,i\nSCALL $1,$2\n");
    registry.register("STRO", 2, "LDWA STRO,i\nSCALL $1,$2\n");
    registry.register("SNOP", 0, "LDWA SNOP,i\nSCALL 0,i\n");
}
