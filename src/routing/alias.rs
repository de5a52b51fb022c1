//! Callback references and their late-bound resolution.
//!
//! # Responsibilities
//! - Model what a route dispatches to (`Callback`)
//! - Resolve alias names at fire time (`AliasResolver`, `AliasRegistry`)
//! - Map callback references to host-provided handlers (`HandlerRegistry`)
//!
//! # Design Decisions
//! - Callbacks are names, not closures, so compiled routes can be cached
//! - Aliases resolve exactly one level; an alias pointing at an alias is unresolved
//! - Handlers are injected by the host at fire time, never stored on routes

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::routing::entry::RouteMatch;
use crate::routing::error::{RouteError, RouteResult};

/// What a route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callback {
    /// Named function.
    Direct(String),
    /// `Class::method` pair.
    StaticMethod { class: String, method: String },
    /// Indirect name resolved through an [`AliasResolver`].
    Alias(String),
}

impl Callback {
    pub fn direct(name: impl Into<String>) -> Self {
        Callback::Direct(name.into())
    }

    pub fn static_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Callback::StaticMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    pub fn alias(name: impl Into<String>) -> Self {
        Callback::Alias(name.into())
    }

    /// Parse the textual form used in config files.
    ///
    /// `@name` is an alias, `Class::method` a static method, anything else a
    /// direct function name.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(alias) = text.strip_prefix('@') {
            return Callback::alias(alias);
        }
        match text.split_once("::") {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => {
                Callback::static_method(class, method)
            }
            _ => Callback::direct(text),
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Callback::Alias(_))
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Direct(name) => write!(f, "{}", name),
            Callback::StaticMethod { class, method } => write!(f, "{}::{}", class, method),
            Callback::Alias(name) => write!(f, "@{}", name),
        }
    }
}

/// Resolves alias names to concrete callbacks.
pub trait AliasResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Callback>;
}

/// Table-backed alias resolver.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    aliases: HashMap<String, Callback>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an alias.
    pub fn register(&mut self, name: impl Into<String>, target: Callback) {
        self.aliases.insert(name.into(), target);
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl AliasResolver for AliasRegistry {
    fn resolve(&self, name: &str) -> Option<Callback> {
        self.aliases.get(name).cloned()
    }
}

impl<S: Into<String>> FromIterator<(S, Callback)> for AliasRegistry {
    fn from_iter<I: IntoIterator<Item = (S, Callback)>>(iter: I) -> Self {
        Self {
            aliases: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A host-provided handler. Receives the match so it can read bound parameters.
pub type Handler<T> = Arc<dyn Fn(&RouteMatch<'_>) -> T + Send + Sync>;

/// Maps direct and static-method callbacks to handlers.
pub struct HandlerRegistry<T> {
    functions: HashMap<String, Handler<T>>,
    methods: HashMap<(String, String), Handler<T>>,
}

impl<T> Default for HandlerRegistry<T> {
    fn default() -> Self {
        Self {
            functions: HashMap::new(),
            methods: HashMap::new(),
        }
    }
}

impl<T> Clone for HandlerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            functions: self.functions.clone(),
            methods: self.methods.clone(),
        }
    }
}

impl<T> fmt::Debug for HandlerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T> HandlerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named function.
    pub fn function<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RouteMatch<'_>) -> T + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(handler));
        self
    }

    /// Register a `Class::method` pair.
    pub fn method<F>(mut self, class: impl Into<String>, method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&RouteMatch<'_>) -> T + Send + Sync + 'static,
    {
        self.methods
            .insert((class.into(), method.into()), Arc::new(handler));
        self
    }

    /// Whether a non-alias callback has a handler.
    pub fn contains(&self, callback: &Callback) -> bool {
        self.lookup(callback).is_some()
    }

    fn lookup(&self, callback: &Callback) -> Option<&Handler<T>> {
        match callback {
            Callback::Direct(name) => self.functions.get(name),
            Callback::StaticMethod { class, method } => {
                self.methods.get(&(class.clone(), method.clone()))
            }
            Callback::Alias(_) => None,
        }
    }

    /// Resolve a callback (following one alias hop) to its handler.
    pub fn handler_for(
        &self,
        callback: &Callback,
        aliases: &dyn AliasResolver,
    ) -> RouteResult<&Handler<T>> {
        let concrete = match callback {
            Callback::Alias(name) => match aliases.resolve(name) {
                Some(target) if !target.is_alias() => target,
                _ => return Err(RouteError::UnresolvedAlias(name.clone())),
            },
            other => other.clone(),
        };

        self.lookup(&concrete)
            .ok_or_else(|| RouteError::UnresolvedHandler(concrete.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_text() {
        assert_eq!(Callback::parse("echo"), Callback::direct("echo"));
        assert_eq!(
            Callback::parse("Users::show"),
            Callback::static_method("Users", "show")
        );
        assert_eq!(Callback::parse("@profile"), Callback::alias("profile"));
        assert_eq!(Callback::parse("::broken"), Callback::direct("::broken"));
    }

    #[test]
    fn test_display_matches_parse() {
        for text in ["echo", "Users::show", "@profile"] {
            assert_eq!(Callback::parse(text).to_string(), text);
        }
    }

    #[test]
    fn test_registry_resolves_one_hop() {
        let mut aliases = AliasRegistry::new();
        aliases.register("profile", Callback::static_method("Users", "show"));
        aliases.register("loop", Callback::alias("profile"));

        let handlers: HandlerRegistry<u32> =
            HandlerRegistry::new().method("Users", "show", |_| 7);

        assert!(handlers
            .handler_for(&Callback::alias("profile"), &aliases)
            .is_ok());
        assert!(matches!(
            handlers.handler_for(&Callback::alias("loop"), &aliases),
            Err(RouteError::UnresolvedAlias(name)) if name == "loop"
        ));
        assert!(matches!(
            handlers.handler_for(&Callback::alias("missing"), &aliases),
            Err(RouteError::UnresolvedAlias(_))
        ));
        assert!(matches!(
            handlers.handler_for(&Callback::direct("nope"), &aliases),
            Err(RouteError::UnresolvedHandler(name)) if name == "nope"
        ));
    }
}
