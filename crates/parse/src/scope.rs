//! Scoped name tables used to tell typedef names from ordinary identifiers.

use std::collections::HashMap;

use lex::TypeNameScope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Struct,
    Union,
    Enum,
}

impl TagKind {
    pub fn spelling(self) -> &'static str {
        match self {
            TagKind::Struct => "struct",
            TagKind::Union => "union",
            TagKind::Enum => "enum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Typedef,
    Ordinary,
}

#[derive(Debug, Default)]
struct Scope {
    names: HashMap<String, NameKind>,
    tags: HashMap<String, TagKind>,
}

/// Stack of scopes, innermost last. The file scope is never popped.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
        log::trace!("enter scope (depth {})", self.scopes.len());
    }

    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            log::trace!("exit scope (depth {})", self.scopes.len());
        }
    }

    fn top(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn add_typedef(&mut self, name: &str) {
        log::trace!("typedef '{}' at depth {}", name, self.scopes.len());
        self.top().names.insert(name.to_string(), NameKind::Typedef);
    }

    /// Objects, functions, parameters and enumerators. Shadows outer typedefs.
    pub fn add_ordinary(&mut self, name: &str) {
        self.top().names.insert(name.to_string(), NameKind::Ordinary);
    }

    /// Declare a tag in the innermost scope. Struct, union and enum tags share one
    /// namespace; a clash of kinds within a scope returns the earlier kind.
    pub fn add_tag(&mut self, kind: TagKind, name: &str) -> Result<(), TagKind> {
        let top = self.top();
        match top.tags.get(name) {
            Some(prev) if *prev != kind => Err(*prev),
            Some(_) => Ok(()),
            None => {
                top.tags.insert(name.to_string(), kind);
                Ok(())
            }
        }
    }

    pub fn lookup_tag(&self, name: &str) -> Option<TagKind> {
        self.scopes.iter().rev().find_map(|s| s.tags.get(name).copied())
    }

    /// The innermost scope declaring `name` decides.
    pub fn is_typedef_name(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.names.get(name))
            .is_some_and(|k| *k == NameKind::Typedef)
    }
}

impl TypeNameScope for ScopeStack {
    fn is_typedef_name(&self, name: &str) -> bool {
        ScopeStack::is_typedef_name(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typedefs_are_scoped() {
        let mut s = ScopeStack::new();
        s.add_typedef("T");
        assert!(s.is_typedef_name("T"));
        s.enter_scope();
        s.add_typedef("U");
        assert!(s.is_typedef_name("T"));
        assert!(s.is_typedef_name("U"));
        s.exit_scope();
        assert!(!s.is_typedef_name("U"));
    }

    #[test]
    fn ordinary_names_shadow_typedefs() {
        let mut s = ScopeStack::new();
        s.add_typedef("T");
        s.enter_scope();
        s.add_ordinary("T");
        assert!(!s.is_typedef_name("T"));
        s.enter_scope();
        s.add_typedef("T");
        assert!(s.is_typedef_name("T"));
        s.exit_scope();
        s.exit_scope();
        assert!(s.is_typedef_name("T"));
    }

    #[test]
    fn file_scope_survives_extra_exits() {
        let mut s = ScopeStack::new();
        s.add_typedef("T");
        s.exit_scope();
        s.exit_scope();
        assert_eq!(s.depth(), 1);
        assert!(s.is_typedef_name("T"));
    }

    #[test]
    fn tag_kinds_clash_within_a_scope() {
        let mut s = ScopeStack::new();
        assert_eq!(s.add_tag(TagKind::Struct, "S"), Ok(()));
        assert_eq!(s.add_tag(TagKind::Struct, "S"), Ok(()));
        assert_eq!(s.add_tag(TagKind::Union, "S"), Err(TagKind::Struct));
        s.enter_scope();
        assert_eq!(s.add_tag(TagKind::Union, "S"), Ok(()));
        assert_eq!(s.lookup_tag("S"), Some(TagKind::Union));
        s.exit_scope();
        assert_eq!(s.lookup_tag("S"), Some(TagKind::Struct));
        // tags are not type names on their own
        assert!(!s.is_typedef_name("S"));
    }
}
