//! Scoped symbol table for one function translation.
//!
//! Scopes exist for function bodies and task bodies only; `if` and `while`
//! bodies share the scope of their function, as in the host language. Lookup
//! walks outward through parent scopes, so task bodies see and mutate the
//! variables of the function that contains them.
//!
//! Every declared symbol also receives an IR name that is unique across the
//! whole sequence definition, because the engine has a single flat variable
//! list per sequence. Usually the IR name is the source name; a task-local
//! declaration that reuses an outer name gets a task-qualified IR name.

use std::{cell::RefCell, rc::Rc};

use anyhow::bail;
use rtseq_sequence::ValueType;
use rustc_hash::{FxHashMap, FxHashSet};

pub(crate) type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VariableSymbol {
    pub(crate) ir_name: String,
    pub(crate) value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChannelSymbol {
    pub(crate) ir_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Symbol {
    Variable(VariableSymbol),
    Channel(ChannelSymbol),
}

#[derive(Debug)]
pub(crate) struct Scope {
    pub(crate) name: String,
    /// Path from the function scope, e.g. `main::f1`.
    pub(crate) full_path: String,
    pub(crate) parent: Option<ScopeRef>,
    pub(crate) symbols: FxHashMap<String, Symbol>,
}

impl Scope {
    #[must_use = "scope constructor returns a new scope that should be used"]
    pub(crate) fn new(name: &str, full_path: String, parent: Option<ScopeRef>) -> ScopeRef {
        Rc::new(RefCell::new(Self {
            name: name.to_string(),
            full_path,
            parent,
            symbols: FxHashMap::default(),
        }))
    }

    pub(crate) fn insert_symbol(&mut self, name: &str, symbol: Symbol) -> anyhow::Result<()> {
        if self.symbols.contains_key(name) {
            bail!("Symbol `{name}` already declared in this scope");
        }
        self.symbols.insert(name.to_string(), symbol);
        Ok(())
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub(crate) fn lookup_symbol_local(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    #[must_use = "this is a pure lookup with no side effects"]
    pub(crate) fn lookup_symbol(&self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.lookup_symbol_local(name) {
            return Some(symbol.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().lookup_symbol(name);
        }
        None
    }
}

#[derive(Default)]
pub(crate) struct SymbolTable {
    current_scope: Option<ScopeRef>,
    ir_names: FxHashSet<String>,
}

impl SymbolTable {
    pub(crate) fn push_scope(&mut self, name: &str) {
        let parent = self.current_scope.clone();

        let full_path = match &parent {
            Some(p) => format!("{}::{name}", p.borrow().full_path),
            None => name.to_string(),
        };
        self.current_scope = Some(Scope::new(name, full_path, parent));
    }

    /// Leaves the current scope. Its symbols are gone once no task body refers to it.
    pub(crate) fn pop_scope(&mut self) {
        let parent = self
            .current_scope
            .as_ref()
            .and_then(|scope| scope.borrow().parent.clone());
        self.current_scope = parent;
    }

    #[must_use]
    pub(crate) fn current_path(&self) -> String {
        self.current_scope
            .as_ref()
            .map(|scope| scope.borrow().full_path.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub(crate) fn current_scope_name(&self) -> String {
        self.current_scope
            .as_ref()
            .map(|scope| scope.borrow().name.clone())
            .unwrap_or_default()
    }

    /// Declares `name` in the current scope.
    ///
    /// Shadowing a name of an enclosing scope is allowed.
    pub(crate) fn declare(&mut self, name: &str, symbol: Symbol) -> anyhow::Result<()> {
        let Some(scope) = &self.current_scope else {
            bail!("No scope to declare `{name}` in");
        };
        scope.borrow_mut().insert_symbol(name, symbol)
    }

    #[must_use]
    pub(crate) fn is_declared_locally(&self, name: &str) -> bool {
        self.current_scope
            .as_ref()
            .is_some_and(|scope| scope.borrow().lookup_symbol_local(name).is_some())
    }

    #[must_use]
    pub(crate) fn lookup(&self, name: &str) -> Option<Symbol> {
        self.current_scope
            .as_ref()
            .and_then(|scope| scope.borrow().lookup_symbol(name))
    }

    /// Picks the IR name for a new declaration of `name`.
    pub(crate) fn reserve_ir_name(&mut self, name: &str) -> String {
        let mut candidate = name.to_string();
        if self.ir_names.contains(&candidate) {
            let scope = self.current_scope_name();
            candidate = format!("{scope}_{name}");
            let mut suffix = 1;
            while self.ir_names.contains(&candidate) {
                suffix += 1;
                candidate = format!("{scope}_{name}_{suffix}");
            }
        }
        self.ir_names.insert(candidate.clone());
        candidate
    }
}
