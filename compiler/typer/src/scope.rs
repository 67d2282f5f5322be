//! The scope stack and its symbols.

use ast::BareTy;
use std::fmt::Write;
use utility::{Atom, HashMap};

/// A stack of lexical scopes rooted at a global scope.
///
/// The global scope exists from construction; [`enter`](Self::enter) and
/// [`exit`](Self::exit) calls have to balance and the global scope can never
/// be exited.
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::default()] }
    }

    pub fn enter(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn exit(&mut self) {
        debug_assert!(self.scopes.len() > 1, "attempt to exit the global scope");

        self.scopes.pop();
    }

    /// The nesting depth including the global scope.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare a variable in the innermost scope.
    ///
    /// Fails without inserting anything if the innermost scope already binds
    /// the given name.
    #[must_use]
    pub fn declare(&mut self, binder: Atom, ty: BareTy) -> bool {
        let scope = self.scopes.last_mut().unwrap();

        if scope.bindings.contains_key(&binder) {
            return false;
        }

        scope.bindings.insert(binder, Symbol { ty, kind: SymbolKind::Variable });
        true
    }

    /// Declare a function in the global scope.
    #[must_use]
    pub fn declare_function(&mut self, binder: Atom, ty: BareTy, params: Vec<Parameter>) -> bool {
        let scope = self.scopes.first_mut().unwrap();

        if scope.bindings.contains_key(&binder) {
            return false;
        }

        scope
            .bindings
            .insert(binder, Symbol { ty, kind: SymbolKind::Function(FunctionSymbol { params }) });
        true
    }

    /// Resolve a name, walking from the innermost to the outermost scope.
    pub fn resolve(&self, binder: Atom) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.bindings.get(&binder))
    }

    pub fn resolve_function(&self, binder: Atom) -> Option<(BareTy, &FunctionSymbol)> {
        match self.resolve(binder) {
            Some(Symbol { ty, kind: SymbolKind::Function(function) }) => Some((*ty, function)),
            _ => None,
        }
    }

    /// A deterministic dump of the global scope.
    pub fn render(&self) -> String {
        let mut symbols: Vec<_> = self.scopes[0].bindings.iter().collect();
        symbols.sort_by_key(|(binder, _)| binder.to_str());

        let mut output = String::from("Symbols:\n");
        for (binder, symbol) in symbols {
            match &symbol.kind {
                SymbolKind::Variable => {
                    writeln!(output, "  {binder}: {}", symbol.ty).unwrap();
                }
                SymbolKind::Function(function) => {
                    let params = function
                        .params
                        .iter()
                        .map(|param| format!("{}: {}", param.binder, param.ty))
                        .collect::<Vec<_>>()
                        .join(", ");
                    writeln!(output, "  {binder}: fn({params}) -> {}", symbol.ty).unwrap();
                }
            }
        }
        output
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Scope {
    bindings: HashMap<Atom, Symbol>,
}

pub struct Symbol {
    pub ty: BareTy,
    pub kind: SymbolKind,
}

pub enum SymbolKind {
    Variable,
    Function(FunctionSymbol),
}

pub struct FunctionSymbol {
    pub params: Vec<Parameter>,
}

#[derive(Clone, Copy)]
pub struct Parameter {
    pub binder: Atom,
    pub ty: BareTy,
}
