use std::collections::HashMap;

/// A type in the source language. There is only one so far, but the
/// declaration machinery does not depend on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    Int,
}

#[derive(Debug, Clone, Default)]
pub struct SymbolEntry {
    pub ty: Option<SourceType>,
}

/// Identifier table shared by the lexer and the type-propagation pass.
///
/// The lexer registers every identifier it sees with an unset type; the
/// semantic observer fills the type in when the declaration is reduced.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolEntry>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identifier if it is not present yet.
    pub fn add(&mut self, name: &str) {
        self.entries.entry(name.to_string()).or_default();
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(name)
    }

    /// Record the declared type of an identifier. Fails if the identifier
    /// already carries a type, which makes a second declaration an error.
    pub fn set_type(&mut self, name: &str, ty: SourceType) -> Result<(), SourceType> {
        let entry = self.entries.entry(name.to_string()).or_default();
        if let Some(existing) = entry.ty {
            return Err(existing);
        }
        entry.ty = Some(ty);
        Ok(())
    }
}
