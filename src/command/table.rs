//! Name/alias → command registry for one scope.

use super::Command;
use crate::error::RegistrationError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A table shared between its owner and the commands registered in it.
pub(crate) type SharedTable = Arc<RwLock<CommandTable>>;

/// Many-to-one map from every name and alias to its command.
#[derive(Debug, Default)]
pub struct CommandTable {
    case_insensitive: bool,
    entries: HashMap<String, Arc<Command>>,
}

impl CommandTable {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn shared(case_insensitive: bool) -> SharedTable {
        Arc::new(RwLock::new(Self::new(case_insensitive)))
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    /// Fails if any of the command's names belongs to a different command.
    pub fn check_conflicts(&self, command: &Command) -> Result<(), RegistrationError> {
        for name in command.names() {
            if let Some(existing) = self.entries.get(&self.key(name)) {
                if !std::ptr::eq(Arc::as_ptr(existing), command) {
                    return Err(RegistrationError::Duplicate(name.to_string()));
                }
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, command: Arc<Command>) -> Result<(), RegistrationError> {
        self.check_conflicts(&command)?;
        for name in command.names() {
            let key = self.key(name);
            self.entries.insert(key, Arc::clone(&command));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.entries.get(&self.key(name)).cloned()
    }

    /// Drop every entry pointing at `command`.
    pub fn remove(&mut self, command: &Command) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|_, existing| !std::ptr::eq(Arc::as_ptr(existing), command));
        self.entries.len() != before
    }

    pub fn remove_name(&mut self, name: &str) -> Option<Arc<Command>> {
        let command = self.get(name)?;
        self.remove(&command);
        Some(command)
    }

    /// Remove every command for which `keep` is false; returns them.
    pub fn retain(&mut self, mut keep: impl FnMut(&Arc<Command>) -> bool) -> Vec<Arc<Command>> {
        let dropped: Vec<Arc<Command>> = self
            .unique()
            .into_iter()
            .filter(|command| !keep(command))
            .collect();
        for command in &dropped {
            self.remove(command);
        }
        dropped
    }

    /// Every (name or alias, command) pair, sorted by key.
    pub fn entries(&self) -> Vec<(String, Arc<Command>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Each command once, sorted by name.
    pub fn unique(&self) -> Vec<Arc<Command>> {
        let mut commands: Vec<Arc<Command>> = Vec::new();
        for command in self.entries.values() {
            if !commands.iter().any(|c| Arc::ptr_eq(c, command)) {
                commands.push(Arc::clone(command));
            }
        }
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::handler_fn;

    fn cmd(name: &str, aliases: &[&str]) -> Arc<Command> {
        Command::builder(name, handler_fn(|_, _, _| Box::pin(async { Ok(()) })))
            .aliases(aliases.iter().copied())
            .build()
    }

    #[test]
    fn test_aliases_share_one_command() {
        let mut table = CommandTable::new(false);
        let ping = cmd("ping", &["p", "pong"]);
        table.insert(Arc::clone(&ping)).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.unique().len(), 1);
        assert!(Arc::ptr_eq(&table.get("p").unwrap(), &ping));
        assert!(table.get("PING").is_none());
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut table = CommandTable::new(false);
        table.insert(cmd("ping", &["p"])).unwrap();
        let err = table.insert(cmd("purge", &["p"])).unwrap_err();
        assert_eq!(err, RegistrationError::Duplicate("p".into()));
        assert!(table.get("purge").is_none());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut table = CommandTable::new(true);
        table.insert(cmd("Ping", &[])).unwrap();
        assert!(table.get("PING").is_some());
        assert!(table.insert(cmd("ping", &[])).is_err());
    }

    #[test]
    fn test_remove_name_drops_aliases() {
        let mut table = CommandTable::new(false);
        table.insert(cmd("ping", &["p"])).unwrap();
        let removed = table.remove_name("p").unwrap();
        assert_eq!(removed.name(), "ping");
        assert!(table.is_empty());
    }

    #[test]
    fn test_reinserting_same_command_is_allowed() {
        let mut table = CommandTable::new(false);
        let ping = cmd("ping", &[]);
        table.insert(Arc::clone(&ping)).unwrap();
        table.insert(ping).unwrap();
        assert_eq!(table.len(), 1);
    }
}
