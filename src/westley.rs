//! Westley: the executor. Holds the live archive tree, applies commands,
//! records executed commands into the history, pads to obscure size, and
//! tracks whether unsaved mutations exist.

use std::collections::HashMap;

use crate::command::{Command, CommandCodec};
use crate::config::Config;
use crate::descriptor::Slug;
use crate::error::Error;
use crate::idgen::Inigo;

/// Sentinel ID naming the archive root as a command's parent/group argument.
pub const ROOT_ID: &str = "0";

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct GroupNode {
    pub id: String,
    pub title: String,
    pub attributes: HashMap<String, String>,
    /// `None` means the parent is the archive root.
    pub parent: Option<String>,
    pub children_groups: Vec<String>,
    pub children_entries: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EntryNode {
    pub id: String,
    pub parent: String,
    pub properties: HashMap<String, String>,
    pub attributes: HashMap<String, String>,
}

/// The executor: live tree plus the history that produced it.
pub struct Westley {
    config: Config,
    pub(crate) archive_id: Option<String>,
    pub(crate) archive_attributes: HashMap<String, String>,
    pub(crate) format: Option<String>,
    pub(crate) groups: HashMap<String, GroupNode>,
    pub(crate) entries: HashMap<String, EntryNode>,
    pub(crate) root_children: Vec<String>,
    history: Vec<String>,
    dirty: bool,
    commands_since_pad: u32,
}

impl Westley {
    /// Construct an empty Westley with the given configuration.
    pub fn new(config: Config) -> Westley {
        return Westley {
            config,
            archive_id: None,
            archive_attributes: HashMap::new(),
            format: None,
            groups: HashMap::new(),
            entries: HashMap::new(),
            root_children: Vec::new(),
            history: Vec::new(),
            dirty: false,
            commands_since_pad: 0,
        };
    }

    /// Construct a Westley by replaying a history of lines in order.
    pub fn from_history<I, S>(config: Config, lines: I) -> Result<Westley, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut westley = Westley::new(config);
        for line in lines {
            westley.execute(line.as_ref())?;
        }
        if let Err(e) = westley.verify_invariants() {
            e.abort_on_internal_invariant();
        }
        return Ok(westley);
    }

    /// Post-replay structural sanity check: every parent/child reference
    /// in the tree must resolve to an entity that actually exists. A
    /// violation here means the executor applied a command inconsistently
    /// with its own bookkeeping and the tree can no longer be trusted.
    fn verify_invariants(&self) -> Result<(), Error> {
        for id in &self.root_children {
            if !self.groups.contains_key(id) {
                return Err(Error::InternalInvariant(format!("root references missing group {}", id)));
            }
        }
        for group in self.groups.values() {
            for child in &group.children_groups {
                match self.groups.get(child) {
                    Some(child_node) if child_node.parent.as_deref() == Some(group.id.as_str()) => {}
                    Some(_) => {
                        return Err(Error::InternalInvariant(format!(
                            "group {} lists child {} whose parent pointer disagrees",
                            group.id, child
                        )));
                    }
                    None => {
                        return Err(Error::InternalInvariant(format!(
                            "group {} references missing child group {}",
                            group.id, child
                        )));
                    }
                }
            }
            for entry_id in &group.children_entries {
                match self.entries.get(entry_id) {
                    Some(entry) if entry.parent == group.id => {}
                    Some(_) => {
                        return Err(Error::InternalInvariant(format!(
                            "group {} lists entry {} whose parent pointer disagrees",
                            group.id, entry_id
                        )));
                    }
                    None => {
                        return Err(Error::InternalInvariant(format!(
                            "group {} references missing entry {}",
                            group.id, entry_id
                        )));
                    }
                }
            }
        }
        for entry in self.entries.values() {
            if !self.groups.contains_key(&entry.parent) {
                return Err(Error::InternalInvariant(format!(
                    "entry {} has missing parent group {}",
                    entry.id, entry.parent
                )));
            }
        }
        return Ok(());
    }

    /// Decode and apply one history line, appending it verbatim to the
    /// history on success and marking the executor dirty. Leaves all
    /// state unchanged on failure.
    pub fn execute(&mut self, line: &str) -> Result<(), Error> {
        let cmd = CommandCodec::decode(line)?;
        self.apply(&cmd)?;
        self.history.push(line.to_string());
        self.dirty = true;

        if cmd.slug != Slug::Pad {
            self.commands_since_pad += 1;
            if self.config.padding_cadence > 0 && self.commands_since_pad >= self.config.padding_cadence {
                self.commands_since_pad = 0;
                self.insert_pad();
            }
        } else {
            tracing::trace!("replayed padding line");
        }

        tracing::debug!(slug = cmd.slug.text(), "executed command");
        return Ok(());
    }

    fn insert_pad(&mut self) {
        let nonce = Inigo::new_id();
        let cmd = Inigo::command_for(Slug::Pad, &[&nonce]);
        self.history.push(cmd.raw);
    }

    /// Reset the tree and history to empty. Clears the dirty flag.
    pub fn clear(&mut self) {
        self.archive_id = None;
        self.archive_attributes.clear();
        self.format = None;
        self.groups.clear();
        self.entries.clear();
        self.root_children.clear();
        self.history.clear();
        self.dirty = false;
        self.commands_since_pad = 0;
    }

    /// Clear the dirty flag without touching the tree or history.
    pub fn clear_dirty_state(&mut self) {
        self.dirty = false;
    }

    /// Whether commands have executed since the last `clear_dirty_state`.
    pub fn is_dirty(&self) -> bool {
        return self.dirty;
    }

    /// A snapshot copy of the history lines.
    pub fn history(&self) -> Vec<String> {
        return self.history.clone();
    }

    pub fn config(&self) -> &Config {
        return &self.config;
    }

    /// The archive's format tag, if a `Slug::Fmt` line has ever executed.
    pub fn format(&self) -> Option<String> {
        return self.format.clone();
    }

    fn entity_exists(&self, id: &str) -> bool {
        return self.groups.contains_key(id) || self.entries.contains_key(id);
    }

    /// Whether `candidate` is `ancestor` or lies within its group subtree.
    fn is_within_subtree(&self, ancestor: &str, candidate: &str) -> bool {
        if ancestor == candidate {
            return true;
        }
        let Some(group) = self.groups.get(ancestor) else {
            return false;
        };
        for child in &group.children_groups {
            if self.is_within_subtree(child, candidate) {
                return true;
            }
        }
        return false;
    }

    fn apply(&mut self, cmd: &Command) -> Result<(), Error> {
        match cmd.slug {
            Slug::Aid => {
                self.archive_id = Some(cmd.args[0].clone());
            }
            Slug::Saa => {
                self.archive_attributes.insert(cmd.args[0].clone(), cmd.args[1].clone());
            }
            Slug::Daa => {
                self.archive_attributes.remove(&cmd.args[0]);
            }
            Slug::Cgr => {
                let parent = &cmd.args[0];
                let new_id = &cmd.args[1];
                if self.entity_exists(new_id) {
                    return Err(Error::DuplicateID(new_id.clone()));
                }
                if parent != ROOT_ID && !self.groups.contains_key(parent) {
                    return Err(Error::EntityNotFound(parent.clone()));
                }
                let node = GroupNode {
                    id: new_id.clone(),
                    title: String::new(),
                    attributes: HashMap::new(),
                    parent: if parent == ROOT_ID { None } else { Some(parent.clone()) },
                    children_groups: Vec::new(),
                    children_entries: Vec::new(),
                };
                self.groups.insert(new_id.clone(), node);
                if parent == ROOT_ID {
                    self.root_children.push(new_id.clone());
                } else {
                    self.groups.get_mut(parent).unwrap().children_groups.push(new_id.clone());
                }
            }
            Slug::Tgr => {
                let group_id = &cmd.args[0];
                if !self.groups.contains_key(group_id) {
                    return Err(Error::EntityNotFound(group_id.clone()));
                }
                self.groups.get_mut(group_id).unwrap().title = cmd.args[1].clone();
            }
            Slug::Mgr => {
                let group_id = &cmd.args[0];
                let new_parent = &cmd.args[1];
                if !self.groups.contains_key(group_id) {
                    return Err(Error::EntityNotFound(group_id.clone()));
                }
                if new_parent != ROOT_ID && !self.groups.contains_key(new_parent) {
                    return Err(Error::EntityNotFound(new_parent.clone()));
                }
                if self.is_within_subtree(group_id, new_parent) {
                    return Err(Error::InvalidMove(format!(
                        "cannot move group {} into its own descendant {}",
                        group_id, new_parent
                    )));
                }

                let old_parent = self.groups.get(group_id).unwrap().parent.clone();
                match &old_parent {
                    None => self.root_children.retain(|id| id != group_id),
                    Some(p) => self.groups.get_mut(p).unwrap().children_groups.retain(|id| id != group_id),
                }

                if new_parent == ROOT_ID {
                    self.groups.get_mut(group_id).unwrap().parent = None;
                    self.root_children.push(group_id.clone());
                } else {
                    self.groups.get_mut(group_id).unwrap().parent = Some(new_parent.clone());
                    self.groups.get_mut(new_parent).unwrap().children_groups.push(group_id.clone());
                }
            }
            Slug::Dgr => {
                let group_id = &cmd.args[0];
                if !self.groups.contains_key(group_id) {
                    return Err(Error::EntityNotFound(group_id.clone()));
                }
                let parent = self.groups.get(group_id).unwrap().parent.clone();
                self.delete_group_subtree(group_id);
                match parent {
                    None => self.root_children.retain(|id| id != group_id),
                    Some(p) => {
                        if let Some(pg) = self.groups.get_mut(&p) {
                            pg.children_groups.retain(|id| id != group_id);
                        }
                    }
                }
            }
            Slug::Sga => {
                let group_id = &cmd.args[0];
                if !self.groups.contains_key(group_id) {
                    return Err(Error::EntityNotFound(group_id.clone()));
                }
                self.groups.get_mut(group_id).unwrap().attributes.insert(cmd.args[1].clone(), cmd.args[2].clone());
            }
            Slug::Dga => {
                let group_id = &cmd.args[0];
                if !self.groups.contains_key(group_id) {
                    return Err(Error::EntityNotFound(group_id.clone()));
                }
                self.groups.get_mut(group_id).unwrap().attributes.remove(&cmd.args[1]);
            }
            Slug::Cen => {
                let group_id = &cmd.args[0];
                let new_id = &cmd.args[1];
                if self.entity_exists(new_id) {
                    return Err(Error::DuplicateID(new_id.clone()));
                }
                if !self.groups.contains_key(group_id) {
                    return Err(Error::EntityNotFound(group_id.clone()));
                }
                let node = EntryNode {
                    id: new_id.clone(),
                    parent: group_id.clone(),
                    properties: HashMap::new(),
                    attributes: HashMap::new(),
                };
                self.entries.insert(new_id.clone(), node);
                self.groups.get_mut(group_id).unwrap().children_entries.push(new_id.clone());
            }
            Slug::Men => {
                let entry_id = &cmd.args[0];
                let new_group = &cmd.args[1];
                if !self.entries.contains_key(entry_id) {
                    return Err(Error::EntityNotFound(entry_id.clone()));
                }
                if !self.groups.contains_key(new_group) {
                    return Err(Error::EntityNotFound(new_group.clone()));
                }
                let old_group = self.entries.get(entry_id).unwrap().parent.clone();
                if let Some(g) = self.groups.get_mut(&old_group) {
                    g.children_entries.retain(|id| id != entry_id);
                }
                self.groups.get_mut(new_group).unwrap().children_entries.push(entry_id.clone());
                self.entries.get_mut(entry_id).unwrap().parent = new_group.clone();
            }
            Slug::Den => {
                let entry_id = &cmd.args[0];
                if !self.entries.contains_key(entry_id) {
                    return Err(Error::EntityNotFound(entry_id.clone()));
                }
                let group_id = self.entries.get(entry_id).unwrap().parent.clone();
                self.entries.remove(entry_id);
                if let Some(g) = self.groups.get_mut(&group_id) {
                    g.children_entries.retain(|id| id != entry_id);
                }
            }
            Slug::Sep => {
                let entry_id = &cmd.args[0];
                if !self.entries.contains_key(entry_id) {
                    return Err(Error::EntityNotFound(entry_id.clone()));
                }
                self.entries.get_mut(entry_id).unwrap().properties.insert(cmd.args[1].clone(), cmd.args[2].clone());
            }
            Slug::Dep => {
                let entry_id = &cmd.args[0];
                if !self.entries.contains_key(entry_id) {
                    return Err(Error::EntityNotFound(entry_id.clone()));
                }
                self.entries.get_mut(entry_id).unwrap().properties.remove(&cmd.args[1]);
            }
            Slug::Sea => {
                let entry_id = &cmd.args[0];
                if !self.entries.contains_key(entry_id) {
                    return Err(Error::EntityNotFound(entry_id.clone()));
                }
                self.entries.get_mut(entry_id).unwrap().attributes.insert(cmd.args[1].clone(), cmd.args[2].clone());
            }
            Slug::Dea => {
                let entry_id = &cmd.args[0];
                if !self.entries.contains_key(entry_id) {
                    return Err(Error::EntityNotFound(entry_id.clone()));
                }
                self.entries.get_mut(entry_id).unwrap().attributes.remove(&cmd.args[1]);
            }
            Slug::Pad => {
                // no-op by contract
            }
            Slug::Fmt => {
                self.format = Some(cmd.args[0].clone());
            }
        }
        return Ok(());
    }

    fn delete_group_subtree(&mut self, group_id: &str) {
        let (child_groups, child_entries) = match self.groups.get(group_id) {
            Some(g) => (g.children_groups.clone(), g.children_entries.clone()),
            None => return,
        };
        for child in &child_groups {
            self.delete_group_subtree(child);
        }
        for entry in &child_entries {
            self.entries.remove(entry);
        }
        self.groups.remove(group_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn westley() -> Westley {
        return Westley::new(Config::default());
    }

    #[test]
    fn create_group_at_root() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        assert!(w.groups.contains_key("g1"));
        assert_eq!(w.root_children, vec!["g1".to_string()]);
    }

    #[test]
    fn fmt_line_sets_format_and_survives_clear() {
        let mut w = westley();
        assert_eq!(w.format(), None);
        w.execute("fmt buttercup/a").unwrap();
        assert_eq!(w.format(), Some("buttercup/a".to_string()));
        w.clear();
        assert_eq!(w.format(), None);
    }

    #[test]
    fn verify_invariants_passes_on_normal_replay() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.execute("cen g1 e1").unwrap();
        assert!(w.verify_invariants().is_ok());
    }

    #[test]
    fn verify_invariants_catches_dangling_root_reference() {
        let mut w = westley();
        w.root_children.push("ghost".to_string());
        assert!(matches!(w.verify_invariants(), Err(Error::InternalInvariant(_))));
    }

    #[test]
    fn verify_invariants_catches_group_with_missing_child_entry() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.groups.get_mut("g1").unwrap().children_entries.push("ghost-entry".to_string());
        assert!(matches!(w.verify_invariants(), Err(Error::InternalInvariant(_))));
    }

    #[test]
    fn verify_invariants_catches_entry_with_missing_parent_group() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.execute("cen g1 e1").unwrap();
        w.entries.get_mut("e1").unwrap().parent = "missing-group".to_string();
        assert!(matches!(w.verify_invariants(), Err(Error::InternalInvariant(_))));
    }

    #[test]
    fn create_group_duplicate_id_fails_and_state_unchanged() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        let before = w.history();
        assert!(w.execute("cgr 0 g1").is_err());
        assert_eq!(w.history(), before);
    }

    #[test]
    fn create_group_missing_parent_fails() {
        let mut w = westley();
        assert!(w.execute("cgr missing g1").is_err());
    }

    #[test]
    fn delete_group_removes_subtree() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.execute("cgr g1 g2").unwrap();
        w.execute("cen g2 e1").unwrap();
        w.execute("dgr g1").unwrap();
        assert!(!w.groups.contains_key("g1"));
        assert!(!w.groups.contains_key("g2"));
        assert!(!w.entries.contains_key("e1"));
        assert!(w.root_children.is_empty());
    }

    #[test]
    fn move_group_into_own_descendant_is_invalid_move() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.execute("cgr g1 g2").unwrap();
        let err = w.execute("mgr g1 g2").unwrap_err();
        assert!(matches!(err, Error::InvalidMove(_)));
    }

    #[test]
    fn move_group_into_self_is_invalid_move() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        assert!(matches!(w.execute("mgr g1 g1").unwrap_err(), Error::InvalidMove(_)));
    }

    #[test]
    fn move_entry_between_groups() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.execute("cgr 0 g2").unwrap();
        w.execute("cen g1 e1").unwrap();
        w.execute("men e1 g2").unwrap();
        assert_eq!(w.entries.get("e1").unwrap().parent, "g2");
        assert!(w.groups.get("g1").unwrap().children_entries.is_empty());
        assert_eq!(w.groups.get("g2").unwrap().children_entries, vec!["e1".to_string()]);
    }

    #[test]
    fn set_and_delete_entry_property() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.execute("cen g1 e1").unwrap();
        w.execute("sep e1 password hunter2").unwrap();
        assert_eq!(w.entries.get("e1").unwrap().properties.get("password").unwrap(), "hunter2");
        w.execute("dep e1 password").unwrap();
        assert!(!w.entries.get("e1").unwrap().properties.contains_key("password"));
    }

    #[test]
    fn entry_cannot_be_created_directly_under_root() {
        let mut w = westley();
        assert!(w.execute("cen 0 e1").is_err());
    }

    #[test]
    fn invalid_command_is_rejected() {
        let mut w = westley();
        assert!(w.execute("xyz a b").is_err());
        assert!(w.history().is_empty());
        assert!(!w.is_dirty());
    }

    #[test]
    fn dirty_tracking() {
        let mut w = westley();
        assert!(!w.is_dirty());
        w.execute("cgr 0 g1").unwrap();
        assert!(w.is_dirty());
        w.clear_dirty_state();
        assert!(!w.is_dirty());
    }

    #[test]
    fn clear_resets_everything() {
        let mut w = westley();
        w.execute("cgr 0 g1").unwrap();
        w.clear();
        assert!(w.groups.is_empty());
        assert!(w.history().is_empty());
        assert!(!w.is_dirty());
    }

    #[test]
    fn padding_is_inserted_at_cadence() {
        let mut w = Westley::new(Config::new(2, 500, Config::MIN_PBKDF2_ITERATIONS));
        w.execute("cgr 0 g1").unwrap();
        w.execute("cgr 0 g2").unwrap();
        let history = w.history();
        assert!(history.iter().any(|l| l.starts_with("pad ")));
    }

    #[test]
    fn padding_disabled_when_cadence_zero() {
        let mut w = Westley::new(Config::new(0, 500, Config::MIN_PBKDF2_ITERATIONS));
        for _ in 0..10 {
            w.execute(&format!("cgr 0 {}", Inigo::new_id())).unwrap();
        }
        assert!(w.history().iter().all(|l| !l.starts_with("pad ")));
    }

    #[test]
    fn padding_does_not_change_replayed_tree() {
        let mut w = Westley::new(Config::new(1, 500, Config::MIN_PBKDF2_ITERATIONS));
        w.execute("cgr 0 g1").unwrap();
        w.execute("tgr g1 Banking").unwrap();
        let padded_history = w.history();
        assert!(padded_history.iter().any(|l| l.starts_with("pad ")));

        let stripped: Vec<&String> = padded_history.iter().filter(|l| !l.starts_with("pad ")).collect();
        let replayed = Westley::from_history(Config::default(), stripped.iter().map(|s| s.as_str())).unwrap();
        assert_eq!(replayed.groups.get("g1").unwrap().title, "Banking");
    }
}
