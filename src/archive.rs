//! The `Archive` façade: the root container, backed by a Westley.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::Config;
use crate::descriptor::Slug;
use crate::entry::Entry;
use crate::error::Error;
use crate::group::Group;
use crate::idgen::Inigo;
use crate::westley::Westley;

/// The root of a secrets archive tree. Exclusively owns its Westley;
/// `Group`/`Entry` handles returned from this façade are references that
/// re-resolve against the same Westley on every access.
#[derive(Clone)]
pub struct Archive {
    westley: Rc<RefCell<Westley>>,
}

impl Archive {
    /// Construct a new, empty archive.
    pub fn new(config: Config) -> Archive {
        return Archive { westley: Rc::new(RefCell::new(Westley::new(config))) };
    }

    /// Construct an archive by replaying a history of lines in order.
    /// This is the canonical import path.
    pub fn create_from_history<I, S>(lines: I, config: Config) -> Result<Archive, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let westley = Westley::from_history(config, lines)?;
        return Ok(Archive { westley: Rc::new(RefCell::new(westley)) });
    }

    /// This archive's opaque ID, assigned on first save, if any.
    pub fn id(&self) -> Option<String> {
        return self.westley.borrow().archive_id.clone();
    }

    /// Assign (or reassign) this archive's ID.
    pub fn set_id(&self, id: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Aid, &[id]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// A clone of this archive's free-form attributes.
    pub fn attributes(&self) -> HashMap<String, String> {
        return self.westley.borrow().archive_attributes.clone();
    }

    /// The format tag recorded against this archive's history, if any.
    pub fn format(&self) -> Option<String> {
        return self.westley.borrow().format();
    }

    /// Set a free-form attribute.
    pub fn set_attribute(&self, key: &str, value: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Saa, &[key, value]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Remove a free-form attribute entirely.
    pub fn delete_attribute(&self, key: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Daa, &[key]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// This archive's top-level groups, in order.
    pub fn groups(&self) -> Vec<Group> {
        let w = self.westley.borrow();
        let ids = w.root_children.clone();
        drop(w);
        return ids.into_iter().map(|id| Group::new(self.westley.clone(), id)).collect();
    }

    /// Create a new top-level group.
    pub fn create_group(&self, title: &str) -> Result<Group, Error> {
        let new_id = Inigo::new_id();
        let create = Inigo::command_for(Slug::Cgr, &[crate::westley::ROOT_ID, &new_id]);
        self.westley.borrow_mut().execute(&create.raw)?;
        let set_title = Inigo::command_for(Slug::Tgr, &[&new_id, title]);
        self.westley.borrow_mut().execute(&set_title.raw)?;
        return Ok(Group::new(self.westley.clone(), new_id));
    }

    /// Find a group anywhere in the tree by ID.
    pub fn find_group_by_id(&self, id: &str) -> Option<Group> {
        if self.westley.borrow().groups.contains_key(id) {
            return Some(Group::new(self.westley.clone(), id.to_string()));
        }
        return None;
    }

    /// Find an entry anywhere in the tree by ID.
    pub fn find_entry_by_id(&self, id: &str) -> Option<Entry> {
        if self.westley.borrow().entries.contains_key(id) {
            return Some(Entry::new(self.westley.clone(), id.to_string()));
        }
        return None;
    }

    /// A snapshot copy of the command history. The canonical export path.
    pub fn history(&self) -> Vec<String> {
        return self.westley.borrow().history();
    }

    /// Whether commands have executed since the last `clear_dirty_state`.
    pub fn is_dirty(&self) -> bool {
        return self.westley.borrow().is_dirty();
    }

    /// Clear the dirty flag. Called by the workspace after a successful save.
    pub fn clear_dirty_state(&self) {
        self.westley.borrow_mut().clear_dirty_state();
    }

    pub(crate) fn westley(&self) -> Rc<RefCell<Westley>> {
        return self.westley.clone();
    }

    pub(crate) fn config(&self) -> Config {
        return self.westley.borrow().config().clone();
    }
}
