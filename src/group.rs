//! The `Group` façade: a reference to a node in the archive tree. Never
//! an owner — every access re-resolves against the owning Westley.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::descriptor::Slug;
use crate::entry::Entry;
use crate::error::Error;
use crate::idgen::Inigo;
use crate::westley::{Westley, ROOT_ID};

/// A reference to a group (container) in an archive's tree.
#[derive(Clone)]
pub struct Group {
    pub(crate) westley: Rc<RefCell<Westley>>,
    pub(crate) id: String,
}

impl Group {
    pub(crate) fn new(westley: Rc<RefCell<Westley>>, id: String) -> Group {
        return Group { westley, id };
    }

    /// This group's stable ID.
    pub fn id(&self) -> String {
        return self.id.clone();
    }

    /// Whether this group still exists in the tree.
    pub fn exists(&self) -> bool {
        return self.westley.borrow().groups.contains_key(&self.id);
    }

    /// The group's title, or the empty string if it no longer exists.
    pub fn title(&self) -> String {
        let w = self.westley.borrow();
        return w.groups.get(&self.id).map(|g| g.title.clone()).unwrap_or_default();
    }

    /// A clone of this group's free-form attributes.
    pub fn attributes(&self) -> HashMap<String, String> {
        let w = self.westley.borrow();
        return w.groups.get(&self.id).map(|g| g.attributes.clone()).unwrap_or_default();
    }

    /// The parent group's ID, or `None` if this group is top-level
    /// (parented directly to the archive root) or no longer exists.
    pub fn parent_id(&self) -> Option<String> {
        let w = self.westley.borrow();
        return w.groups.get(&self.id).and_then(|g| g.parent.clone());
    }

    /// This group's direct child groups, in order.
    pub fn groups(&self) -> Vec<Group> {
        let w = self.westley.borrow();
        let ids = w.groups.get(&self.id).map(|g| g.children_groups.clone()).unwrap_or_default();
        drop(w);
        return ids.into_iter().map(|id| Group::new(self.westley.clone(), id)).collect();
    }

    /// This group's direct child entries, in order.
    pub fn entries(&self) -> Vec<Entry> {
        let w = self.westley.borrow();
        let ids = w.groups.get(&self.id).map(|g| g.children_entries.clone()).unwrap_or_default();
        drop(w);
        return ids.into_iter().map(|id| Entry::new(self.westley.clone(), id)).collect();
    }

    /// Set this group's title.
    pub fn set_title(&self, title: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Tgr, &[&self.id, title]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Set a free-form attribute.
    pub fn set_attribute(&self, key: &str, value: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Sga, &[&self.id, key, value]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Remove a free-form attribute entirely.
    pub fn delete_attribute(&self, key: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Dga, &[&self.id, key]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Move this group to become a child of `new_parent_id`, or of the
    /// archive root if `new_parent_id` is `None`. Rejects moving a group
    /// into its own descendant with [`Error::InvalidMove`].
    pub fn move_to(&self, new_parent_id: Option<&str>) -> Result<(), Error> {
        let parent = new_parent_id.unwrap_or(ROOT_ID);
        let cmd = Inigo::command_for(Slug::Mgr, &[&self.id, parent]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Delete this group and its entire subtree.
    pub fn delete(&self) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Dgr, &[&self.id]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Create a child group under this group.
    pub fn create_group(&self, title: &str) -> Result<Group, Error> {
        let new_id = Inigo::new_id();
        let create = Inigo::command_for(Slug::Cgr, &[&self.id, &new_id]);
        self.westley.borrow_mut().execute(&create.raw)?;
        let set_title = Inigo::command_for(Slug::Tgr, &[&new_id, title]);
        self.westley.borrow_mut().execute(&set_title.raw)?;
        return Ok(Group::new(self.westley.clone(), new_id));
    }

    /// Create a new entry under this group.
    pub fn create_entry(&self) -> Result<Entry, Error> {
        let new_id = Inigo::new_id();
        let cmd = Inigo::command_for(Slug::Cen, &[&self.id, &new_id]);
        self.westley.borrow_mut().execute(&cmd.raw)?;
        return Ok(Entry::new(self.westley.clone(), new_id));
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Group {{ id: {} }}", self.id);
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        return self.id == other.id;
    }
}
