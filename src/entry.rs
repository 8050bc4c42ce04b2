//! The `Entry` façade: a reference to a leaf in the archive tree. Never
//! an owner — every access re-resolves against the owning Westley.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::descriptor::Slug;
use crate::error::Error;
use crate::idgen::Inigo;
use crate::westley::Westley;

/// A reference to an entry (leaf) in an archive's tree.
#[derive(Clone)]
pub struct Entry {
    pub(crate) westley: Rc<RefCell<Westley>>,
    pub(crate) id: String,
}

impl Entry {
    pub(crate) fn new(westley: Rc<RefCell<Westley>>, id: String) -> Entry {
        return Entry { westley, id };
    }

    /// This entry's stable ID.
    pub fn id(&self) -> String {
        return self.id.clone();
    }

    /// The ID of the group this entry currently belongs to, if it still
    /// exists in the tree.
    pub fn parent_id(&self) -> Option<String> {
        let w = self.westley.borrow();
        return w.entries.get(&self.id).map(|e| e.parent.clone());
    }

    /// A clone of this entry's properties (username, password, url, ...).
    pub fn properties(&self) -> HashMap<String, String> {
        let w = self.westley.borrow();
        return w.entries.get(&self.id).map(|e| e.properties.clone()).unwrap_or_default();
    }

    /// A clone of this entry's free-form attributes.
    pub fn attributes(&self) -> HashMap<String, String> {
        let w = self.westley.borrow();
        return w.entries.get(&self.id).map(|e| e.attributes.clone()).unwrap_or_default();
    }

    /// Whether this entry still exists in the tree.
    pub fn exists(&self) -> bool {
        return self.westley.borrow().entries.contains_key(&self.id);
    }

    /// Set a property. The empty string is a valid value; use
    /// `delete_property` to remove a key entirely.
    pub fn set_property(&self, key: &str, value: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Sep, &[&self.id, key, value]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Remove a property entirely.
    pub fn delete_property(&self, key: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Dep, &[&self.id, key]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Set a free-form attribute.
    pub fn set_attribute(&self, key: &str, value: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Sea, &[&self.id, key, value]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Remove a free-form attribute entirely.
    pub fn delete_attribute(&self, key: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Dea, &[&self.id, key]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Move this entry to a different group.
    pub fn move_to(&self, group_id: &str) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Men, &[&self.id, group_id]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }

    /// Delete this entry from the tree.
    pub fn delete(&self) -> Result<(), Error> {
        let cmd = Inigo::command_for(Slug::Den, &[&self.id]);
        return self.westley.borrow_mut().execute(&cmd.raw);
    }
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Entry {{ id: {} }}", self.id);
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        return self.id == other.id;
    }
}

#[cfg(test)]
mod tests {
    use crate::archive::Archive;
    use crate::config::Config;

    #[test]
    fn set_property_then_read_back() {
        let archive = Archive::new(Config::default());
        let group = archive.create_group("Banking").unwrap();
        let entry = group.create_entry().unwrap();
        entry.set_property("username", "alice").unwrap();
        entry.set_property("password", "p").unwrap();
        let props = entry.properties();
        assert_eq!(props.get("username").unwrap(), "alice");
        assert_eq!(props.get("password").unwrap(), "p");
    }

    #[test]
    fn empty_string_is_a_valid_property_value() {
        let archive = Archive::new(Config::default());
        let group = archive.create_group("G").unwrap();
        let entry = group.create_entry().unwrap();
        entry.set_property("note", "").unwrap();
        assert_eq!(entry.properties().get("note").unwrap(), "");
    }

    #[test]
    fn delete_property_removes_key() {
        let archive = Archive::new(Config::default());
        let group = archive.create_group("G").unwrap();
        let entry = group.create_entry().unwrap();
        entry.set_property("note", "x").unwrap();
        entry.delete_property("note").unwrap();
        assert!(!entry.properties().contains_key("note"));
    }

    #[test]
    fn deleted_entry_no_longer_exists() {
        let archive = Archive::new(Config::default());
        let group = archive.create_group("G").unwrap();
        let entry = group.create_entry().unwrap();
        entry.delete().unwrap();
        assert!(!entry.exists());
        assert!(entry.properties().is_empty());
    }

    #[test]
    fn move_to_changes_parent_group() {
        let archive = Archive::new(Config::default());
        let g1 = archive.create_group("G1").unwrap();
        let g2 = archive.create_group("G2").unwrap();
        let entry = g1.create_entry().unwrap();
        entry.move_to(&g2.id()).unwrap();
        assert_eq!(entry.parent_id().unwrap(), g2.id());
    }
}
