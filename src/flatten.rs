//! Compacts a long history into a minimal set of creation/set commands
//! that replay to the same tree, prepended with a format tag and the
//! archive ID.

use crate::archive::Archive;
use crate::command::CommandCodec;
use crate::descriptor::Slug;
use crate::entry::Entry;
use crate::group::Group;
use crate::westley::ROOT_ID;

/// The format tag this implementation stamps onto flattened histories.
pub const FORMAT_TAG: &str = "buttercup/a";

/// Rewrites an archive's history into an equivalent, bounded-length form.
pub struct Flattener;

impl Flattener {
    /// Produce a flattened history for `archive`. Idempotent: flattening
    /// the result of a flatten reproduces the same lines, since sibling
    /// groups and entries are always emitted in ID order.
    pub fn flatten(archive: &Archive) -> Vec<String> {
        let mut lines = Vec::new();
        lines.push(CommandCodec::build(Slug::Fmt, &[FORMAT_TAG]).raw);
        if let Some(id) = archive.id() {
            lines.push(CommandCodec::build(Slug::Aid, &[&id]).raw);
        }

        let mut attrs: Vec<(String, String)> = archive.attributes().into_iter().collect();
        attrs.sort();
        for (key, value) in attrs {
            lines.push(CommandCodec::build(Slug::Saa, &[&key, &value]).raw);
        }

        let mut groups = archive.groups();
        groups.sort_by_key(|g| g.id());
        for group in &groups {
            Self::flatten_group(group, ROOT_ID, &mut lines);
        }

        return lines;
    }

    /// Flatten if the current history exceeds the configured threshold;
    /// otherwise return the history unchanged.
    pub fn maybe_flatten(archive: &Archive) -> Vec<String> {
        let threshold = archive.config().flatten_threshold;
        let history = archive.history();
        if history.len() > threshold {
            return Self::flatten(archive);
        }
        return history;
    }

    fn flatten_group(group: &Group, parent_id: &str, lines: &mut Vec<String>) {
        let id = group.id();
        lines.push(CommandCodec::build(Slug::Cgr, &[parent_id, &id]).raw);
        lines.push(CommandCodec::build(Slug::Tgr, &[&id, &group.title()]).raw);

        let mut attrs: Vec<(String, String)> = group.attributes().into_iter().collect();
        attrs.sort();
        for (key, value) in attrs {
            lines.push(CommandCodec::build(Slug::Sga, &[&id, &key, &value]).raw);
        }

        let mut entries = group.entries();
        entries.sort_by_key(|e| e.id());
        for entry in &entries {
            Self::flatten_entry(entry, &id, lines);
        }

        let mut children = group.groups();
        children.sort_by_key(|g| g.id());
        for child in &children {
            Self::flatten_group(child, &id, lines);
        }
    }

    fn flatten_entry(entry: &Entry, group_id: &str, lines: &mut Vec<String>) {
        let id = entry.id();
        lines.push(CommandCodec::build(Slug::Cen, &[group_id, &id]).raw);

        let mut props: Vec<(String, String)> = entry.properties().into_iter().collect();
        props.sort();
        for (key, value) in props {
            lines.push(CommandCodec::build(Slug::Sep, &[&id, &key, &value]).raw);
        }

        let mut attrs: Vec<(String, String)> = entry.attributes().into_iter().collect();
        attrs.sort();
        for (key, value) in attrs {
            lines.push(CommandCodec::build(Slug::Sea, &[&id, &key, &value]).raw);
        }
    }
}
