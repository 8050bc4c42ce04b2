//! The command descriptor: every mutation opcode, its slug, its argument
//! shape, and whether it destroys information on replay.

/// The 3-letter opcode of a history command, together with its argument
/// arity and destructiveness.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slug {
    /// archive set id: `id`
    Aid,
    /// set archive attribute: `key, value`
    Saa,
    /// delete archive attribute: `key`
    Daa,
    /// create group: `parentGroupID, newID`
    Cgr,
    /// set group title: `groupID, title`
    Tgr,
    /// move group: `groupID, newParentID`
    Mgr,
    /// delete group: `groupID`
    Dgr,
    /// set group attribute: `groupID, key, value`
    Sga,
    /// delete group attribute: `groupID, key`
    Dga,
    /// create entry: `groupID, newID`
    Cen,
    /// move entry: `entryID, newGroupID`
    Men,
    /// delete entry: `entryID`
    Den,
    /// set entry property: `entryID, key, value`
    Sep,
    /// delete entry property: `entryID, key`
    Dep,
    /// set entry attribute: `entryID, key, value`
    Sea,
    /// delete entry attribute: `entryID, key`
    Dea,
    /// padding / snapshot anchor: `nonce`
    Pad,
    /// format tag: `formatString`
    Fmt,
}

/// Static facts about a slug, looked up from the descriptor table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub slug: Slug,
    /// The slug as it appears in a history line.
    pub text: &'static str,
    /// Number of positional arguments this command takes.
    pub arity: usize,
    /// Whether replaying this command removes information from the tree.
    pub destructive: bool,
}

const TABLE: &[Descriptor] = &[
    Descriptor { slug: Slug::Aid, text: "aid", arity: 1, destructive: false },
    Descriptor { slug: Slug::Saa, text: "saa", arity: 2, destructive: false },
    Descriptor { slug: Slug::Daa, text: "daa", arity: 1, destructive: true },
    Descriptor { slug: Slug::Cgr, text: "cgr", arity: 2, destructive: false },
    Descriptor { slug: Slug::Tgr, text: "tgr", arity: 2, destructive: false },
    Descriptor { slug: Slug::Mgr, text: "mgr", arity: 2, destructive: false },
    Descriptor { slug: Slug::Dgr, text: "dgr", arity: 1, destructive: true },
    Descriptor { slug: Slug::Sga, text: "sga", arity: 3, destructive: false },
    Descriptor { slug: Slug::Dga, text: "dga", arity: 2, destructive: true },
    Descriptor { slug: Slug::Cen, text: "cen", arity: 2, destructive: false },
    Descriptor { slug: Slug::Men, text: "men", arity: 2, destructive: false },
    Descriptor { slug: Slug::Den, text: "den", arity: 1, destructive: true },
    Descriptor { slug: Slug::Sep, text: "sep", arity: 3, destructive: false },
    Descriptor { slug: Slug::Dep, text: "dep", arity: 2, destructive: true },
    Descriptor { slug: Slug::Sea, text: "sea", arity: 3, destructive: false },
    Descriptor { slug: Slug::Dea, text: "dea", arity: 2, destructive: true },
    Descriptor { slug: Slug::Pad, text: "pad", arity: 1, destructive: false },
    Descriptor { slug: Slug::Fmt, text: "fmt", arity: 1, destructive: false },
];

impl Slug {
    /// Look up the descriptor for this slug.
    pub fn descriptor(&self) -> &'static Descriptor {
        return TABLE.iter().find(|d| d.slug == *self).expect("every Slug has a table entry");
    }

    /// Parse the 3-letter opcode text into a `Slug`, if recognized.
    pub fn from_text(text: &str) -> Option<Slug> {
        return TABLE.iter().find(|d| d.text == text).map(|d| d.slug);
    }

    /// The slug's canonical 3-letter text.
    pub fn text(&self) -> &'static str {
        return self.descriptor().text;
    }

    /// Whether replaying a command with this slug removes information.
    pub fn is_destructive(&self) -> bool {
        return self.descriptor().destructive;
    }

    /// The number of positional arguments this slug's commands take.
    pub fn arity(&self) -> usize {
        return self.descriptor().arity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_slug_round_trips_through_text() {
        for d in TABLE {
            assert_eq!(Slug::from_text(d.text), Some(d.slug));
        }
    }

    #[test]
    fn unknown_text_is_none() {
        assert_eq!(Slug::from_text("xyz"), None);
    }

    #[test]
    fn destructive_slugs_match_spec_table() {
        let destructive = ["daa", "dgr", "dga", "den", "dep", "dea"];
        for d in TABLE {
            assert_eq!(d.destructive, destructive.contains(&d.text), "slug {}", d.text);
        }
    }

    #[test]
    fn pad_is_never_destructive() {
        assert!(!Slug::Pad.is_destructive());
    }
}
