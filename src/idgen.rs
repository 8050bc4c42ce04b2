//! Inigo: generates stable, collision-resistant entity IDs and builds
//! the history line for a command targeting one.
//!
//! Named after the Descriptor-aware command builder in the original
//! design; callers ask for "a `sep` command for entry E, key K, value V"
//! and get back an encoded line plus the decoded `Command`.

use rand_core::OsRng;
use rand_core::RngCore;

use crate::command::{Command, CommandCodec};
use crate::descriptor::Slug;

/// Generates entity IDs and builds command lines from the Descriptor.
pub struct Inigo;

impl Inigo {
    /// Generate a new ID: 64 bits of entropy from the OS RNG, encoded as
    /// lowercase base-36. More than the 48-bit floor required by the
    /// contract, and short enough to stay pleasant in a history line.
    pub fn new_id() -> String {
        let mut bytes = [0u8; 8];
        OsRng.fill_bytes(&mut bytes);
        let value = u64::from_le_bytes(bytes);
        return Self::to_base36(value);
    }

    fn to_base36(mut value: u64) -> String {
        const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        if value == 0 {
            return "0".to_string();
        }
        let mut out = Vec::new();
        while value > 0 {
            out.push(DIGITS[(value % 36) as usize]);
            value /= 36;
        }
        out.reverse();
        return String::from_utf8(out).expect("base36 digits are ascii");
    }

    /// Build the command for a slug and its arguments via the Descriptor
    /// and CommandCodec, so ID assignment and command construction never
    /// drift apart.
    pub fn command_for(slug: Slug, args: &[&str]) -> Command {
        return CommandCodec::build(slug, args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_non_empty() {
        let id = Inigo::new_id();
        assert!(!id.is_empty());
    }

    #[test]
    fn generated_ids_are_base36() {
        let id = Inigo::new_id();
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn many_generated_ids_are_unique() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            let id = Inigo::new_id();
            assert!(seen.insert(id), "collision within 10,000 draws");
        }
    }

    #[test]
    fn command_for_builds_decodable_line() {
        let cmd = Inigo::command_for(Slug::Cen, &["g1", "e1"]);
        assert_eq!(cmd.raw, "cen g1 e1");
    }

    #[test]
    fn zero_encodes_as_single_digit() {
        assert_eq!(Inigo::to_base36(0), "0");
    }
}
