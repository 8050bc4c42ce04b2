//! A single history mutation, and the text codec that serializes it to
//! and parses it from a history line.

use crate::descriptor::Slug;
use crate::error::Error;

/// An immutable, decoded history command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub slug: Slug,
    pub args: Vec<String>,
    pub raw: String,
}

impl Command {
    /// Whether this command removes information on replay.
    pub fn is_destructive(&self) -> bool {
        return self.slug.is_destructive();
    }
}

/// Encodes commands to history lines and parses lines back into commands.
pub struct CommandCodec;

impl CommandCodec {
    /// Build the raw line for a slug and its arguments, then decode it
    /// back into a `Command` carrying that raw text. This keeps `raw`
    /// (the exact text appended to history) and `args` in sync.
    pub fn build(slug: Slug, args: &[&str]) -> Command {
        let raw = Self::encode_line(slug, args);
        return Command { slug, args: args.iter().map(|a| a.to_string()).collect(), raw };
    }

    fn encode_line(slug: Slug, args: &[&str]) -> String {
        let mut line = String::from(slug.text());
        for arg in args {
            line.push(' ');
            line.push_str(&Self::encode_token(arg));
        }
        return line;
    }

    fn needs_quoting(token: &str) -> bool {
        if token.is_empty() {
            return true;
        }
        return token.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');
    }

    fn encode_token(token: &str) -> String {
        if !Self::needs_quoting(token) {
            return token.to_string();
        }
        let mut out = String::with_capacity(token.len() + 2);
        out.push('"');
        for c in token.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
        return out;
    }

    /// Decode a history line into a `Command`.
    pub fn decode(line: &str) -> Result<Command, Error> {
        if line.len() < 3 || !line.is_char_boundary(3) {
            return Err(Error::InvalidCommand(format!("line too short or malformed: {:?}", line)));
        }
        let (slug_text, rest) = line.split_at(3);
        let slug = Slug::from_text(slug_text)
            .ok_or_else(|| Error::InvalidCommand(format!("unknown slug: {:?}", slug_text)))?;

        if !rest.is_empty() && !rest.starts_with(' ') {
            return Err(Error::InvalidCommand(format!("malformed line: {:?}", line)));
        }

        let args = Self::tokenize(rest.trim_start_matches(' '))?;
        if args.len() != slug.arity() {
            return Err(Error::InvalidCommand(format!(
                "slug {} expects {} args, got {}",
                slug.text(),
                slug.arity(),
                args.len()
            )));
        }

        return Ok(Command { slug, args, raw: line.to_string() });
    }

    fn tokenize(rest: &str) -> Result<Vec<String>, Error> {
        if rest.is_empty() {
            return Ok(Vec::new());
        }

        let mut tokens = Vec::new();
        let mut chars = rest.chars().peekable();

        while chars.peek().is_some() {
            while chars.peek() == Some(&' ') {
                chars.next();
            }
            if chars.peek().is_none() {
                break;
            }

            if chars.peek() == Some(&'"') {
                chars.next();
                let mut token = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == '\\' {
                        match chars.next() {
                            Some(escaped @ ('"' | '\\')) => token.push(escaped),
                            Some(other) => {
                                token.push('\\');
                                token.push(other);
                            }
                            None => return Err(Error::InvalidCommand("unterminated escape".into())),
                        }
                    } else if c == '"' {
                        closed = true;
                        break;
                    } else {
                        token.push(c);
                    }
                }
                if !closed {
                    return Err(Error::InvalidCommand("unterminated quoted token".into()));
                }
                tokens.push(token);
            } else {
                let mut token = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ' ' {
                        break;
                    }
                    token.push(c);
                    chars.next();
                }
                tokens.push(token);
            }
        }

        return Ok(tokens);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arbitrary_slug() -> impl Strategy<Value = Slug> {
        return prop_oneof![
            Just(Slug::Aid),
            Just(Slug::Saa),
            Just(Slug::Daa),
            Just(Slug::Cgr),
            Just(Slug::Tgr),
            Just(Slug::Mgr),
            Just(Slug::Dgr),
            Just(Slug::Sga),
            Just(Slug::Dga),
            Just(Slug::Cen),
            Just(Slug::Men),
            Just(Slug::Den),
            Just(Slug::Sep),
            Just(Slug::Dep),
            Just(Slug::Sea),
            Just(Slug::Dea),
            Just(Slug::Pad),
            Just(Slug::Fmt),
        ];
    }

    proptest! {
        #[test]
        fn round_trip_holds_for_arbitrary_args(
            slug in arbitrary_slug(),
            raw_args in prop::collection::vec("[a-zA-Z0-9 \"\\\\_.:/-]{0,12}", 0..4),
        ) {
            let arity = slug.arity();
            let mut args: Vec<String> = raw_args.into_iter().take(arity).collect();
            while args.len() < arity {
                args.push(String::new());
            }
            let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
            let cmd = CommandCodec::build(slug, &arg_refs);
            let decoded = CommandCodec::decode(&cmd.raw).expect("decode");
            prop_assert_eq!(cmd, decoded);
        }
    }
}
