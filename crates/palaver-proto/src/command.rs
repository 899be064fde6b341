//! Command segmentation and decoding.
//!
//! A received chunk may carry several commands back to back: every `/` in
//! the input opens a new segment, and the first segment starts at position
//! zero even when it carries no slash at all. Each segment is decoded
//! independently.
//!
//! Keyword detection is substring-based rather than prefix-exact: a segment
//! matches a command when it contains the keyword followed by a space. The
//! splitter guarantees a segment holds at most one `/` (at its start), so in
//! practice a matched keyword always sits at the front of its segment.

/// One decoded command segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/exit` - terminate the session. Matched exactly, and abandons the
    /// rest of the line it arrived on.
    Exit,

    /// `/broadcast <text>` - message every other connected client.
    Broadcast {
        /// Message text, verbatim remainder of the segment.
        body: String,
    },

    /// `/msg <user> <text>` - message one client by username.
    Direct {
        /// First whitespace-delimited token after the keyword.
        recipient: String,
        /// Verbatim remainder after the recipient token.
        body: String,
    },

    /// `/group_msg <group> <text>` - message the members of a group.
    Group {
        /// First whitespace-delimited token after the keyword.
        group: String,
        /// Verbatim remainder after the group token.
        body: String,
    },

    /// `/create_group <name>` - create a new group.
    CreateGroup {
        /// Group name, verbatim remainder of the segment.
        name: String,
    },

    /// `/join_group <name>` - join an existing group.
    JoinGroup {
        /// Group name, verbatim remainder of the segment.
        name: String,
    },

    /// `/leave_group <name>` - leave a group.
    LeaveGroup {
        /// Group name, verbatim remainder of the segment.
        name: String,
    },

    /// A `/msg` or `/group_msg` without both arguments.
    Syntax,

    /// Anything else, including a bare `/` and unrecognized keywords.
    Unknown,
}

const EXIT: &str = "/exit";
const MSG: &str = "/msg ";
const GROUP_MSG: &str = "/group_msg ";
const BROADCAST: &str = "/broadcast ";
const CREATE_GROUP: &str = "/create_group ";
const JOIN_GROUP: &str = "/join_group ";
const LEAVE_GROUP: &str = "/leave_group ";

/// Split a received line at every `/` boundary.
///
/// The first segment begins at position 0; each later segment begins at a
/// `/`. A `/` always opens a new segment, even when the previous segment is
/// incomplete, so command bodies cannot themselves carry a slash.
///
/// The concatenation of the returned segments is always the input.
pub fn split_segments(line: &str) -> Vec<&str> {
    if line.is_empty() {
        return Vec::new();
    }

    // '/' is ASCII, so byte positions of slashes are valid slice boundaries.
    let mut starts = vec![0];
    for (index, byte) in line.bytes().enumerate() {
        if byte == b'/' && index != 0 {
            starts.push(index);
        }
    }

    let mut segments = Vec::with_capacity(starts.len());
    for (position, &start) in starts.iter().enumerate() {
        let end = starts.get(position + 1).copied().unwrap_or(line.len());
        segments.push(&line[start..end]);
    }

    segments
}

/// Parse a received line into its ordered command sequence.
///
/// Never fails: unrecognized segments decode to [`Command::Unknown`] and
/// malformed argument lists to [`Command::Syntax`]. Empty segments are
/// skipped.
pub fn parse_line(line: &str) -> Vec<Command> {
    split_segments(line)
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .map(decode_segment)
        .collect()
}

/// Decode a single segment.
fn decode_segment(segment: &str) -> Command {
    if segment == EXIT {
        return Command::Exit;
    }

    if segment.contains(MSG) {
        return match split_argument(segment, MSG.len()) {
            Some((recipient, body)) => Command::Direct {
                recipient: recipient.to_string(),
                body: body.to_string(),
            },
            None => Command::Syntax,
        };
    }

    if segment.contains(GROUP_MSG) {
        return match split_argument(segment, GROUP_MSG.len()) {
            Some((group, body)) => Command::Group {
                group: group.to_string(),
                body: body.to_string(),
            },
            None => Command::Syntax,
        };
    }

    if segment.contains(BROADCAST) {
        return Command::Broadcast { body: remainder(segment, BROADCAST.len()) };
    }

    if segment.contains(CREATE_GROUP) {
        return Command::CreateGroup { name: remainder(segment, CREATE_GROUP.len()) };
    }

    if segment.contains(JOIN_GROUP) {
        return Command::JoinGroup { name: remainder(segment, JOIN_GROUP.len()) };
    }

    if segment.contains(LEAVE_GROUP) {
        return Command::LeaveGroup { name: remainder(segment, LEAVE_GROUP.len()) };
    }

    Command::Unknown
}

/// Split `<keyword><token> <rest>` at the first space after the keyword.
///
/// Returns `None` when no such space exists (the second argument is
/// missing).
fn split_argument(segment: &str, keyword_len: usize) -> Option<(&str, &str)> {
    let tail = segment.get(keyword_len..)?;
    let space = tail.find(' ')?;
    Some((tail.get(..space)?, tail.get(space + 1..)?))
}

/// Everything after the keyword, verbatim.
fn remainder(segment: &str, keyword_len: usize) -> String {
    segment.get(keyword_len..).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_is_matched_exactly() {
        assert_eq!(parse_line("/exit"), vec![Command::Exit]);
        assert_eq!(parse_line("/exit now"), vec![Command::Unknown]);
    }

    #[test]
    fn direct_message_splits_recipient_and_body() {
        assert_eq!(parse_line("/msg bob hello there"), vec![Command::Direct {
            recipient: "bob".to_string(),
            body: "hello there".to_string(),
        }]);
    }

    #[test]
    fn direct_message_without_body_is_syntax_error() {
        assert_eq!(parse_line("/msg bob"), vec![Command::Syntax]);
        assert_eq!(parse_line("/msg"), vec![Command::Unknown]);
    }

    #[test]
    fn direct_message_with_trailing_space_has_empty_body() {
        assert_eq!(parse_line("/msg bob "), vec![Command::Direct {
            recipient: "bob".to_string(),
            body: String::new(),
        }]);
    }

    #[test]
    fn group_message_splits_group_and_body() {
        assert_eq!(parse_line("/group_msg team hi all"), vec![Command::Group {
            group: "team".to_string(),
            body: "hi all".to_string(),
        }]);
        assert_eq!(parse_line("/group_msg team"), vec![Command::Syntax]);
    }

    #[test]
    fn broadcast_keeps_remainder_verbatim() {
        assert_eq!(parse_line("/broadcast hello  world "), vec![Command::Broadcast {
            body: "hello  world ".to_string(),
        }]);
    }

    #[test]
    fn group_names_may_contain_spaces() {
        assert_eq!(parse_line("/create_group my team"), vec![Command::CreateGroup {
            name: "my team".to_string(),
        }]);
        assert_eq!(parse_line("/join_group team"), vec![Command::JoinGroup {
            name: "team".to_string(),
        }]);
        assert_eq!(parse_line("/leave_group team"), vec![Command::LeaveGroup {
            name: "team".to_string(),
        }]);
    }

    #[test]
    fn multiple_commands_per_line() {
        assert_eq!(parse_line("/create_group team/join_group other/exit"), vec![
            Command::CreateGroup { name: "team".to_string() },
            Command::JoinGroup { name: "other".to_string() },
            Command::Exit,
        ]);
    }

    #[test]
    fn slash_in_body_opens_a_new_segment() {
        // The splitter wins over the body: the broadcast loses its tail.
        assert_eq!(parse_line("/broadcast see /msg a b"), vec![
            Command::Broadcast { body: "see ".to_string() },
            Command::Direct { recipient: "a".to_string(), body: "b".to_string() },
        ]);
    }

    #[test]
    fn plain_text_is_unknown() {
        assert_eq!(parse_line("hello"), vec![Command::Unknown]);
    }

    #[test]
    fn bare_and_trailing_slashes_are_unknown() {
        assert_eq!(parse_line("/"), vec![Command::Unknown]);
        assert_eq!(parse_line("abc/"), vec![Command::Unknown, Command::Unknown]);
    }

    #[test]
    fn empty_line_has_no_commands() {
        assert!(parse_line("").is_empty());
    }

    #[test]
    fn segments_split_at_every_slash() {
        assert_eq!(split_segments("/a/b/c"), vec!["/a", "/b", "/c"]);
        assert_eq!(split_segments("x/a"), vec!["x", "/a"]);
        assert_eq!(split_segments("//"), vec!["/", "/"]);
    }
}
