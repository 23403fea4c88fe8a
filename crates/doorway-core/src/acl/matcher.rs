//! Topic pattern matching.

/// Whether a literal `+` topic segment collapses a `#` pattern segment to a
/// single-segment match instead of running its lookahead.
///
/// The broker dialect this fleet speaks has always behaved this way, and
/// existing rule/topic pairs were provisioned against it; changing the
/// constant changes which topics the standard rules admit. Pinned by
/// `multi_wildcard_collapses_on_literal_plus_segment`.
pub const LITERAL_PLUS_COLLAPSES_HASH: bool = true;

/// Matches a topic against a rule pattern for a given caller.
///
/// Both `pattern` and `topic` are `/`-delimited segment sequences; a single
/// leading `/` is ignored on either side. Pattern segments:
///
/// - `%u` — matches the segment only when it equals `caller_uuid` exactly
/// - `+` — matches exactly one segment of any value
/// - `#` — as the last pattern segment, matches all remaining topic
///   segments; otherwise consumes segments greedily up to the first topic
///   segment equal to the pattern segment that follows it
/// - anything else — literal, must equal the topic segment exactly
///
/// A topic that runs out of segments before the pattern is consumed fails
/// unless the segment just consumed was `#`; a topic with segments left
/// after the pattern is consumed likewise fails unless `#` was the last
/// pattern segment. All malformed or out-of-step inputs deny.
#[must_use]
pub fn topic_matches(pattern: &str, topic: &str, caller_uuid: &str) -> bool {
    let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
    let topic = topic.strip_prefix('/').unwrap_or(topic);
    let pat: Vec<&str> = pattern.split('/').collect();
    let top: Vec<&str> = topic.split('/').collect();

    // One cursor advances over both sequences; `#` is the only segment that
    // can move it through more than one topic segment per step.
    let mut i = 0;
    while i < top.len() {
        if i == pat.len() {
            return i > 0 && pat[i - 1] == "#";
        }
        if i > pat.len() {
            return false;
        }
        match pat[i] {
            "%u" => {
                if top[i] != caller_uuid {
                    return false;
                }
            }
            "+" => {}
            "#" => {
                if LITERAL_PLUS_COLLAPSES_HASH && top[i] == "+" {
                    i += 1;
                    continue;
                }
                if i + 1 < pat.len() {
                    // Greedy up to the lookahead anchor.
                    let anchor = pat[i + 1];
                    while top[i] != anchor {
                        i += 1;
                        if i == top.len() {
                            return false;
                        }
                    }
                } else {
                    return true;
                }
            }
            literal => {
                if literal != top[i] {
                    return false;
                }
            }
        }
        i += 1;
    }

    // Topic exhausted: the pattern must be fully consumed, or have just
    // finished on a multi-segment wildcard.
    i >= pat.len() || (i > 0 && pat[i - 1] == "#")
}
