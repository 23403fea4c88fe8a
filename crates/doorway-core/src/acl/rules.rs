//! The fixed authorization rule table.

use super::matcher::topic_matches;

/// Party requesting a bus operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A door controller, identified by its device UUID.
    Device,
    /// A relay server fanning unlock commands out to controllers.
    RelayServer,
    /// An operator; bypasses the rule table at the HTTP front.
    SuperUser,
}

/// Requested operation on a topic.
///
/// The numeric codes are the broker's: 1 read, 2 write, 4 subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Receive messages published on the topic.
    Read,
    /// Publish to the topic.
    Write,
    /// Subscribe to the topic; authorized exactly as a read.
    Subscribe,
}

impl Access {
    /// Parses a broker access code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Read),
            "2" => Some(Self::Write),
            "4" => Some(Self::Subscribe),
            _ => None,
        }
    }

    /// Collapses [`Access::Subscribe`] into [`Access::Read`].
    #[must_use]
    pub const fn normalized(self) -> Self {
        match self {
            Self::Subscribe => Self::Read,
            other => other,
        }
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Role the rule applies to.
    pub role: Role,
    /// Topic pattern, see [`topic_matches`].
    pub pattern: &'static str,
    /// Operation the rule permits.
    pub access: Access,
}

/// The authorization rule table.
///
/// Constructed once at startup and passed to whoever needs it; rules are
/// never added or removed at runtime.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// The standard table: controllers read their own unlock commands and
    /// write their own heartbeats; relay servers do the reverse for every
    /// hotel.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            rules: vec![
                Rule {
                    role: Role::Device,
                    pattern: "hotels/%u/room/open",
                    access: Access::Read,
                },
                Rule {
                    role: Role::Device,
                    pattern: "hotels/%u/ping",
                    access: Access::Write,
                },
                Rule {
                    role: Role::RelayServer,
                    pattern: "hotels/+/room/open",
                    access: Access::Write,
                },
                Rule {
                    role: Role::RelayServer,
                    pattern: "hotels/+/ping",
                    access: Access::Read,
                },
            ],
        }
    }

    /// Decides whether `role` may perform `access` on `topic`.
    ///
    /// Default deny: true only when a rule for the role and (normalized)
    /// operation has a pattern matching the topic for `caller_uuid`.
    #[must_use]
    pub fn authorize(&self, role: Role, access: Access, topic: &str, caller_uuid: &str) -> bool {
        let access = access.normalized();
        self.rules.iter().any(|rule| {
            rule.role == role
                && rule.access == access
                && topic_matches(rule.pattern, topic, caller_uuid)
        })
    }
}
