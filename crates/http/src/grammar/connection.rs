use crate::grammar::{Input, Rule};

/// `Connection` field value, RFC 9110 section 7.6.1.
///
/// ```text
/// Connection        = #connection-option
/// connection-option = token
/// ```
///
/// The list is required to hold at least one option; an absent header is not a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionRule {
    Connection,
    ConnectionOption,
}

impl Rule for ConnectionRule {
    fn name(self) -> &'static str {
        match self {
            ConnectionRule::Connection => "Connection",
            ConnectionRule::ConnectionOption => "connection-option",
        }
    }

    fn matches(self, input: &mut Input<'_, Self>) -> bool {
        match self {
            ConnectionRule::Connection => input.list1(|input| input.rule(ConnectionRule::ConnectionOption)),
            ConnectionRule::ConnectionOption => input.token(),
        }
    }
}
