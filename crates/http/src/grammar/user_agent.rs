use crate::grammar::chars;
use crate::grammar::{Input, Rule};

/// `User-Agent` field value, RFC 9110 sections 10.1.5 and 5.6.5.
///
/// ```text
/// User-Agent      = product *( RWS ( product / comment ) )
/// product         = token [ "/" product-version ]
/// product-version = token
/// comment         = "(" *( ctext / quoted-pair / comment ) ")"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserAgentRule {
    UserAgent,
    Product,
    ProductName,
    ProductVersion,
    Comment,
}

impl Rule for UserAgentRule {
    fn name(self) -> &'static str {
        match self {
            UserAgentRule::UserAgent => "User-Agent",
            UserAgentRule::Product => "product",
            UserAgentRule::ProductName => "product-name",
            UserAgentRule::ProductVersion => "product-version",
            UserAgentRule::Comment => "comment",
        }
    }

    fn matches(self, input: &mut Input<'_, Self>) -> bool {
        match self {
            UserAgentRule::UserAgent => {
                input.rule(UserAgentRule::Product)
                    && input.many0(|input| {
                        input.rws() && (input.rule(UserAgentRule::Product) || input.rule(UserAgentRule::Comment))
                    })
            }
            UserAgentRule::Product => {
                input.rule(UserAgentRule::ProductName)
                    && input.optional(|input| input.byte(b'/') && input.rule(UserAgentRule::ProductVersion))
            }
            UserAgentRule::ProductName | UserAgentRule::ProductVersion => input.token(),
            UserAgentRule::Comment => {
                input.byte(b'(')
                    && input.many0(|input| {
                        input.bytes_while1(chars::is_ctext)
                            || input.attempt(|input| input.byte(b'\\') && input.byte_if(chars::is_quoted_pair_byte))
                            || input.rule(UserAgentRule::Comment)
                    })
                    && input.byte(b')')
            }
        }
    }
}
