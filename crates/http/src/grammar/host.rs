use crate::grammar::chars;
use crate::grammar::{Input, Rule};

/// Host with optional port, RFC 3986 section 3.2.2 and RFC 9110 section 7.2.
///
/// ```text
/// host        = uri-host [ ":" port ]
/// uri-host    = IP-literal / IPv4address / reg-name
/// IP-literal  = "[" ( IPvFuture / IPv6address ) "]"
/// IPv6address = 1*( %x21-5C / %x5E-7E )
/// IPvFuture   = "v" 1*HEXDIG "." 1*( unreserved / sub-delims / ":" )
/// IPv4address = dec-octet "." dec-octet "." dec-octet "." dec-octet
/// reg-name    = *( unreserved / pct-encoded / sub-delims )
/// port        = *DIGIT
/// ```
///
/// The textbook `IPv6address` production needs backtracking, so the bracket interior is
/// matched by byte class and validated when the address is built. `IPvFuture` is tried
/// first because the permissive class would otherwise swallow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostRule {
    Host,
    UriHost,
    IpLiteral,
    Ipv6Address,
    IpvFuture,
    Ipv4Address,
    RegName,
    Port,
}

impl Rule for HostRule {
    fn name(self) -> &'static str {
        match self {
            HostRule::Host => "host",
            HostRule::UriHost => "uri-host",
            HostRule::IpLiteral => "IP-literal",
            HostRule::Ipv6Address => "IPv6address",
            HostRule::IpvFuture => "IPvFuture",
            HostRule::Ipv4Address => "IPv4address",
            HostRule::RegName => "reg-name",
            HostRule::Port => "port",
        }
    }

    fn matches(self, input: &mut Input<'_, Self>) -> bool {
        match self {
            HostRule::Host => {
                input.rule(HostRule::UriHost) && input.optional(|input| input.byte(b':') && input.rule(HostRule::Port))
            }
            HostRule::UriHost => {
                input.rule(HostRule::IpLiteral)
                    || input.attempt(|input| input.rule(HostRule::Ipv4Address) && ends_ipv4(input))
                    || input.rule(HostRule::RegName)
            }
            HostRule::IpLiteral => {
                input.byte(b'[')
                    && (input.attempt(|input| input.rule(HostRule::IpvFuture) && input.byte(b']'))
                        || (input.rule(HostRule::Ipv6Address) && input.byte(b']')))
            }
            HostRule::Ipv6Address => ipv6_literal(input),
            HostRule::IpvFuture => ipv_future(input),
            HostRule::Ipv4Address => ipv4_address(input),
            HostRule::RegName => reg_name(input),
            HostRule::Port => {
                input.bytes_while(chars::is_digit);
                true
            }
        }
    }
}

/// An IPv4 address only stands as a host when nothing but a port separator follows it,
/// otherwise `1.2.3.4.example` is a reg-name.
pub(crate) fn ends_ipv4<R: Rule>(input: &mut Input<'_, R>) -> bool {
    matches!(input.peek(), None | Some(b':'))
}

pub(crate) fn ipv4_address<R: Rule>(input: &mut Input<'_, R>) -> bool {
    dec_octet(input)
        && input.byte(b'.')
        && dec_octet(input)
        && input.byte(b'.')
        && dec_octet(input)
        && input.byte(b'.')
        && dec_octet(input)
}

/// ```text
/// dec-octet = "25" %x30-35 / "2" %x30-34 DIGIT / "1" 2DIGIT / %x31-39 DIGIT / DIGIT
/// ```
fn dec_octet<R: Rule>(input: &mut Input<'_, R>) -> bool {
    input.attempt(|input| input.literal(b"25") && input.byte_if(|b| matches!(b, b'0'..=b'5')))
        || input.attempt(|input| {
            input.byte(b'2') && input.byte_if(|b| matches!(b, b'0'..=b'4')) && input.byte_if(chars::is_digit)
        })
        || input.attempt(|input| input.byte(b'1') && input.byte_if(chars::is_digit) && input.byte_if(chars::is_digit))
        || input.attempt(|input| input.byte_if(|b| matches!(b, b'1'..=b'9')) && input.byte_if(chars::is_digit))
        || input.byte_if(chars::is_digit)
}

pub(crate) fn ipv6_literal<R: Rule>(input: &mut Input<'_, R>) -> bool {
    input.bytes_while1(chars::is_ipv6_literal)
}

fn ipv_future<R: Rule>(input: &mut Input<'_, R>) -> bool {
    input.byte_if(|b| b.eq_ignore_ascii_case(&b'v'))
        && input.bytes_while1(chars::is_hexdig)
        && input.byte(b'.')
        && input.bytes_while1(|b| chars::is_unreserved(b) || chars::is_sub_delim(b) || b == b':')
}

fn reg_name<R: Rule>(input: &mut Input<'_, R>) -> bool {
    input.many0(|input| {
        input.byte_if(|b| chars::is_unreserved(b) || chars::is_sub_delim(b))
            || input.attempt(|input| {
                input.byte(b'%') && input.byte_if(chars::is_hexdig) && input.byte_if(chars::is_hexdig)
            })
    })
}
