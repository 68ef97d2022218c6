use crate::grammar::chars;
use crate::grammar::host::{ends_ipv4, ipv4_address, ipv6_literal};
use crate::grammar::{Input, Rule};

/// `Forwarded` field value and its node sub-grammar, RFC 7239 sections 4 and 6.
///
/// ```text
/// Forwarded         = 1#forwarded-element
/// forwarded-element = [ forwarded-pair ] *( ";" [ forwarded-pair ] )
/// forwarded-pair    = token "=" value
/// value             = token / quoted-string
///
/// node      = nodename [ ":" node-port ]
/// nodename  = IPv4address / "[" IPv6address "]" / "unknown" / obfnode
/// obfnode   = "_" 1*( ALPHA / DIGIT / "." / "_" / "-" )
/// node-port = port / obfport
/// port      = 1*5DIGIT
/// obfport   = "_" 1*( ALPHA / DIGIT / "." / "_" / "-" )
/// ```
///
/// `Node` is evaluated on its own against the decoded value of a `for` or `by` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardedRule {
    Forwarded,
    ForwardedElement,
    ForwardedPair,
    ParameterName,
    Value,
    QuotedString,
    Node,
    NodeName,
    Ipv4Address,
    Ipv6Address,
    Unknown,
    ObfNode,
    NodePort,
    Port,
    ObfPort,
}

impl Rule for ForwardedRule {
    fn name(self) -> &'static str {
        match self {
            ForwardedRule::Forwarded => "Forwarded",
            ForwardedRule::ForwardedElement => "forwarded-element",
            ForwardedRule::ForwardedPair => "forwarded-pair",
            ForwardedRule::ParameterName => "token",
            ForwardedRule::Value => "value",
            ForwardedRule::QuotedString => "quoted-string",
            ForwardedRule::Node => "node",
            ForwardedRule::NodeName => "nodename",
            ForwardedRule::Ipv4Address => "IPv4address",
            ForwardedRule::Ipv6Address => "IPv6address",
            ForwardedRule::Unknown => "unknown",
            ForwardedRule::ObfNode => "obfnode",
            ForwardedRule::NodePort => "node-port",
            ForwardedRule::Port => "port",
            ForwardedRule::ObfPort => "obfport",
        }
    }

    fn matches(self, input: &mut Input<'_, Self>) -> bool {
        match self {
            ForwardedRule::Forwarded => input.list1(|input| input.rule(ForwardedRule::ForwardedElement)),
            ForwardedRule::ForwardedElement => {
                input.optional(|input| input.rule(ForwardedRule::ForwardedPair))
                    && input.many0(|input| {
                        input.byte(b';') && input.optional(|input| input.rule(ForwardedRule::ForwardedPair))
                    })
            }
            ForwardedRule::ForwardedPair => {
                input.rule(ForwardedRule::ParameterName) && input.byte(b'=') && input.rule(ForwardedRule::Value)
            }
            ForwardedRule::ParameterName => input.token(),
            ForwardedRule::Value => input.token() || input.rule(ForwardedRule::QuotedString),
            ForwardedRule::QuotedString => input.quoted_string(),
            ForwardedRule::Node => {
                input.rule(ForwardedRule::NodeName)
                    && input.optional(|input| input.byte(b':') && input.rule(ForwardedRule::NodePort))
            }
            ForwardedRule::NodeName => {
                input.attempt(|input| input.rule(ForwardedRule::Ipv4Address) && ends_ipv4(input))
                    || input.attempt(|input| {
                        input.byte(b'[') && input.rule(ForwardedRule::Ipv6Address) && input.byte(b']')
                    })
                    || input.rule(ForwardedRule::Unknown)
                    || input.rule(ForwardedRule::ObfNode)
            }
            ForwardedRule::Ipv4Address => ipv4_address(input),
            ForwardedRule::Ipv6Address => ipv6_literal(input),
            ForwardedRule::Unknown => input.literal_ignore_case(b"unknown"),
            ForwardedRule::ObfNode | ForwardedRule::ObfPort => {
                input.byte(b'_') && input.bytes_while1(chars::is_obf_char)
            }
            ForwardedRule::NodePort => input.rule(ForwardedRule::Port) || input.rule(ForwardedRule::ObfPort),
            ForwardedRule::Port => input.repeat(1, Some(5), |input| input.byte_if(chars::is_digit)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::evaluate;

    #[test]
    fn elements_and_pairs() {
        let root = evaluate(ForwardedRule::Forwarded, br#"for=192.0.2.60;proto=http, for="[2001:db8::1]:4711""#).unwrap();
        let elements = root.search(&[ForwardedRule::ForwardedElement], Some(1));
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].search(&[ForwardedRule::ForwardedPair], Some(1)).len(), 2);

        let quoted = elements[1].find(ForwardedRule::QuotedString, 3).unwrap();
        assert_eq!(quoted.as_bytes(), br#""[2001:db8::1]:4711""#);
    }

    #[test]
    fn empty_pairs_are_tolerated() {
        assert!(evaluate(ForwardedRule::Forwarded, b"for=a;;proto=b;").is_ok());
        assert!(evaluate(ForwardedRule::Forwarded, b"for=a, , by=b").is_ok());
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(evaluate(ForwardedRule::Forwarded, b"for").is_err());
        assert!(evaluate(ForwardedRule::Forwarded, b"for=a; proto=b").is_err());
        assert!(evaluate(ForwardedRule::Forwarded, br#"for="unterminated"#).is_err());
    }

    #[test]
    fn node_alternatives() {
        let kind = |source: &[u8]| evaluate(ForwardedRule::Node, source).unwrap().children()[0].children()[0].rule();
        assert_eq!(kind(b"192.0.2.43"), ForwardedRule::Ipv4Address);
        assert_eq!(kind(b"[2001:db8:cafe::17]:47011"), ForwardedRule::Ipv6Address);
        assert_eq!(kind(b"unknown"), ForwardedRule::Unknown);
        assert_eq!(kind(b"_hidden:_port"), ForwardedRule::ObfNode);
    }

    #[test]
    fn node_port_forms() {
        let root = evaluate(ForwardedRule::Node, b"_gazonk:_SEVKISEK").unwrap();
        let port = root.find(ForwardedRule::NodePort, 1).unwrap();
        assert_eq!(port.children()[0].rule(), ForwardedRule::ObfPort);

        assert!(evaluate(ForwardedRule::Node, b"192.0.2.43:123456").is_err());
        assert!(evaluate(ForwardedRule::Node, b"example.com").is_err());
        assert!(evaluate(ForwardedRule::Node, b"_").is_err());
    }
}
