use crate::grammar::{Input, Rule};

/// `Content-Type` field value, RFC 9110 section 8.3.1.
///
/// ```text
/// Content-Type    = media-type
/// media-type      = type "/" subtype parameters
/// type            = token
/// subtype         = token
/// parameters      = *( OWS ";" OWS [ parameter ] )
/// parameter       = parameter-name "=" parameter-value
/// parameter-name  = token
/// parameter-value = ( token / quoted-string )
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentTypeRule {
    ContentType,
    MediaType,
    Type,
    Subtype,
    Parameters,
    Parameter,
    ParameterName,
    ParameterValue,
    QuotedString,
}

impl Rule for ContentTypeRule {
    fn name(self) -> &'static str {
        match self {
            ContentTypeRule::ContentType => "Content-Type",
            ContentTypeRule::MediaType => "media-type",
            ContentTypeRule::Type => "type",
            ContentTypeRule::Subtype => "subtype",
            ContentTypeRule::Parameters => "parameters",
            ContentTypeRule::Parameter => "parameter",
            ContentTypeRule::ParameterName => "parameter-name",
            ContentTypeRule::ParameterValue => "parameter-value",
            ContentTypeRule::QuotedString => "quoted-string",
        }
    }

    fn matches(self, input: &mut Input<'_, Self>) -> bool {
        match self {
            ContentTypeRule::ContentType => input.rule(ContentTypeRule::MediaType),
            ContentTypeRule::MediaType => {
                input.rule(ContentTypeRule::Type)
                    && input.byte(b'/')
                    && input.rule(ContentTypeRule::Subtype)
                    && input.rule(ContentTypeRule::Parameters)
            }
            ContentTypeRule::Type | ContentTypeRule::Subtype | ContentTypeRule::ParameterName => input.token(),
            ContentTypeRule::Parameters => input.many0(|input| {
                input.ows()
                    && input.byte(b';')
                    && input.ows()
                    && input.optional(|input| input.rule(ContentTypeRule::Parameter))
            }),
            ContentTypeRule::Parameter => {
                input.rule(ContentTypeRule::ParameterName)
                    && input.byte(b'=')
                    && input.rule(ContentTypeRule::ParameterValue)
            }
            ContentTypeRule::ParameterValue => input.token() || input.rule(ContentTypeRule::QuotedString),
            ContentTypeRule::QuotedString => input.quoted_string(),
        }
    }
}
