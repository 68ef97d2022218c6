use crate::grammar::{evaluate, UserAgentRule};
use crate::protocol::ParseError;

/// A `product [ "/" product-version ]` entry of a `User-Agent` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub version: Option<String>,
}

/// Products and comments of a `User-Agent` value, each list in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAgent {
    pub products: Vec<Product>,
    /// Full comment text, parentheses included. Nested comments stay inside their outer comment.
    pub comments: Vec<String>,
}

pub fn parse_user_agent<V: AsRef<[u8]>>(value: V) -> Result<UserAgent, ParseError> {
    let root = evaluate(UserAgentRule::UserAgent, value.as_ref())?;

    let products = root
        .search(&[UserAgentRule::Product], None)
        .into_iter()
        .filter_map(|product| {
            let name = product.find(UserAgentRule::ProductName, 1)?;
            let version = product.find(UserAgentRule::ProductVersion, 1);
            Some(Product { name: name.text().into_owned(), version: version.map(|v| v.text().into_owned()) })
        })
        .collect();

    let comments =
        root.search(&[UserAgentRule::Comment], None).into_iter().map(|comment| comment.text().into_owned()).collect();

    Ok(UserAgent { products, comments })
}
