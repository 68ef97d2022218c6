use crate::grammar::{evaluate, ConnectionRule};
use crate::protocol::ParseError;

/// Splits a `Connection` value into its options, in source order and case as written.
pub fn parse_connection<V: AsRef<[u8]>>(value: V) -> Result<Vec<String>, ParseError> {
    let root = evaluate(ConnectionRule::Connection, value.as_ref())?;
    let options = root
        .search(&[ConnectionRule::ConnectionOption], Some(1))
        .into_iter()
        .map(|option| option.text().into_owned())
        .collect();
    Ok(options)
}
