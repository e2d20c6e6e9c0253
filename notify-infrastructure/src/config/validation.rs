use anyhow::{anyhow, Result};

use notify_domain::DeliveryTarget;

/// Table names are spliced into SQL, so only plain identifiers pass.
pub fn validate_table_name(value: &str) -> Result<()> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(anyhow!("connections_table is empty"));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(anyhow!(
            "connections_table '{}' must start with a letter or underscore",
            value
        ));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(anyhow!(
            "connections_table '{}' may only contain letters, digits and underscores",
            value
        ));
    }
    Ok(())
}

pub fn validate_delivery_endpoint(value: &str) -> Result<()> {
    DeliveryTarget::parse(value).map(|_| ())
}
