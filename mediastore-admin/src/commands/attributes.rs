use anyhow::Result;
use mediastore_core::query::attribute;

/// Print the attribute table
pub fn execute_attributes_command() -> Result<()> {
    println!("{:<32} {:<14} {:<10} {}", "ATTRIBUTE", "ENTITY", "VALUES", "FIELD");
    for attribute in attribute::ALL {
        let values = format!(
            "{:?}{}",
            attribute.value_kind,
            if attribute.collection { "[]" } else { "" }
        );
        println!(
            "{:<32} {:<14} {:<10} {}",
            attribute.name,
            attribute.target.to_string(),
            values,
            attribute.field
        );
    }
    Ok(())
}
