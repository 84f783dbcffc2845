use std::any::type_name;

use documented::{Documented, DocumentedFields};
use toml_edit::{Decor, Item, RawString, Table};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Turns every line of `docs` into a `#` comment in front of `decor`,
/// keeping whatever prefix was already there.
pub fn prepend_doc_comments(decor: &mut Decor, docs: &str) {
    let old_prefix = decor
        .prefix()
        .and_then(RawString::as_str)
        .unwrap_or_default()
        .to_string();

    let comments: String = docs
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                "#\n".to_string()
            } else {
                format!("# {line}\n")
            }
        })
        .collect();

    let new_prefix = if old_prefix.is_empty() || old_prefix.ends_with('\n') {
        format!("{old_prefix}{comments}")
    } else {
        format!("{old_prefix}\n{comments}")
    };
    decor.set_prefix(new_prefix);
}

/// Writes the field docs of `T` as comments above each key of `table`.
///
/// Sub-tables get their comment on the table header. The container doc of
/// `T` is only added for nested tables.
pub fn annotate_table<T>(table: &mut Table, is_root: bool) -> Result<()>
where
    T: Documented + DocumentedFields,
{
    if !is_root {
        prepend_doc_comments(table.decor_mut(), T::DOCS);
    }

    for (mut key, item) in table.iter_mut() {
        let name = key.get().to_string();
        let Ok(docs) = T::get_field_docs(&name) else {
            debug!(
                "no documentation for field '{}' of '{}'",
                name,
                type_name::<T>()
            );
            continue;
        };

        match item {
            Item::None => return Err(ConfigError::UnexpectedTomlItem(name)),
            Item::Value(_) => prepend_doc_comments(key.leaf_decor_mut(), docs),
            Item::Table(sub_table) => prepend_doc_comments(sub_table.decor_mut(), docs),
            Item::ArrayOfTables(array) => {
                if let Some(first) = array.iter_mut().next() {
                    prepend_doc_comments(first.decor_mut(), docs);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use toml_edit::Decor;

    use super::*;
    use crate::config::Config;

    #[test]
    fn test_prepend_doc_comments() {
        let mut decor = Decor::new("", "");
        prepend_doc_comments(&mut decor, "Cache lifetime\n\nDefault: 1h");

        let prefix = decor.prefix().and_then(|p| p.as_str()).unwrap();
        assert_eq!(prefix, "# Cache lifetime\n#\n# Default: 1h\n");
    }

    #[test]
    fn test_prepend_keeps_existing_prefix() {
        let mut decor = Decor::new("\n", "");
        prepend_doc_comments(&mut decor, "Line");

        let prefix = decor.prefix().and_then(|p| p.as_str()).unwrap();
        assert_eq!(prefix, "\n# Line\n");
    }

    #[test]
    fn test_annotated_default_config() {
        let doc = Config::default_config().to_annotated_document().unwrap();
        let rendered = doc.to_string();

        assert!(rendered.contains("# How long an assembled metadata graph stays cached"));
        assert!(rendered.contains("cache_ttl = \"1h\""));
        assert!(rendered.contains("[mail]"));
    }
}
