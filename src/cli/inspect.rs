// src/cli/inspect.rs — `seqforge targets` and `seqforge config`

use crate::infra::config::Config;
use crate::targets;

/// Render the built-in target table.
pub fn targets_table() -> String {
    let mut out = String::new();
    for target in targets::builtin_targets() {
        out.push_str(&format!(
            "{:<12} {:>3} ops  {}\n",
            target.name,
            target.operations().len(),
            target.description
        ));
    }
    out
}

pub fn show_targets() -> anyhow::Result<()> {
    print!("{}", targets_table());
    Ok(())
}

pub fn show_config(config: &Config) -> anyhow::Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_table_lists_every_target() {
        let table = targets_table();
        assert_eq!(table.lines().count(), targets::builtin_targets().len());
        assert!(table.starts_with("collections"));
        assert!(table.contains("faulty"));
    }
}
