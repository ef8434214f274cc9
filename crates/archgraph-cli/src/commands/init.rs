//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# archgraph configuration

[import]
# Abort on the first malformed class file instead of skipping it
fail_fast = false

# Slice cycle rules, evaluated in order.
# The pattern is matched against fully qualified class names; capture
# groups decide which slice a class belongs to.

[[slices]]
pattern = 'com\.example\.([^.]+)\..*'
name = "module $1"
# evidence_limit = 20
# severity = "error"  # error | warning | info
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("archgraph.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created archgraph.toml");
    println!("\nNext steps:");
    println!("  1. Edit archgraph.toml to adjust the slice patterns");
    println!("  2. Run: archgraph check path/to/classes");

    Ok(())
}

#[cfg(test)]
mod tests {
    use archgraph_core::{Config, Severity};

    #[test]
    fn template_config_parses() {
        let config = Config::parse(super::DEFAULT_CONFIG).unwrap();
        assert!(!config.import.fail_fast);
        assert_eq!(config.slices.len(), 1);
        assert_eq!(config.slices[0].name.as_deref(), Some("module $1"));
        assert_eq!(config.slices[0].severity, Severity::Error);
    }
}
