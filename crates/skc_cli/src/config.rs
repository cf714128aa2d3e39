//! `skc config`: manage the user settings file.

use std::path::Path;

use skc_config::settings::mask_secret;
use skc_config::UserSettings;

use crate::ConfigAction;

/// Runs `skc config <action>` against the default settings file.
pub fn run(action: &ConfigAction) -> Result<i32, Box<dyn std::error::Error>> {
    let path = UserSettings::default_path()?;
    for line in apply(action, &path)? {
        println!("{line}");
    }
    Ok(0)
}

/// Applies `action` to the settings file at `path` and returns the lines to
/// print.
fn apply(action: &ConfigAction, path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut settings = UserSettings::load_from(path)?;
            settings.set(key, value)?;
            settings.save_to(path)?;
            Ok(vec![format!("Set {key}")])
        }
        ConfigAction::List => {
            let settings = UserSettings::load_from(path)?;
            Ok(settings
                .entries()
                .into_iter()
                .map(|(key, value)| {
                    let shown = match value {
                        Some(v) if key == "api-key" => mask_secret(v),
                        Some(v) => v.to_string(),
                        None => "(not set)".to_string(),
                    };
                    format!("{key:<10} {shown}")
                })
                .collect())
        }
        ConfigAction::Reset => {
            UserSettings::default().save_to(path)?;
            Ok(vec!["Config reset to defaults".to_string()])
        }
    }
}
