//! Environment details recorded next to each rendered notebook.

use std::collections::BTreeMap;

use tutorbook_core::{Accelerator, CommandRunner, ToolCommand, TutorialMeta};

use crate::error::PublishResult;

/// Installed distributions, keyed by normalized name.
pub type InstalledPackages = BTreeMap<String, String>;

/// Query installed distributions with `python -m pip freeze`.
pub fn installed_packages(runner: &dyn CommandRunner, python: &str) -> PublishResult<InstalledPackages> {
    let output = runner.run(&ToolCommand::new(python).args(["-m", "pip", "freeze"]))?;
    Ok(parse_freeze(&output.stdout))
}

/// Parse `name==version` lines; editable and URL installs are ignored.
pub fn parse_freeze(output: &str) -> InstalledPackages {
    output
        .lines()
        .filter_map(|line| line.trim().split_once("=="))
        .map(|(name, version)| (normalize_name(name), version.trim().to_string()))
        .collect()
}

/// Distribution name of a requirement specifier (`torch>=1.8[cpu]` → `torch`).
pub fn requirement_name(requirement: &str) -> String {
    let end = requirement
        .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | ';' | '[' | '@' | ' '))
        .unwrap_or(requirement.len());
    normalize_name(&requirement[..end])
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}

/// Fill the manifest's `environment` block for one render.
pub fn record_environment(
    meta: &mut TutorialMeta,
    installed: &InstalledPackages,
    accelerator: Accelerator,
    commit: &str,
    rendered_at: &str,
) {
    let env = &mut meta.environment;
    env.insert("accelerator".to_string(), accelerator.to_string());
    env.insert("commit".to_string(), commit.to_string());
    env.insert("rendered_at".to_string(), rendered_at.to_string());

    for requirement in &meta.requirements {
        let name = requirement_name(requirement);
        match installed.get(&name) {
            Some(version) => {
                env.insert(name, version.clone());
            }
            None => tracing::debug!("{} is not reported by pip freeze", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::meta;

    #[test]
    fn test_parse_freeze() {
        let installed = parse_freeze(
            "torch==2.1.0\nPyTorch_Lightning==2.0.9\n-e git+https://x/y#egg=z\nfoo @ file:///tmp/foo\n",
        );
        assert_eq!(installed.len(), 2);
        assert_eq!(installed["torch"], "2.1.0");
        assert_eq!(installed["pytorch-lightning"], "2.0.9");
    }

    #[test]
    fn test_requirement_name() {
        assert_eq!(requirement_name("torchvision"), "torchvision");
        assert_eq!(requirement_name("seaborn>=0.11"), "seaborn");
        assert_eq!(requirement_name("Kornia[x]==0.6"), "kornia");
        assert_eq!(requirement_name("pytorch_lightning ; python_version>'3.8'"), "pytorch-lightning");
    }

    #[test]
    fn test_record_environment() {
        let mut meta = meta("requirements: [torchvision, seaborn>=0.11]\n");
        let installed = parse_freeze("torchvision==0.16.0\n");

        record_environment(&mut meta, &installed, Accelerator::Gpu, "abc123", "2024-05-01T00:00:00Z");

        assert_eq!(meta.environment["accelerator"], "GPU");
        assert_eq!(meta.environment["commit"], "abc123");
        assert_eq!(meta.environment["rendered_at"], "2024-05-01T00:00:00Z");
        assert_eq!(meta.environment["torchvision"], "0.16.0");
        assert!(!meta.environment.contains_key("seaborn"));
    }
}
