// ABOUTME: Config scaffolding for new deployments.
// ABOUTME: Creates an imagedash.yml template with the defaults spelled out.

use std::path::Path;

use crate::error::{Error, Result};
use crate::runtime::RuntimeType;

use super::CONFIG_FILENAME;

pub fn init_config(dir: &Path, runtime: Option<&str>, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let runtime = match runtime {
        Some(r) => r
            .parse::<RuntimeType>()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?
            .to_string(),
        None => "auto".to_string(),
    };

    std::fs::write(&config_path, generate_template_yaml(&runtime))?;
    tracing::info!(path = %config_path.display(), "configuration template written");
    Ok(())
}

fn generate_template_yaml(runtime: &str) -> String {
    format!(
        r#"# Container runtime: docker, nerdctl, crictl or auto (probe in that order)
runtime: {runtime}
retry:
  max_retries: 3
  delay: 1s
server:
  bind: 0.0.0.0:3000
registry_file: config/registry.json
environment: development
# kubernetes:
#   namespace: default
#   pod_name: imagedash-0
"#
    )
}
