//! Prints the CommonWebUI CustomResourceDefinition as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/commonwebui.yaml`

use anyhow::Result;
use crds::CommonWebUI;
use kube::CustomResourceExt;

fn main() -> Result<()> {
    print!("{}", serde_yaml::to_string(&CommonWebUI::crd())?);
    Ok(())
}
