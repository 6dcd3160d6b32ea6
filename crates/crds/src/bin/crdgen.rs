//! Prints the DynaKube CustomResourceDefinition as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/dynakube.yaml`

use crds::DynaKube;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = serde_yaml::to_string(&DynaKube::crd())?;
    print!("{crd}");
    Ok(())
}
