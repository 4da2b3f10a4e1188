//! Prints the Garage CRD manifests as a multi-document YAML stream.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crds.yaml`

use crds::{GarageBucket, GarageKey, GarageKeyAccess};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crds = [GarageBucket::crd(), GarageKey::crd(), GarageKeyAccess::crd()];
    for crd in crds {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
