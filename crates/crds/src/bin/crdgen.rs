//! Prints the Scheduler CustomResourceDefinition as YAML.
//!
//! `cargo run -p crds --bin crdgen > config/crd/scheduler.yaml`

use crds::Scheduler;
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&Scheduler::crd())?);
    Ok(())
}
