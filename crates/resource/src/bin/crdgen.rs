//! Prints the Galley CRD manifests as YAML.

use kube::CustomResourceExt;
use resource::ProducerService;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&ProducerService::crd())?);
    Ok(())
}
