//! Prints the generated `CustomResourceDefinition` YAML for every kind this
//! engine owns, one document per kind, separated by `---`. Run as
//! `cargo run --bin crdgen | kubectl apply -f -` to install the CRDs.

use kube::CustomResourceExt;

use engine_core::{ClusterEventSink, ClusterTriggerAuthentication, EventSink, ScalingJobTarget, ScalingTarget, TriggerAuthentication};

fn main() {
    let crds = vec![
        serde_yaml::to_string(&ScalingTarget::crd()),
        serde_yaml::to_string(&ScalingJobTarget::crd()),
        serde_yaml::to_string(&TriggerAuthentication::crd()),
        serde_yaml::to_string(&ClusterTriggerAuthentication::crd()),
        serde_yaml::to_string(&EventSink::crd()),
        serde_yaml::to_string(&ClusterEventSink::crd()),
    ];

    let rendered: Vec<String> = crds.into_iter().map(|doc| doc.expect("CRD schema serializes to YAML")).collect();
    println!("{}", rendered.join("---\n"));
}
