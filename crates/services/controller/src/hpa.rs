//! Companion horizontal-autoscaler management (spec.md §4.1 step 3,
//! §3.2 invariant 3: "at most one companion horizontal-autoscaler object
//! exists at any moment, owned by the ScalingTarget").

use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, ExternalMetricSource, HorizontalPodAutoscaler, HorizontalPodAutoscalerSpec,
    MetricIdentifier, MetricSpec, MetricTarget,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, ObjectMeta, Patch, PatchParams};
use kube::{Client, ResourceExt};

use engine_core::{MetricType, ScalingTarget};
use engine_scalers::scaler::MetricSpec as ScalerMetricSpec;

const FIELD_MANAGER: &str = "eventscale-controller";

/// Name the companion autoscaler for `target` gets, recorded back into
/// `status.companionAutoscalerName`.
#[must_use]
pub fn companion_name(target: &ScalingTarget) -> String {
    format!("{}-eventscale", target.name_any())
}

fn owner_reference(target: &ScalingTarget) -> OwnerReference {
    OwnerReference {
        api_version: format!("{}/{}", engine_core::API_GROUP, engine_core::API_VERSION),
        kind: "ScalingTarget".to_string(),
        name: target.name_any(),
        uid: target.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Build one `autoscaling/v2` `MetricTarget` from a scaler's own target
/// value: the API server requires exactly one of `value`/`averageValue`/
/// `averageUtilization` populated, matching `type`.
fn metric_target(spec: &ScalerMetricSpec) -> MetricTarget {
    let quantity = Quantity(format!("{}", spec.target_value));
    match spec.metric_type {
        MetricType::Value => MetricTarget {
            type_: "Value".to_string(),
            value: Some(quantity),
            average_value: None,
            average_utilization: None,
        },
        MetricType::AverageValue => MetricTarget {
            type_: "AverageValue".to_string(),
            value: None,
            average_value: Some(quantity),
            average_utilization: None,
        },
        #[allow(clippy::cast_possible_truncation)]
        MetricType::Utilization => MetricTarget {
            type_: "Utilization".to_string(),
            value: None,
            average_value: None,
            average_utilization: Some(spec.target_value.round() as i32),
        },
    }
}

/// Build the desired companion `HorizontalPodAutoscaler`: one *External*
/// metric per trigger, named and thresholded per the scaler runtime's own
/// `metric_spec()` output (spec.md §4.1 step 3: the companion's metric
/// list "mirrors one entry per trigger").
///
/// `min_replicas`/`max_replicas` are passed explicitly rather than read
/// from `target.spec` so the caller can pin both to `idleReplicas` (or a
/// `paused-replicas` override) while the target is idle or paused —
/// replica counts the companion autoscaler can't reach on its own since
/// they sit outside `target.spec`'s normal `[minReplicas, maxReplicas]`
/// range.
#[must_use]
pub fn build(
    target: &ScalingTarget,
    metric_specs: &[ScalerMetricSpec],
    min_replicas: i32,
    max_replicas: i32,
) -> HorizontalPodAutoscaler {
    let metrics = metric_specs
        .iter()
        .map(|spec| MetricSpec {
            type_: "External".to_string(),
            external: Some(ExternalMetricSource {
                metric: MetricIdentifier { name: spec.name.clone(), selector: None },
                target: metric_target(spec),
            }),
            ..Default::default()
        })
        .collect();

    HorizontalPodAutoscaler {
        metadata: ObjectMeta {
            name: Some(companion_name(target)),
            namespace: target.namespace(),
            owner_references: Some(vec![owner_reference(target)]),
            ..Default::default()
        },
        spec: Some(HorizontalPodAutoscalerSpec {
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some(target.spec.scale_target_ref.api_version.clone()),
                kind: target.spec.scale_target_ref.kind.clone(),
                name: target.spec.scale_target_ref.name.clone(),
            },
            min_replicas: Some(min_replicas),
            max_replicas,
            metrics: Some(metrics),
            ..Default::default()
        }),
        status: None,
    }
}

/// Server-side apply the companion autoscaler for `target`.
///
/// # Errors
/// Returns [`kube::Error`] if the apply call fails.
pub async fn reconcile(
    client: &Client,
    namespace: &str,
    target: &ScalingTarget,
    metric_specs: &[ScalerMetricSpec],
    min_replicas: i32,
    max_replicas: i32,
) -> kube::Result<HorizontalPodAutoscaler> {
    let api: Api<HorizontalPodAutoscaler> = Api::namespaced(client.clone(), namespace);
    let desired = build(target, metric_specs, min_replicas, max_replicas);
    let name = companion_name(target);
    api.patch(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Apply(&desired)).await
}

/// Delete the companion autoscaler, ignoring a not-found response (spec.md
/// §8 property 6: "idempotent delete").
///
/// # Errors
/// Returns [`kube::Error`] for any failure other than not-found.
pub async fn delete(client: &Client, namespace: &str, target: &ScalingTarget) -> kube::Result<()> {
    let api: Api<HorizontalPodAutoscaler> = Api::namespaced(client.clone(), namespace);
    match api.delete(&companion_name(target), &kube::api::DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::{ScaleTargetRef, ScalingTargetSpec, Trigger};
    use std::collections::BTreeMap;

    fn sample_target() -> ScalingTarget {
        ScalingTarget::new(
            "checkout-worker",
            ScalingTargetSpec {
                scale_target_ref: ScaleTargetRef { api_version: "apps/v1".to_string(), kind: "Deployment".to_string(), name: "checkout".to_string() },
                min_replicas: 1,
                max_replicas: 10,
                idle_replicas: None,
                cooldown_period: 300,
                polling_interval: 30,
                triggers: vec![Trigger {
                    type_: "kafka".to_string(),
                    name: None,
                    metadata: BTreeMap::new(),
                    authentication_ref: None,
                    metric_type: None,
                    use_cached_metrics: false,
                }],
                fallback: None,
                restore_to_original_replica_count: false,
                scaling_modifiers: None,
            },
        )
    }

    #[test]
    fn companion_name_is_derived_and_stable() {
        let target = sample_target();
        assert_eq!(companion_name(&target), "checkout-worker-eventscale");
    }

    #[test]
    fn build_mirrors_min_max_and_one_metric_per_trigger() {
        let target = sample_target();
        let specs = vec![ScalerMetricSpec { name: "kafka".to_string(), metric_type: MetricType::AverageValue, target_value: 10.0 }];
        let hpa = build(&target, &specs, 1, 10);
        let spec = hpa.spec.unwrap();
        assert_eq!(spec.min_replicas, Some(1));
        assert_eq!(spec.max_replicas, 10);
        let metrics = spec.metrics.unwrap();
        assert_eq!(metrics.len(), 1);
        let external = metrics[0].external.as_ref().unwrap();
        assert_eq!(external.metric.name, "kafka");
        assert_eq!(external.target.average_value, Some(Quantity("10".to_string())));
    }

    #[test]
    fn build_sets_value_and_utilization_targets_per_metric_type() {
        let target = sample_target();
        let specs = vec![
            ScalerMetricSpec { name: "value-metric".to_string(), metric_type: MetricType::Value, target_value: 42.0 },
            ScalerMetricSpec { name: "cpu".to_string(), metric_type: MetricType::Utilization, target_value: 80.0 },
        ];
        let hpa = build(&target, &specs, 1, 10);
        let metrics = hpa.spec.unwrap().metrics.unwrap();

        let value_target = &metrics[0].external.as_ref().unwrap().target;
        assert_eq!(value_target.value, Some(Quantity("42".to_string())));
        assert_eq!(value_target.average_value, None);

        let utilization_target = &metrics[1].external.as_ref().unwrap().target;
        assert_eq!(utilization_target.average_utilization, Some(80));
    }
}
