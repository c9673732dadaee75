//! kind cluster and local registry commands and manifests

use serde_json::{json, Value};

use crate::config::{ClusterConfig, RegistryConfig, REGISTRY_CONTAINER_PORT, REGISTRY_IMAGE};
use crate::runner::Invocation;

/// Docker network kind attaches its nodes to
pub const KIND_NETWORK: &str = "kind";

/// `kind get clusters`, one name per line on stdout
pub fn get_clusters() -> Invocation {
    Invocation::new("kind", ["get", "clusters"])
}

/// Whether `kind get clusters` output lists `name`
pub fn cluster_listed(stdout: &str, name: &str) -> bool {
    stdout.lines().any(|line| line.trim() == name)
}

pub fn create_cluster(cluster: &ClusterConfig, registry: &RegistryConfig) -> Invocation {
    Invocation::new(
        "kind",
        ["create", "cluster", "--name", cluster.name.as_str(), "--config", "-"],
    )
    .with_stdin(render_cluster_config(cluster, registry))
}

pub fn delete_cluster(name: &str) -> Invocation {
    Invocation::new("kind", ["delete", "cluster", "--name", name])
}

/// Prints `true` or `false` for an existing container, fails if absent
pub fn registry_inspect(registry: &RegistryConfig) -> Invocation {
    Invocation::new(
        "docker",
        ["inspect", "-f", "{{.State.Running}}", registry.name.as_str()],
    )
}

pub fn registry_start(registry: &RegistryConfig) -> Invocation {
    Invocation::new("docker", ["start", registry.name.as_str()])
}

pub fn registry_create(registry: &RegistryConfig) -> Invocation {
    Invocation::new(
        "docker",
        [
            "run".to_string(),
            "-d".to_string(),
            "--restart=always".to_string(),
            "-p".to_string(),
            format!("127.0.0.1:{}:{}", registry.port, REGISTRY_CONTAINER_PORT),
            "--network".to_string(),
            "bridge".to_string(),
            "--name".to_string(),
            registry.name.clone(),
            REGISTRY_IMAGE.to_string(),
        ],
    )
}

pub fn registry_connect(registry: &RegistryConfig) -> Invocation {
    Invocation::new(
        "docker",
        ["network", "connect", KIND_NETWORK, registry.name.as_str()],
    )
}

pub fn registry_remove(registry: &RegistryConfig) -> Invocation {
    Invocation::new("docker", ["rm", "-f", registry.name.as_str()])
}

/// Render the kind cluster config.
///
/// A single control-plane node labelled `ingress-ready=true`, with the ingress
/// ports mapped to the host and containerd mirroring `localhost:<port>` to the
/// registry container.
pub fn render_cluster_config(cluster: &ClusterConfig, registry: &RegistryConfig) -> String {
    format!(
        r#"kind: Cluster
apiVersion: kind.x-k8s.io/v1alpha4
name: {name}
containerdConfigPatches:
- |-
  [plugins."io.containerd.grpc.v1.cri".registry.mirrors."{host_address}"]
    endpoint = ["http://{registry_name}:{registry_port}"]
nodes:
- role: control-plane
  kubeadmConfigPatches:
  - |
    kind: InitConfiguration
    nodeRegistration:
      kubeletExtraArgs:
        node-labels: "ingress-ready=true"
  extraPortMappings:
  - containerPort: 80
    hostPort: {http_port}
    protocol: TCP
  - containerPort: 443
    hostPort: {https_port}
    protocol: TCP
"#,
        name = cluster.name,
        host_address = registry.host_address(),
        registry_name = registry.name,
        registry_port = REGISTRY_CONTAINER_PORT,
        http_port = cluster.http_port,
        https_port = cluster.https_port,
    )
}

/// ConfigMap advertising the local registry to cluster tooling (KEP-1755)
pub fn registry_hosting_config_map(registry: &RegistryConfig) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {
            "name": "local-registry-hosting",
            "namespace": "kube-public",
        },
        "data": {
            "localRegistryHosting.v1": format!(
                "host: \"{}\"\nhelp: \"https://kind.sigs.k8s.io/docs/user/local-registry/\"\n",
                registry.host_address()
            ),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_config_maps_ports_and_mirror() {
        let cluster = ClusterConfig {
            name: "demo".to_string(),
            http_port: 8080,
            https_port: 8443,
        };
        let registry = RegistryConfig::default();

        let rendered = render_cluster_config(&cluster, &registry);
        let doc: serde_yaml::Value = serde_yaml::from_str(&rendered).unwrap();

        assert_eq!(doc["name"], "demo");
        let node = &doc["nodes"][0];
        assert_eq!(node["role"], "control-plane");
        assert_eq!(node["extraPortMappings"][0]["hostPort"], 8080);
        assert_eq!(node["extraPortMappings"][1]["hostPort"], 8443);
        assert!(node["kubeadmConfigPatches"][0]
            .as_str()
            .unwrap()
            .contains("ingress-ready=true"));
        let patch = doc["containerdConfigPatches"][0].as_str().unwrap();
        assert!(patch.contains(r#"mirrors."localhost:5001""#));
        assert!(patch.contains("http://kind-registry:5000"));
    }

    #[test]
    fn cluster_listing_matches_whole_names() {
        assert!(cluster_listed("other\nkubelab\n", "kubelab"));
        assert!(!cluster_listed("kubelab-old\n", "kubelab"));
        assert!(!cluster_listed("", "kubelab"));
    }

    #[test]
    fn create_feeds_rendered_config_on_stdin() {
        let cluster = ClusterConfig::default();
        let registry = RegistryConfig::default();
        let inv = create_cluster(&cluster, &registry);
        assert_eq!(
            inv.to_string(),
            "kind create cluster --name kubelab --config - < (stdin)"
        );
        assert_eq!(inv.stdin, Some(render_cluster_config(&cluster, &registry)));
    }

    #[test]
    fn registry_binds_loopback_only() {
        let inv = registry_create(&RegistryConfig::default());
        assert!(inv.args.contains(&"127.0.0.1:5001:5000".to_string()));
        assert_eq!(inv.args.last().map(String::as_str), Some("registry:2"));
    }

    #[test]
    fn config_map_points_at_host_address() {
        let registry = RegistryConfig {
            name: "reg".to_string(),
            port: 6000,
        };
        let cm = registry_hosting_config_map(&registry);
        assert_eq!(cm["metadata"]["namespace"], "kube-public");
        assert!(cm["data"]["localRegistryHosting.v1"]
            .as_str()
            .unwrap()
            .contains("localhost:6000"));
    }
}
