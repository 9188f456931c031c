//! Protocol-level types shared by the server and the provider.

use serde::{Deserialize, Serialize};

/// Provider metadata returned by GetMetadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Data source type names, sorted and without duplicates.
    pub data_sources: Vec<String>,
}

impl ProviderMetadata {
    /// Metadata listing the given data source type names.
    pub fn new<I, S>(data_sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut data_sources: Vec<String> = data_sources.into_iter().map(Into::into).collect();
        data_sources.sort();
        data_sources.dedup();
        Self { data_sources }
    }
}

impl From<ProviderMetadata> for crate::generated::GetMetadataResponse {
    fn from(metadata: ProviderMetadata) -> Self {
        Self {
            data_sources: metadata.data_sources,
            diagnostics: vec![],
        }
    }
}

/// The protocol version for the handshake.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix output by the provider.
pub const HANDSHAKE_PREFIX: &str = "LOGGING_MANIFESTS_PROVIDER";

/// Format the handshake line printed to stdout once the server is bound.
pub fn handshake_line(addr: std::net::SocketAddr) -> String {
    format!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_line() {
        let addr: std::net::SocketAddr = "127.0.0.1:50051".parse().unwrap();
        assert_eq!(handshake_line(addr), "LOGGING_MANIFESTS_PROVIDER|1|127.0.0.1:50051");
    }

    #[test]
    fn test_metadata_sorts_data_sources() {
        let metadata = ProviderMetadata::new([
            "k8s_logging_banzaicloud_io_output_v1beta1_manifest",
            "k8s_logging_banzaicloud_io_flow_v1beta1_manifest",
            "k8s_logging_banzaicloud_io_output_v1beta1_manifest",
        ]);
        assert_eq!(
            metadata.data_sources,
            vec![
                "k8s_logging_banzaicloud_io_flow_v1beta1_manifest",
                "k8s_logging_banzaicloud_io_output_v1beta1_manifest",
            ]
        );

        let response: crate::generated::GetMetadataResponse = metadata.into();
        assert_eq!(response.data_sources.len(), 2);
        assert!(response.diagnostics.is_empty());
    }
}
