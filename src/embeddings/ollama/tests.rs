use super::*;

#[test]
fn client_configuration() {
    let config = EmbeddingConfig {
        host: "test-host".to_string(),
        port: 1234,
        model: "test-model".to_string(),
        batch_size: 128,
    };
    let client = OllamaEmbedder::new(&config).expect("should create client successfully");

    assert_eq!(client.model, "test-model");
    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = EmbeddingConfig::default();
    let client = OllamaEmbedder::new(&config)
        .expect("should create client successfully")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    assert_eq!(client.retry_attempts, 5);
}

#[tokio::test]
async fn empty_batch_short_circuits() {
    let config = EmbeddingConfig::default();
    let client = OllamaEmbedder::new(&config).expect("should create client successfully");

    // No server is running; an empty batch must not touch the network.
    let embeddings = client
        .embed_batch(&[])
        .await
        .expect("should embed empty batch successfully");
    assert!(embeddings.is_empty());
}
